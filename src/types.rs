use serde::{Deserialize, Serialize};

/// One utterance ready for decoding.
#[derive(Debug, Clone)]
pub struct AlignmentInput {
    /// Vocabulary indices; must start and end with the silence symbol.
    pub phonemes: Vec<usize>,
    /// `emissions[frame][position]`, one column per entry of `phonemes`.
    pub emissions: Vec<Vec<f64>>,
    /// Per-frame loudness in dB, same frame count as `emissions`.
    pub loudness_db: Option<Vec<f64>>,
    /// Word boundaries in frames, used to group phonemes into words.
    pub word_spans: Option<Vec<WordSpan>>,
}

/// Word boundary supplied by a collaborator. Frame interval is [start_frame, end_frame).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub word: String,
    pub start_frame: usize,
    pub end_frame: usize,
}

/// Second interval is [start_s, end_s), i.e. start inclusive/end exclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhonemeSegment {
    pub phoneme: String,
    /// Position in the utterance's phoneme sequence.
    pub position: usize,
    pub start_s: f64,
    pub end_s: f64,
}

impl PhonemeSegment {
    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub phonemes: Vec<PhonemeSegment>,
}

impl Alignment {
    pub fn start_s(&self) -> f64 {
        self.phonemes.first().map(|p| p.start_s).unwrap_or(0.0)
    }

    pub fn end_s(&self) -> f64 {
        self.phonemes.last().map(|p| p.end_s).unwrap_or(0.0)
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s() - self.start_s()
    }

    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordAlignment {
    pub word: String,
    pub start_s: f64,
    pub end_s: f64,
    pub phonemes: Vec<PhonemeSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentOutput {
    pub alignment: Alignment,
    /// Empty unless word spans were supplied.
    pub words: Vec<WordAlignment>,
    /// Frame assignment: one sequence position per frame.
    pub path: Vec<usize>,
    /// Best path log score before the final-frame override.
    pub log_score: f64,
}
