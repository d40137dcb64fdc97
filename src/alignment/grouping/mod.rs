use crate::alignment::vocabulary::PhonemeVocabulary;
use crate::error::AlignmentError;
use crate::types::{Alignment, PhonemeSegment};

mod interpolation;
mod words;

pub use words::group_into_words;

/// Consecutive frames assigned to the same sequence position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRun {
    pub position: usize,
    pub start_frame: usize,
    pub frames: usize,
}

/// How frame runs become timestamps.
#[derive(Clone, Copy, Debug)]
pub struct SegmentParams<'a> {
    pub hop_duration_s: f64,
    /// Frames trimmed from the first and last segment to undo symmetric padding.
    pub padding_frames: Option<f64>,
    /// Unmasked emission scores; enables sub-frame boundary interpolation.
    pub interpolate_with: Option<&'a [Vec<f64>]>,
}

impl SegmentParams<'_> {
    pub fn hard(hop_duration_s: f64) -> Self {
        Self {
            hop_duration_s,
            padding_frames: None,
            interpolate_with: None,
        }
    }
}

pub fn run_length_encode(states: &[usize]) -> Vec<FrameRun> {
    let mut runs: Vec<FrameRun> = Vec::new();
    for (frame, &position) in states.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.position == position => run.frames += 1,
            _ => runs.push(FrameRun {
                position,
                start_frame: frame,
                frames: 1,
            }),
        }
    }
    runs
}

/// Segment boundaries in (possibly fractional) frames, `runs.len() + 1` entries from 0.
pub fn frame_boundaries(
    runs: &[FrameRun],
    params: &SegmentParams<'_>,
) -> Result<Vec<f64>, AlignmentError> {
    let mut bounds = Vec::with_capacity(runs.len() + 1);
    bounds.push(0.0f64);
    let mut total = 0usize;
    for run in runs {
        total += run.frames;
        bounds.push(total as f64);
    }

    if let Some(distribution) = params.interpolate_with {
        interpolation::shift_boundaries(runs, distribution, &mut bounds)?;
    }
    if let Some(padding) = params.padding_frames {
        trim_padding(&mut bounds, padding);
    }
    Ok(bounds)
}

/// Remove `padding` frames from the first and last segment, never below zero length.
fn trim_padding(bounds: &mut Vec<f64>, padding: f64) {
    if bounds.len() < 2 || padding <= 0.0 {
        return;
    }
    let mut counts: Vec<f64> = bounds.windows(2).map(|w| w[1] - w[0]).collect();
    let last = counts.len() - 1;
    counts[0] = (counts[0] - padding).max(0.0);
    counts[last] = (counts[last] - padding).max(0.0);

    bounds.clear();
    bounds.push(0.0);
    let mut acc = 0.0;
    for count in counts {
        acc += count;
        bounds.push(acc);
    }
}

/// Turn a decoded frame assignment into time-stamped phoneme segments.
pub fn build_alignment(
    states: &[usize],
    sequence: &[usize],
    vocab: &PhonemeVocabulary,
    params: &SegmentParams<'_>,
) -> Result<Alignment, AlignmentError> {
    let runs = run_length_encode(states);
    let bounds = frame_boundaries(&runs, params)?;

    let mut phonemes = Vec::with_capacity(runs.len());
    for (k, run) in runs.iter().enumerate() {
        let id = *sequence.get(run.position).ok_or_else(|| {
            AlignmentError::invalid_input(format!(
                "frame assignment refers to position {} of a {}-phoneme sequence",
                run.position,
                sequence.len()
            ))
        })?;
        let symbol = vocab.index_to_phoneme(id).ok_or_else(|| {
            AlignmentError::invalid_input(format!("phoneme id {id} is outside the vocabulary"))
        })?;
        phonemes.push(PhonemeSegment {
            phoneme: symbol.to_string(),
            position: run.position,
            start_s: bounds[k] * params.hop_duration_s,
            end_s: bounds[k + 1] * params.hop_duration_s,
        });
    }

    tracing::debug!(
        segments = phonemes.len(),
        frames = states.len(),
        interpolated = params.interpolate_with.is_some(),
        padding_adjusted = params.padding_frames.is_some(),
        "grouping: built phoneme segments"
    );
    Ok(Alignment { phonemes })
}
