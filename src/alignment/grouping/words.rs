use super::{run_length_encode, FrameRun};
use crate::alignment::vocabulary::SILENCE;
use crate::types::{Alignment, PhonemeSegment, WordAlignment, WordSpan};

/// Who a phoneme segment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Owner {
    Word(usize),
    Silence,
}

/// Partition phoneme segments into words using collaborator-supplied spans.
///
/// `states` is the decoded frame assignment the alignment was built from.
/// Ownership is decided on its runs, so padding correction and interpolation
/// never move a segment into another word's span.
///
/// Silence segments form their own `<silent>` words. Every other segment is
/// looked up by the midpoint of its frame run: the span containing it wins,
/// otherwise the span with the nearest boundary. Consecutive segments with
/// the same owner are merged, so concatenating the words' phonemes gives
/// back the alignment unchanged.
pub fn group_into_words(
    alignment: &Alignment,
    states: &[usize],
    spans: &[WordSpan],
) -> Vec<WordAlignment> {
    if spans.is_empty() || alignment.is_empty() {
        return Vec::new();
    }
    let runs = run_length_encode(states);
    if runs.len() != alignment.phonemes.len() {
        tracing::warn!(
            runs = runs.len(),
            segments = alignment.phonemes.len(),
            "grouping: frame assignment does not match the alignment; no words built"
        );
        return Vec::new();
    }

    let mut words: Vec<WordAlignment> = Vec::new();
    let mut prev_owner: Option<Owner> = None;
    for (segment, run) in alignment.phonemes.iter().zip(&runs) {
        let owner = owner_of(segment, run, spans);
        if prev_owner == Some(owner) {
            if let Some(word) = words.last_mut() {
                word.end_s = segment.end_s;
                word.phonemes.push(segment.clone());
                continue;
            }
        }
        let word = match owner {
            Owner::Word(i) => spans[i].word.clone(),
            Owner::Silence => SILENCE.to_string(),
        };
        words.push(WordAlignment {
            word,
            start_s: segment.start_s,
            end_s: segment.end_s,
            phonemes: vec![segment.clone()],
        });
        prev_owner = Some(owner);
    }

    tracing::debug!(
        words = words.len(),
        spans = spans.len(),
        "grouping: partitioned phonemes into words"
    );
    words
}

fn owner_of(segment: &PhonemeSegment, run: &FrameRun, spans: &[WordSpan]) -> Owner {
    if segment.phoneme == SILENCE {
        return Owner::Silence;
    }
    let mid_frame = run.start_frame as f64 + 0.5 * run.frames as f64;
    if let Some(i) = spans
        .iter()
        .position(|s| s.start_frame as f64 <= mid_frame && mid_frame < s.end_frame as f64)
    {
        return Owner::Word(i);
    }

    let distance = |s: &WordSpan| {
        let start = s.start_frame as f64;
        let end = s.end_frame as f64;
        if mid_frame < start {
            start - mid_frame
        } else {
            mid_frame - end
        }
    };
    let mut best = 0usize;
    for (i, span) in spans.iter().enumerate().skip(1) {
        if distance(span) < distance(&spans[best]) {
            best = i;
        }
    }
    Owner::Word(best)
}
