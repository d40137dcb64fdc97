use serde::{Deserialize, Serialize};

use crate::alignment::vocabulary::{is_voiced, is_vowel};
use crate::error::AlignmentError;
use crate::types::{Alignment, PhonemeSegment};

/// Which segments absorb a time stretch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StretchMode {
    /// Every segment, silence included.
    #[default]
    Uniform,
    Voiced,
    Vowels,
}

impl StretchMode {
    fn selects(self, phoneme: &str) -> bool {
        match self {
            Self::Uniform => true,
            Self::Voiced => is_voiced(phoneme),
            Self::Vowels => is_vowel(phoneme),
        }
    }
}

/// Rescale an alignment so its total duration becomes `ratio` times the original.
///
/// Only the segments picked by `mode` change length; the rest keep their
/// duration and the selected ones share the difference in proportion to
/// their own length. Segments stay contiguous from the original start time.
pub fn stretch(
    alignment: &Alignment,
    ratio: f64,
    mode: StretchMode,
) -> Result<Alignment, AlignmentError> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(AlignmentError::invalid_input(format!(
            "stretch ratio must be positive and finite, got {ratio}"
        )));
    }

    let selected: Vec<bool> = alignment
        .phonemes
        .iter()
        .map(|p| mode.selects(&p.phoneme))
        .collect();
    let total = alignment.duration_s();
    let factor = match mode {
        StretchMode::Uniform => ratio,
        StretchMode::Voiced | StretchMode::Vowels => {
            let stretchable: f64 = alignment
                .phonemes
                .iter()
                .zip(&selected)
                .filter(|&(_, &keep)| keep)
                .map(|(p, _)| p.duration_s())
                .sum();
            if stretchable <= 0.0 {
                return Err(AlignmentError::invalid_input(format!(
                    "no {mode:?} duration to stretch"
                )));
            }
            let fixed = total - stretchable;
            (ratio * total - fixed) / stretchable
        }
    };
    if factor < 0.0 {
        return Err(AlignmentError::invalid_input(format!(
            "ratio {ratio} would need negative {mode:?} durations"
        )));
    }

    let mut cursor = alignment.start_s();
    let phonemes = alignment
        .phonemes
        .iter()
        .zip(&selected)
        .map(|(segment, &keep)| {
            let duration = if keep {
                factor * segment.duration_s()
            } else {
                segment.duration_s()
            };
            let start_s = cursor;
            cursor += duration;
            PhonemeSegment {
                start_s,
                end_s: cursor,
                ..segment.clone()
            }
        })
        .collect();

    tracing::debug!(ratio, factor, ?mode, "stretch: rescaled alignment");
    Ok(Alignment { phonemes })
}
