use std::collections::BTreeMap;

use serde::Serialize;

use crate::alignment::vocabulary::SILENCE;
use crate::error::AlignmentError;
use crate::types::Alignment;

/// Duration error thresholds in seconds.
pub const ACCURACY_LEVELS_S: [f64; 4] = [0.01, 0.005, 0.0025, 0.00125];

/// Running phoneme-duration accuracy and L1 error against reference alignments.
///
/// Silence phonemes are left out on both sides, so predicted and reference
/// alignments must agree on their non-silence phoneme count.
#[derive(Debug, Clone, Default)]
pub struct DurationMetrics {
    count: u64,
    abs_err_total: f64,
    within: [u64; ACCURACY_LEVELS_S.len()],
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DurationReport {
    pub phoneme_count: u64,
    /// Keyed `accuracy-<level>`.
    pub accuracy: BTreeMap<String, f64>,
    pub l1: f64,
}

impl DurationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        predicted: &Alignment,
        reference: &Alignment,
    ) -> Result<(), AlignmentError> {
        let pred = voiced_durations(predicted);
        let refr = voiced_durations(reference);
        if pred.len() != refr.len() {
            return Err(AlignmentError::shape_mismatch(format!(
                "predicted alignment has {} phonemes, reference has {}",
                pred.len(),
                refr.len()
            )));
        }

        for (p, r) in pred.iter().zip(&refr) {
            let err = (p - r).abs();
            self.abs_err_total += err;
            for (slot, level) in self.within.iter_mut().zip(ACCURACY_LEVELS_S) {
                if err < level {
                    *slot += 1;
                }
            }
        }
        self.count += pred.len() as u64;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` until at least one phoneme was compared.
    pub fn report(&self) -> Option<DurationReport> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let accuracy = ACCURACY_LEVELS_S
            .iter()
            .zip(self.within)
            .map(|(level, hits)| (format!("accuracy-{level}"), hits as f64 / n))
            .collect();
        Some(DurationReport {
            phoneme_count: self.count,
            accuracy,
            l1: self.abs_err_total / n,
        })
    }
}

fn voiced_durations(alignment: &Alignment) -> Vec<f64> {
    alignment
        .phonemes
        .iter()
        .filter(|p| p.phoneme != SILENCE)
        .map(|p| p.duration_s())
        .collect()
}
