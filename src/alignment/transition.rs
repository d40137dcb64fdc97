use crate::error::AlignmentError;

/// Kind of move between consecutive frames, from the source position's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Advance,
    /// Jump over an optional silence at `source + 1`.
    SkipSilence,
}

impl Step {
    pub fn offset(self) -> usize {
        match self {
            Self::Stay => 0,
            Self::Advance => 1,
            Self::SkipSilence => 2,
        }
    }
}

/// Per-utterance log transition matrix over sequence positions.
///
/// Row `i` holds the log-probabilities of moving from position `i` to each
/// position `j`. At most three entries per row are finite (stay, advance,
/// skip over a silence), so the matrix is stored densely for inspection but
/// the decoder walks [`predecessors`](Self::predecessors) instead.
#[derive(Debug, Clone)]
pub struct TransitionMatrix {
    size: usize,
    log_probs: Vec<f64>,
    /// `skip_into[j]` is true when `j - 2 -> j` is allowed.
    skip_into: Vec<bool>,
}

impl TransitionMatrix {
    pub fn build(
        sequence: &[usize],
        silence_id: usize,
        allow_skip_silence: bool,
    ) -> Result<Self, AlignmentError> {
        let n = sequence.len();
        if n == 0 {
            return Err(AlignmentError::invalid_input(
                "cannot build transitions for an empty phoneme sequence",
            ));
        }

        let mut mass = vec![0.0f64; n * n];
        let mut skip_into = vec![false; n];
        for i in 0..n {
            mass[i * n + i] = 1.0;
            if i + 1 < n {
                mass[i * n + i + 1] = 1.0;
            }
            if allow_skip_silence && i + 2 < n && sequence[i + 1] == silence_id {
                mass[i * n + i + 2] = 1.0;
                skip_into[i + 2] = true;
            }
        }

        for (i, row) in mass.chunks_mut(n).enumerate() {
            let total: f64 = row.iter().sum();
            if total <= 0.0 {
                return Err(AlignmentError::invalid_input(format!(
                    "transition row {i} has no outgoing mass"
                )));
            }
            for value in row.iter_mut() {
                *value = (*value / total).ln();
            }
        }

        Ok(Self {
            size: n,
            log_probs: mass,
            skip_into,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Log-probability of moving from position `from` to position `to`.
    pub fn log_prob(&self, from: usize, to: usize) -> f64 {
        self.log_probs[from * self.size + to]
    }

    pub fn row(&self, from: usize) -> &[f64] {
        &self.log_probs[from * self.size..(from + 1) * self.size]
    }

    pub fn allows_skip_into(&self, to: usize) -> bool {
        self.skip_into.get(to).copied().unwrap_or(false)
    }

    /// Allowed `(source, step)` pairs into `to`, lowest source first.
    pub fn predecessors(&self, to: usize) -> impl Iterator<Item = (usize, Step)> + '_ {
        let skip = self.allows_skip_into(to).then(|| (to - 2, Step::SkipSilence));
        let advance = (to >= 1).then(|| (to - 1, Step::Advance));
        skip.into_iter()
            .chain(advance)
            .chain(std::iter::once((to, Step::Stay)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIL: usize = 0;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn single_phoneme_is_self_loop() {
        let t = TransitionMatrix::build(&[SIL], SIL, true).unwrap();
        assert_eq!(t.size(), 1);
        assert_eq!(t.log_prob(0, 0), 0.0);
        assert_eq!(t.predecessors(0).collect::<Vec<_>>(), vec![(0, Step::Stay)]);
    }

    #[test]
    fn rows_split_mass_uniformly() {
        // [sil, A, sil, B, sil]
        let t = TransitionMatrix::build(&[SIL, 5, SIL, 7, SIL], SIL, true).unwrap();
        // Row 1 may stay, advance, or skip the silence at 2.
        assert!(close(t.log_prob(1, 1), (1.0f64 / 3.0).ln()));
        assert!(close(t.log_prob(1, 2), (1.0f64 / 3.0).ln()));
        assert!(close(t.log_prob(1, 3), (1.0f64 / 3.0).ln()));
        assert_eq!(t.log_prob(1, 4), f64::NEG_INFINITY);
        assert_eq!(t.log_prob(1, 0), f64::NEG_INFINITY);
        // Row 0: the next position is A, not a silence.
        assert!(close(t.log_prob(0, 0), 0.5f64.ln()));
        assert!(close(t.log_prob(0, 1), 0.5f64.ln()));
        assert_eq!(t.log_prob(0, 2), f64::NEG_INFINITY);
        // Row 3 may not skip the closing silence: there is nothing after it.
        assert!(close(t.log_prob(3, 4), 0.5f64.ln()));
        // Last row only stays.
        assert_eq!(t.log_prob(4, 4), 0.0);
    }

    #[test]
    fn every_row_sums_to_one() {
        let t = TransitionMatrix::build(&[SIL, 3, SIL, 4, 9, SIL, 2, SIL], SIL, true).unwrap();
        for i in 0..t.size() {
            let total: f64 = t.row(i).iter().map(|lp| lp.exp()).sum();
            assert!(close(total, 1.0), "row {i} sums to {total}");
        }
    }

    #[test]
    fn skip_disabled_leaves_two_moves() {
        let t = TransitionMatrix::build(&[SIL, 5, SIL, 7, SIL], SIL, false).unwrap();
        assert_eq!(t.log_prob(1, 3), f64::NEG_INFINITY);
        assert!(!t.allows_skip_into(3));
        let preds: Vec<_> = t.predecessors(3).collect();
        assert_eq!(preds, vec![(2, Step::Advance), (3, Step::Stay)]);
    }

    #[test]
    fn predecessors_are_ordered_lowest_first() {
        let t = TransitionMatrix::build(&[SIL, 5, SIL, 7, SIL], SIL, true).unwrap();
        let preds: Vec<_> = t.predecessors(3).collect();
        assert_eq!(
            preds,
            vec![(1, Step::SkipSilence), (2, Step::Advance), (3, Step::Stay)]
        );
        for (from, step) in preds {
            assert_eq!(from + step.offset(), 3);
            assert!(t.log_prob(from, 3).is_finite());
        }
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert!(TransitionMatrix::build(&[], SIL, true).is_err());
    }
}
