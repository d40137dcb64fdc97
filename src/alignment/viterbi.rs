use super::emissions;
use super::transition::{Step, TransitionMatrix};
use crate::error::AlignmentError;

const STEP_STAY: u8 = 0;
const STEP_ADVANCE: u8 = 1;
const STEP_SKIP: u8 = 2;

/// Frame assignment produced by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPath {
    /// One sequence position per frame; non-decreasing, starts at 0, ends at `N - 1`.
    pub states: Vec<usize>,
    /// Score of the best complete path before the final-frame override.
    pub log_score: f64,
}

/// Monotonic max-sum Viterbi over sequence positions.
///
/// The path is pinned to position 0 at the first frame and to the closing
/// position at the last frame. Each cell only looks at its (at most three)
/// allowed predecessors, so the forward pass is O(M·N). Ties go to the lowest
/// predecessor index.
pub fn forced_align_viterbi(
    emissions: &[Vec<f64>],
    transitions: &TransitionMatrix,
) -> Result<DecodedPath, AlignmentError> {
    let n = transitions.size();
    emissions::validate(emissions, n)?;
    let m = emissions.len();

    let mut prev = vec![f64::NEG_INFINITY; n];
    let mut curr = vec![f64::NEG_INFINITY; n];
    let mut bp = vec![STEP_STAY; m * n];

    // Initial distribution: log 1 at position 0, log 0 elsewhere.
    prev[0] = emissions[0][0];
    if prev[0] == f64::NEG_INFINITY {
        return Err(AlignmentError::infeasible(0, m, n));
    }

    for t in 1..m {
        let row = &emissions[t];
        let bp_offset = t * n;
        for j in 0..n {
            let (best, step) = best_transition(&prev, transitions, j);
            curr[j] = best + row[j];
            bp[bp_offset + j] = step;
        }
        if curr.iter().all(|&v| v == f64::NEG_INFINITY) {
            tracing::debug!(frame = t, frames = m, phonemes = n, "viterbi: every state dead");
            return Err(AlignmentError::infeasible(t, m, n));
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let log_score = prev[n - 1];
    if log_score == f64::NEG_INFINITY {
        tracing::debug!(frames = m, phonemes = n, "viterbi: final phoneme unreachable");
        return Err(AlignmentError::infeasible(m - 1, m, n));
    }

    // Pin the last frame to the closing phoneme. This overrides the raw scores.
    prev.fill(f64::NEG_INFINITY);
    prev[n - 1] = 0.0;

    let mut s = argmax(&prev);
    let mut states = vec![0usize; m];
    states[m - 1] = s;
    for t in (1..m).rev() {
        s -= match bp[t * n + s] {
            STEP_ADVANCE => 1,
            STEP_SKIP => 2,
            _ => 0,
        };
        states[t - 1] = s;
    }
    debug_assert_eq!(states[0], 0, "viterbi path must start at the first phoneme");

    Ok(DecodedPath { states, log_score })
}

#[inline(always)]
fn best_transition(prev: &[f64], transitions: &TransitionMatrix, to: usize) -> (f64, u8) {
    let mut best = f64::NEG_INFINITY;
    let mut step = STEP_STAY;

    for (from, kind) in transitions.predecessors(to) {
        let cand = prev[from] + transitions.log_prob(from, to);
        if cand > best {
            best = cand;
            step = match kind {
                Step::Stay => STEP_STAY,
                Step::Advance => STEP_ADVANCE,
                Step::SkipSilence => STEP_SKIP,
            };
        }
    }

    (best, step)
}

/// Index of the largest value, lowest index on ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIL: usize = 0;

    fn transitions(sequence: &[usize], skip: bool) -> TransitionMatrix {
        TransitionMatrix::build(sequence, SIL, skip).unwrap()
    }

    /// One-hot-ish log emissions following `targets`.
    fn peaked(targets: &[usize], n: usize) -> Vec<Vec<f64>> {
        targets
            .iter()
            .map(|&k| (0..n).map(|j| if j == k { -0.01 } else { -8.0 }).collect())
            .collect()
    }

    #[test]
    fn follows_clear_emissions() {
        let seq = [SIL, 3, SIL];
        let e = peaked(&[0, 0, 1, 1, 1, 2, 2], 3);
        let path = forced_align_viterbi(&e, &transitions(&seq, true)).unwrap();
        assert_eq!(path.states, vec![0, 0, 1, 1, 1, 2, 2]);
        assert!(path.log_score.is_finite());
    }

    #[test]
    fn single_frame_single_phoneme() {
        let path = forced_align_viterbi(&[vec![-0.3]], &transitions(&[SIL], true)).unwrap();
        assert_eq!(path.states, vec![0]);
        assert!((path.log_score + 0.3).abs() < 1e-12);
    }

    #[test]
    fn last_frame_is_forced_to_closing_phoneme() {
        let seq = [SIL, 3, SIL];
        // Emissions prefer the middle phoneme to the very end.
        let e = peaked(&[0, 1, 1, 1], 3);
        let path = forced_align_viterbi(&e, &transitions(&seq, true)).unwrap();
        assert_eq!(*path.states.last().unwrap(), 2);
        assert_eq!(path.states[0], 0);
    }

    #[test]
    fn first_frame_is_forced_to_opening_phoneme() {
        let seq = [SIL, 3, SIL];
        let e = peaked(&[2, 2, 2, 2], 3);
        let path = forced_align_viterbi(&e, &transitions(&seq, true)).unwrap();
        assert_eq!(path.states[0], 0);
        assert_eq!(path.states[3], 2);
        assert!(path.states.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn ties_prefer_lowest_predecessor() {
        // Staying on the opening silence or entering A early score the same
        // at frame 1; the decoder must keep the lower predecessor.
        let seq = [SIL, 3, SIL];
        let e = vec![
            vec![0.0, -5.0, -5.0],
            vec![0.0, 0.0, -5.0],
            vec![-5.0, 0.0, -100.0],
            vec![-5.0, -5.0, 0.0],
        ];
        let t = transitions(&seq, false);
        let first = forced_align_viterbi(&e, &t).unwrap();
        assert_eq!(first.states, vec![0, 0, 1, 2]);
        let second = forced_align_viterbi(&e, &t).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn skip_over_silence_is_used_when_allowed() {
        let seq = [SIL, 3, SIL, 4, SIL];
        let e = peaked(&[0, 1, 1, 3, 3, 4], 5);
        let path = forced_align_viterbi(&e, &transitions(&seq, true)).unwrap();
        assert_eq!(path.states, vec![0, 1, 1, 3, 3, 4]);
    }

    #[test]
    fn too_few_frames_is_infeasible() {
        let seq = [SIL, 3, SIL];
        let e = vec![vec![0.0; 3]];
        let err = forced_align_viterbi(&e, &transitions(&seq, false)).unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn dead_row_is_infeasible() {
        let seq = [SIL, 3, SIL];
        let mut e = vec![vec![0.0; 3]; 4];
        e[2] = vec![f64::NEG_INFINITY; 3];
        let err = forced_align_viterbi(&e, &transitions(&seq, true)).unwrap_err();
        match err {
            AlignmentError::Infeasible { frame, .. } => assert_eq!(frame, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let seq = [SIL, 3, SIL];
        let e = vec![vec![0.0; 2]; 4];
        let err = forced_align_viterbi(&e, &transitions(&seq, true)).unwrap_err();
        assert!(matches!(err, AlignmentError::ShapeMismatch { .. }));
    }

    #[test]
    fn argmax_prefers_lowest_index() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), 0);
    }
}
