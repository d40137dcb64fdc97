use super::FrameRun;
use crate::error::AlignmentError;

/// Move every internal boundary later by the weight of the left phoneme.
///
/// At the first frame of run `k + 1` the two adjacent phonemes compete
/// through a two-way softmax; the left phoneme's share (in `[0, 1]`) is the
/// fraction of that frame credited to run `k`. Boundaries never cross
/// because every run covers at least one whole frame.
pub(super) fn shift_boundaries(
    runs: &[FrameRun],
    distribution: &[Vec<f64>],
    bounds: &mut [f64],
) -> Result<(), AlignmentError> {
    for (k, pair) in runs.windows(2).enumerate() {
        let (left, right) = (&pair[0], &pair[1]);
        let row = distribution.get(right.start_frame).ok_or_else(|| {
            AlignmentError::shape_mismatch(format!(
                "interpolation needs frame {}, distribution has {}",
                right.start_frame,
                distribution.len()
            ))
        })?;
        let (l, r) = match (row.get(left.position), row.get(right.position)) {
            (Some(&l), Some(&r)) => (l, r),
            _ => {
                return Err(AlignmentError::shape_mismatch(format!(
                    "interpolation needs position {}, distribution has {} columns",
                    right.position,
                    row.len()
                )))
            }
        };
        bounds[k + 1] += left_weight(l, r);
    }
    Ok(())
}

/// `softmax([l, r])[0]`, with two impossible scores splitting evenly.
pub(super) fn left_weight(l: f64, r: f64) -> f64 {
    if l == r {
        return 0.5;
    }
    let max = l.max(r);
    let el = (l - max).exp();
    let er = (r - max).exp();
    el / (el + er)
}
