use crate::error::AlignmentError;

/// Check an `M x N` score matrix before decoding.
///
/// `-inf` is allowed (masked cells); NaN and `+inf` are not.
pub fn validate(emissions: &[Vec<f64>], phonemes: usize) -> Result<(), AlignmentError> {
    if emissions.is_empty() {
        return Err(AlignmentError::invalid_input("emission matrix has no frames"));
    }
    if phonemes == 0 {
        return Err(AlignmentError::invalid_input("phoneme sequence is empty"));
    }
    for (t, row) in emissions.iter().enumerate() {
        if row.len() != phonemes {
            return Err(AlignmentError::shape_mismatch(format!(
                "emission frame {t} has {} columns, phoneme sequence has {phonemes}",
                row.len()
            )));
        }
        if let Some(j) = row.iter().position(|v| v.is_nan() || *v == f64::INFINITY) {
            return Err(AlignmentError::invalid_input(format!(
                "emission score at frame {t}, phoneme {j} is not a finite log score"
            )));
        }
    }
    Ok(())
}

/// Row-wise log-softmax in place. Rows that are entirely `-inf` are left as is.
pub fn log_softmax_rows(emissions: &mut [Vec<f64>]) {
    for row in emissions.iter_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            continue;
        }
        let log_sum = row.iter().map(|v| (v - max).exp()).sum::<f64>().ln() + max;
        for v in row.iter_mut() {
            *v -= log_sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_softmax_rows_normalizes() {
        let mut e = vec![vec![1.0, 2.0, 3.0], vec![1000.0, 1000.0, f64::NEG_INFINITY]];
        log_softmax_rows(&mut e);
        for row in &e {
            let total: f64 = row.iter().map(|v| v.exp()).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert!((e[1][0] - 0.5f64.ln()).abs() < 1e-12);
        assert_eq!(e[1][2], f64::NEG_INFINITY);
    }

    #[test]
    fn log_softmax_keeps_dead_rows() {
        let mut e = vec![vec![f64::NEG_INFINITY; 2]];
        log_softmax_rows(&mut e);
        assert!(e[0].iter().all(|v| *v == f64::NEG_INFINITY));
    }

    #[test]
    fn validate_rejects_ragged_rows() {
        let e = vec![vec![0.0; 3], vec![0.0; 2]];
        assert!(matches!(
            validate(&e, 3),
            Err(AlignmentError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn validate_rejects_nan_and_degenerate_shapes() {
        assert!(validate(&[vec![0.0, f64::NAN]], 2).is_err());
        assert!(validate(&[vec![0.0, f64::INFINITY]], 2).is_err());
        assert!(validate(&[], 2).is_err());
        assert!(validate(&[vec![]], 0).is_err());
        assert!(validate(&[vec![0.0, f64::NEG_INFINITY]], 2).is_ok());
    }
}
