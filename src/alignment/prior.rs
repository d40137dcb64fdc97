//! Beta-Binomial attention prior.
//!
//! Row `i` (1-based frame index) of the prior is the Beta-Binomial pmf over
//! phoneme positions `0..N` with `n = N - 1`, `a = scale * i` and
//! `b = scale * (M - i + 1)`. The mode drifts from the first phoneme on the
//! first frame to the last phoneme on the last frame; a larger scale pulls
//! the mass closer to the diagonal. Only the two lengths matter.

use crate::error::AlignmentError;

/// Lanczos approximation, g = 7.
const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// `M x N` prior, one probability distribution over phoneme positions per frame.
pub fn beta_binomial_prior(
    phonemes: usize,
    frames: usize,
    scale_factor: f64,
) -> Result<Vec<Vec<f64>>, AlignmentError> {
    if phonemes == 0 || frames == 0 {
        return Err(AlignmentError::invalid_input(format!(
            "attention prior needs at least one phoneme and one frame, got {phonemes}x{frames}"
        )));
    }
    if !(scale_factor.is_finite() && scale_factor > 0.0) {
        return Err(AlignmentError::invalid_input(format!(
            "attention prior scale factor must be positive, got {scale_factor}"
        )));
    }

    let n = (phonemes - 1) as f64;
    let ln_choose: Vec<f64> = (0..phonemes)
        .map(|k| {
            let k = k as f64;
            ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
        })
        .collect();

    let prior = (1..=frames)
        .map(|i| {
            let a = scale_factor * i as f64;
            let b = scale_factor * (frames - i + 1) as f64;
            let ln_norm = ln_beta(a, b);
            ln_choose
                .iter()
                .enumerate()
                .map(|(k, &c)| {
                    let k = k as f64;
                    (c + ln_beta(k + a, n - k + b) - ln_norm).exp()
                })
                .collect()
        })
        .collect();
    Ok(prior)
}

/// Add `weight * ln(prior + floor)` to log emissions in place.
pub fn apply_log_prior(
    emissions: &mut [Vec<f64>],
    prior: &[Vec<f64>],
    weight: f64,
    floor: f64,
) -> Result<(), AlignmentError> {
    if emissions.len() != prior.len() {
        return Err(AlignmentError::shape_mismatch(format!(
            "prior has {} frames, emissions have {}",
            prior.len(),
            emissions.len()
        )));
    }
    for (t, (row, prior_row)) in emissions.iter_mut().zip(prior).enumerate() {
        if row.len() != prior_row.len() {
            return Err(AlignmentError::shape_mismatch(format!(
                "prior frame {t} has {} columns, emissions have {}",
                prior_row.len(),
                row.len()
            )));
        }
        for (v, p) in row.iter_mut().zip(prior_row) {
            *v += weight * (p + floor).ln();
        }
    }
    Ok(())
}

fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Natural log of the gamma function for `x > 0`.
pub(crate) fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Γ(x)Γ(1-x) = π / sin(πx)
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = LANCZOS_COEFFS[0];
    for (i, &c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}
