use crate::error::AlignmentError;

/// Forbid interior silences on loud frames.
///
/// For every silence position strictly inside the sequence (the opening and
/// closing silences are never masked) and every frame whose loudness exceeds
/// `threshold_db`, the emission score is set to `-inf`. Returns the number of
/// masked cells.
pub fn mask_loud_silence(
    emissions: &mut [Vec<f64>],
    sequence: &[usize],
    silence_id: usize,
    loudness_db: &[f64],
    threshold_db: f64,
) -> Result<usize, AlignmentError> {
    if loudness_db.len() != emissions.len() {
        return Err(AlignmentError::shape_mismatch(format!(
            "loudness has {} frames, emissions have {}",
            loudness_db.len(),
            emissions.len()
        )));
    }

    let interior = interior_silences(sequence, silence_id);
    if interior.is_empty() {
        return Ok(0);
    }

    let mut masked = 0usize;
    for (row, &db) in emissions.iter_mut().zip(loudness_db) {
        if db <= threshold_db {
            continue;
        }
        for &s in &interior {
            row[s] = f64::NEG_INFINITY;
            masked += 1;
        }
    }

    tracing::debug!(
        interior_silences = interior.len(),
        masked_cells = masked,
        threshold_db,
        "loudness gate: masked loud silence"
    );
    Ok(masked)
}

fn interior_silences(sequence: &[usize], silence_id: usize) -> Vec<usize> {
    if sequence.len() < 3 {
        return Vec::new();
    }
    (1..sequence.len() - 1)
        .filter(|&i| sequence[i] == silence_id)
        .collect()
}
