use std::fs;
use std::path::Path;

use phoneme_aligner_rs::{Alignment, WordAlignment};
use textgrid::{Interval, TextGrid, Tier, TierType};

pub fn write_textgrid(
    path: &Path,
    alignment: &Alignment,
    words: &[WordAlignment],
) -> Result<(), String> {
    let textgrid = build_textgrid(alignment, words)
        .map_err(|err| format!("Failed to build TextGrid '{}': {err}", path.display()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create TextGrid output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    textgrid
        .to_file(path, false)
        .map_err(|err| format!("Failed to write TextGrid '{}': {err}", path.display()))
}

/// A `phonemes` tier, plus a `words` tier when words were grouped.
fn build_textgrid(alignment: &Alignment, words: &[WordAlignment]) -> Result<TextGrid, String> {
    let xmax = alignment.end_s().max(0.0);
    let mut textgrid = TextGrid::new(0.0, xmax).map_err(|err| err.to_string())?;

    let phoneme_intervals = tile(
        alignment
            .phonemes
            .iter()
            .map(|p| (p.start_s, p.end_s, p.phoneme.as_str())),
        xmax,
    );
    textgrid
        .add_tier(interval_tier("phonemes", xmax, phoneme_intervals))
        .map_err(|err| format!("phonemes tier: {err}"))?;

    if !words.is_empty() {
        let word_intervals = tile(
            words.iter().map(|w| (w.start_s, w.end_s, w.word.as_str())),
            xmax,
        );
        textgrid
            .add_tier(interval_tier("words", xmax, word_intervals))
            .map_err(|err| format!("words tier: {err}"))?;
    }
    Ok(textgrid)
}

fn interval_tier(name: &str, xmax: f64, intervals: Vec<Interval>) -> Tier {
    Tier {
        name: name.to_string(),
        tier_type: TierType::IntervalTier,
        xmin: 0.0,
        xmax,
        intervals,
        points: Vec::new(),
    }
}

/// Clamp to `[last_end, xmax]` and drop zero-length entries.
fn tile<'a>(items: impl Iterator<Item = (f64, f64, &'a str)>, xmax: f64) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut last_end = 0.0f64;
    for (start, end, text) in items {
        let start = start.max(last_end);
        let end = end.min(xmax);
        if end <= start {
            continue;
        }
        intervals.push(Interval {
            xmin: start,
            xmax: end,
            text: text.to_string(),
        });
        last_end = end;
    }
    intervals
}
