use std::path::Path;

use serde::Deserialize;

use crate::error::AlignmentError;
use crate::pipeline::backend::BackendKind;

/// Audio sampling rate the upstream scorer frames at.
pub const SAMPLE_RATE_HZ: u32 = 16_000;
/// Samples between consecutive analysis frames.
pub const HOPSIZE_SAMPLES: usize = 160;
/// Analysis window length in samples.
pub const WINDOW_SIZE_SAMPLES: usize = 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub backend: BackendKind,
    /// One phoneme symbol per line. The built-in ARPAbet set is used when absent.
    pub vocab_path: Option<String>,
    pub decoder: DecoderConfig,
    pub prior: PriorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Allow the path to jump over an interior silence.
    pub allow_skip_silence: bool,
    /// When false, interior silences are masked on frames louder than the threshold.
    pub allow_loud_silence: bool,
    pub silence_threshold_db: f64,
    /// Compensate for the symmetric padding applied before framing.
    pub adjust_padding: bool,
    /// Frames removed from the first and last segment when `adjust_padding` is set.
    pub padding_frames: f64,
    /// Sub-frame boundary interpolation.
    pub interpolate: bool,
    /// Row-wise log-softmax of the scores before decoding.
    pub normalize_emissions: bool,
    pub hop_duration_s: f64,
}

impl DecoderConfig {
    pub const DEFAULT_SILENCE_THRESHOLD_DB: f64 = -60.0;

    pub fn default_hop_duration_s() -> f64 {
        HOPSIZE_SAMPLES as f64 / SAMPLE_RATE_HZ as f64
    }

    pub fn default_padding_frames() -> f64 {
        ((WINDOW_SIZE_SAMPLES - HOPSIZE_SAMPLES) / 2) as f64 / HOPSIZE_SAMPLES as f64
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            allow_skip_silence: true,
            allow_loud_silence: true,
            silence_threshold_db: Self::DEFAULT_SILENCE_THRESHOLD_DB,
            adjust_padding: false,
            padding_frames: Self::default_padding_frames(),
            interpolate: false,
            normalize_emissions: true,
            hop_duration_s: Self::default_hop_duration_s(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PriorConfig {
    /// Add the attention prior to the emissions before decoding.
    pub apply: bool,
    pub scale_factor: f64,
    pub weight: f64,
    /// Added to prior probabilities before the log so zero mass stays finite.
    pub floor: f64,
}

impl PriorConfig {
    pub const DEFAULT_SCALE_FACTOR: f64 = 0.05;
    pub const DEFAULT_FLOOR: f64 = 1e-8;
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            apply: false,
            scale_factor: Self::DEFAULT_SCALE_FACTOR,
            weight: 1.0,
            floor: Self::DEFAULT_FLOOR,
        }
    }
}

impl AlignerConfig {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AlignmentError::json("parse aligner config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        let decoder = &self.decoder;
        if !(decoder.hop_duration_s.is_finite() && decoder.hop_duration_s > 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "hop_duration_s must be positive, got {}",
                decoder.hop_duration_s
            )));
        }
        if !decoder.silence_threshold_db.is_finite() {
            return Err(AlignmentError::invalid_input(
                "silence_threshold_db must be finite",
            ));
        }
        if !(decoder.padding_frames.is_finite() && decoder.padding_frames >= 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "padding_frames must be non-negative, got {}",
                decoder.padding_frames
            )));
        }
        let prior = &self.prior;
        if !(prior.scale_factor.is_finite() && prior.scale_factor > 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "prior scale_factor must be positive, got {}",
                prior.scale_factor
            )));
        }
        if !(prior.floor.is_finite() && prior.floor > 0.0) || !prior.weight.is_finite() {
            return Err(AlignmentError::invalid_input(
                "prior floor must be positive and weight finite",
            ));
        }
        Ok(())
    }
}
