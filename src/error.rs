use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("shape mismatch: {message}")]
    ShapeMismatch { message: String },
    /// The constrained transition graph cannot cover the utterance.
    ///
    /// Batch callers are expected to skip the utterance and keep going.
    #[error(
        "infeasible alignment: no monotonic path over {phonemes} phonemes in {frames} frames \
         (first dead frame: {frame})"
    )]
    Infeasible {
        frame: usize,
        frames: usize,
        phonemes: usize,
    },
    #[error("phoneme '{symbol}' is not in the vocabulary")]
    UnknownPhoneme { symbol: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("alignment backend '{backend}' is provided by an external tool and is not available")]
    UnsupportedBackend { backend: &'static str },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn infeasible(frame: usize, frames: usize, phonemes: usize) -> Self {
        Self::Infeasible {
            frame,
            frames,
            phonemes,
        }
    }

    /// True for failures a batch run should skip and warn about rather than abort on.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_is_classified_separately() {
        let err = AlignmentError::infeasible(0, 1, 3);
        assert!(err.is_infeasible());
        assert!(err.to_string().contains("3 phonemes in 1 frames"));

        let err = AlignmentError::shape_mismatch("emissions have 2 columns, sequence has 3");
        assert!(!err.is_infeasible());
    }
}
