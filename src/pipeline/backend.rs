use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::AlignmentError;

/// Alignment strategy. Only `Neural` runs in-process; the other two wrap
/// external forced-alignment tools and are rejected by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Montreal Forced Aligner.
    Mfa,
    /// Penn Phonetics Lab Forced Aligner.
    P2fa,
    /// Constrained Viterbi over scorer emissions.
    #[default]
    Neural,
}

impl BackendKind {
    pub const ALL: [Self; 3] = [Self::Mfa, Self::P2fa, Self::Neural];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mfa => "mfa",
            Self::P2fa => "p2fa",
            Self::Neural => "neural",
        }
    }

    pub fn is_external(self) -> bool {
        !matches!(self, Self::Neural)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AlignmentError::invalid_input(format!("unknown aligner backend '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("MFA".parse::<BackendKind>().unwrap(), BackendKind::Mfa);
        assert_eq!(" neural ".parse::<BackendKind>().unwrap(), BackendKind::Neural);
        assert!("radtts".parse::<BackendKind>().is_err());
    }

    #[test]
    fn only_neural_is_in_process() {
        assert!(BackendKind::Mfa.is_external());
        assert!(BackendKind::P2fa.is_external());
        assert!(!BackendKind::Neural.is_external());
        assert_eq!(BackendKind::default(), BackendKind::Neural);
    }

    #[test]
    fn display_round_trips() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}
