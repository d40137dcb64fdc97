pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::report::{DurationMetrics, DurationReport};
pub use alignment::stretch::{stretch, StretchMode};
pub use alignment::vocabulary::{is_voiced, is_vowel, PhonemeVocabulary};
pub use config::{AlignerConfig, DecoderConfig, PriorConfig};
pub use error::AlignmentError;
pub use pipeline::backend::BackendKind;
pub use pipeline::builder::ForcedAlignerBuilder;
pub use pipeline::runtime::{attention_priors, ForcedAligner};
pub use pipeline::traits::{SequenceDecoder, WordGrouper};
pub use types::{
    Alignment, AlignmentInput, AlignmentOutput, PhonemeSegment, WordAlignment, WordSpan,
};
