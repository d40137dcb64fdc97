use crate::alignment::transition::TransitionMatrix;
use crate::alignment::viterbi::DecodedPath;
use crate::error::AlignmentError;
use crate::types::{Alignment, WordAlignment, WordSpan};

pub trait SequenceDecoder: Send + Sync {
    fn decode(
        &self,
        emissions: &[Vec<f64>],
        transitions: &TransitionMatrix,
    ) -> Result<DecodedPath, AlignmentError>;
}

pub trait WordGrouper: Send + Sync {
    fn group_words(
        &self,
        alignment: &Alignment,
        states: &[usize],
        spans: &[WordSpan],
    ) -> Vec<WordAlignment>;
}
