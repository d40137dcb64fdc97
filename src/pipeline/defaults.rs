use crate::alignment::grouping::group_into_words;
use crate::alignment::transition::TransitionMatrix;
use crate::alignment::viterbi::{forced_align_viterbi, DecodedPath};
use crate::error::AlignmentError;
use crate::pipeline::traits::{SequenceDecoder, WordGrouper};
use crate::types::{Alignment, WordAlignment, WordSpan};

pub struct ViterbiSequenceDecoder;

impl SequenceDecoder for ViterbiSequenceDecoder {
    fn decode(
        &self,
        emissions: &[Vec<f64>],
        transitions: &TransitionMatrix,
    ) -> Result<DecodedPath, AlignmentError> {
        forced_align_viterbi(emissions, transitions)
    }
}

pub struct SpanWordGrouper;

impl WordGrouper for SpanWordGrouper {
    fn group_words(
        &self,
        alignment: &Alignment,
        states: &[usize],
        spans: &[WordSpan],
    ) -> Vec<WordAlignment> {
        group_into_words(alignment, states, spans)
    }
}
