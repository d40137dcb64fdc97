pub mod emissions;
pub mod grouping;
pub mod loudness;
pub mod prior;
pub mod report;
pub mod stretch;
pub mod transition;
pub mod viterbi;
pub mod vocabulary;
