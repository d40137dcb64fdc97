use std::sync::Arc;

use crate::alignment::emissions;
use crate::alignment::grouping::{build_alignment, SegmentParams};
use crate::alignment::loudness::mask_loud_silence;
use crate::alignment::prior::{apply_log_prior, beta_binomial_prior};
use crate::alignment::transition::TransitionMatrix;
use crate::alignment::vocabulary::PhonemeVocabulary;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::parallel::parallel_map;
use crate::pipeline::traits::{SequenceDecoder, WordGrouper};
use crate::types::{AlignmentInput, AlignmentOutput};

pub struct ForcedAligner {
    config: AlignerConfig,
    vocabulary: Arc<PhonemeVocabulary>,
    sequence_decoder: Box<dyn SequenceDecoder>,
    word_grouper: Box<dyn WordGrouper>,
}

pub(crate) struct ForcedAlignerParts {
    pub config: AlignerConfig,
    pub vocabulary: Arc<PhonemeVocabulary>,
    pub sequence_decoder: Box<dyn SequenceDecoder>,
    pub word_grouper: Box<dyn WordGrouper>,
}

impl ForcedAligner {
    pub(crate) fn from_parts(parts: ForcedAlignerParts) -> Self {
        Self {
            config: parts.config,
            vocabulary: parts.vocabulary,
            sequence_decoder: parts.sequence_decoder,
            word_grouper: parts.word_grouper,
        }
    }

    pub fn vocabulary(&self) -> &Arc<PhonemeVocabulary> {
        &self.vocabulary
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Align one utterance. The input is left untouched; normalization,
    /// prior and loudness masking work on a copy of the emissions.
    pub fn align(&self, input: &AlignmentInput) -> Result<AlignmentOutput, AlignmentError> {
        self.validate_input(input)?;
        let decoder = &self.config.decoder;
        let phonemes = input.phonemes.len();
        let frames = input.emissions.len();

        let mut scores = input.emissions.clone();
        if decoder.normalize_emissions {
            emissions::log_softmax_rows(&mut scores);
        }
        if self.config.prior.apply {
            let prior = &self.config.prior;
            let table = beta_binomial_prior(phonemes, frames, prior.scale_factor)?;
            apply_log_prior(&mut scores, &table, prior.weight, prior.floor)?;
        }

        // Interpolation reads the scores as they were before loudness masking.
        let distribution = decoder.interpolate.then(|| scores.clone());

        if !decoder.allow_loud_silence {
            match input.loudness_db.as_deref() {
                Some(loudness) => {
                    mask_loud_silence(
                        &mut scores,
                        &input.phonemes,
                        self.vocabulary.silence_id(),
                        loudness,
                        decoder.silence_threshold_db,
                    )?;
                }
                None => tracing::debug!("loud-silence gate enabled without loudness; skipping"),
            }
        }

        let transitions = TransitionMatrix::build(
            &input.phonemes,
            self.vocabulary.silence_id(),
            decoder.allow_skip_silence,
        )?;
        let path = self.sequence_decoder.decode(&scores, &transitions)?;

        let params = SegmentParams {
            hop_duration_s: decoder.hop_duration_s,
            padding_frames: decoder.adjust_padding.then_some(decoder.padding_frames),
            interpolate_with: distribution.as_deref(),
        };
        let alignment = build_alignment(&path.states, &input.phonemes, &self.vocabulary, &params)?;

        let words = match input.word_spans.as_deref() {
            Some(spans) => self
                .word_grouper
                .group_words(&alignment, &path.states, spans),
            None => Vec::new(),
        };

        tracing::debug!(
            frames,
            phonemes,
            segments = alignment.phonemes.len(),
            words = words.len(),
            log_score = path.log_score,
            "aligned utterance"
        );
        Ok(AlignmentOutput {
            alignment,
            words,
            path: path.states,
            log_score: path.log_score,
        })
    }

    /// Align independent utterances, in parallel when the `parallel` feature
    /// is on. Failures stay in their slot so one bad utterance never sinks
    /// the batch.
    pub fn align_batch(
        &self,
        inputs: &[AlignmentInput],
    ) -> Vec<Result<AlignmentOutput, AlignmentError>> {
        self.align_batch_with(inputs, |_| {})
    }

    /// Like [`align_batch`](Self::align_batch), calling `on_aligned` with the
    /// utterance index as each one finishes (in completion order).
    pub fn align_batch_with<F>(
        &self,
        inputs: &[AlignmentInput],
        on_aligned: F,
    ) -> Vec<Result<AlignmentOutput, AlignmentError>>
    where
        F: Fn(usize) + Send + Sync,
    {
        let results = parallel_map(inputs, |index, input| {
            let result = self.align(input);
            on_aligned(index);
            match &result {
                Err(err) if err.is_infeasible() => {
                    tracing::warn!(utterance = index, error = %err, "skipping infeasible utterance");
                }
                Err(err) => {
                    tracing::warn!(utterance = index, error = %err, "utterance failed to align");
                }
                Ok(_) => {}
            }
            result
        });
        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(utterances = inputs.len(), failed, "batch alignment finished");
        results
    }

    fn validate_input(&self, input: &AlignmentInput) -> Result<(), AlignmentError> {
        let sequence = &input.phonemes;
        if sequence.len() < 2 {
            return Err(AlignmentError::invalid_input(format!(
                "phoneme sequence needs an opening and a closing silence, got {} entries",
                sequence.len()
            )));
        }
        if let Some((i, id)) = sequence
            .iter()
            .enumerate()
            .find(|&(_, &id)| id >= self.vocabulary.len())
        {
            return Err(AlignmentError::invalid_input(format!(
                "phoneme id {id} at position {i} is outside the {}-entry vocabulary",
                self.vocabulary.len()
            )));
        }
        let silence = self.vocabulary.silence_id();
        if sequence[0] != silence || sequence[sequence.len() - 1] != silence {
            return Err(AlignmentError::invalid_input(
                "phoneme sequence must begin and end with silence",
            ));
        }

        emissions::validate(&input.emissions, sequence.len())?;

        if let Some(loudness) = &input.loudness_db {
            if loudness.len() != input.emissions.len() {
                return Err(AlignmentError::shape_mismatch(format!(
                    "loudness has {} frames, emissions have {}",
                    loudness.len(),
                    input.emissions.len()
                )));
            }
            if let Some((frame, db)) = loudness
                .iter()
                .enumerate()
                .find(|(_, db)| !db.is_finite())
            {
                return Err(AlignmentError::invalid_input(format!(
                    "loudness at frame {frame} is not finite ({db})"
                )));
            }
        }
        if let Some(span) = input
            .word_spans
            .iter()
            .flatten()
            .find(|s| s.start_frame > s.end_frame)
        {
            return Err(AlignmentError::invalid_input(format!(
                "word span '{}' ends before it starts ({} > {})",
                span.word, span.start_frame, span.end_frame
            )));
        }
        Ok(())
    }
}

/// Beta-Binomial priors for a batch of `(phonemes, frames)` shapes.
pub fn attention_priors(
    shapes: &[(usize, usize)],
    scale_factor: f64,
) -> Vec<Result<Vec<Vec<f64>>, AlignmentError>> {
    parallel_map(shapes, |_, &(phonemes, frames)| {
        beta_binomial_prior(phonemes, frames, scale_factor)
    })
}
