use std::path::Path;
use std::sync::Arc;

use crate::alignment::vocabulary::PhonemeVocabulary;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{SpanWordGrouper, ViterbiSequenceDecoder};
use crate::pipeline::runtime::{ForcedAligner, ForcedAlignerParts};
use crate::pipeline::traits::{SequenceDecoder, WordGrouper};

pub struct ForcedAlignerBuilder {
    config: AlignerConfig,
    vocabulary: Option<Arc<PhonemeVocabulary>>,
    sequence_decoder: Option<Box<dyn SequenceDecoder>>,
    word_grouper: Option<Box<dyn WordGrouper>>,
}

impl ForcedAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            vocabulary: None,
            sequence_decoder: None,
            word_grouper: None,
        }
    }

    /// Takes precedence over `vocab_path`.
    pub fn with_vocabulary(mut self, vocabulary: Arc<PhonemeVocabulary>) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn with_sequence_decoder(mut self, sequence_decoder: Box<dyn SequenceDecoder>) -> Self {
        self.sequence_decoder = Some(sequence_decoder);
        self
    }

    pub fn with_word_grouper(mut self, word_grouper: Box<dyn WordGrouper>) -> Self {
        self.word_grouper = Some(word_grouper);
        self
    }

    pub fn build(self) -> Result<ForcedAligner, AlignmentError> {
        self.config.validate()?;
        if self.config.backend.is_external() {
            return Err(AlignmentError::UnsupportedBackend {
                backend: self.config.backend.as_str(),
            });
        }

        let vocabulary = match (self.vocabulary, self.config.vocab_path.as_deref()) {
            (Some(vocabulary), _) => vocabulary,
            (None, Some(path)) => Arc::new(PhonemeVocabulary::load(Path::new(path))?),
            (None, None) => Arc::new(PhonemeVocabulary::arpabet()),
        };

        tracing::info!(
            backend = %self.config.backend,
            phonemes = vocabulary.len(),
            allow_skip_silence = self.config.decoder.allow_skip_silence,
            allow_loud_silence = self.config.decoder.allow_loud_silence,
            interpolate = self.config.decoder.interpolate,
            adjust_padding = self.config.decoder.adjust_padding,
            prior = self.config.prior.apply,
            "forced aligner ready"
        );

        Ok(ForcedAligner::from_parts(ForcedAlignerParts {
            config: self.config,
            vocabulary,
            sequence_decoder: self
                .sequence_decoder
                .unwrap_or_else(|| Box::new(ViterbiSequenceDecoder)),
            word_grouper: self
                .word_grouper
                .unwrap_or_else(|| Box::new(SpanWordGrouper)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::alignment::transition::TransitionMatrix;
    use crate::alignment::viterbi::DecodedPath;
    use crate::pipeline::backend::BackendKind;
    use crate::types::AlignmentInput;

    use super::*;

    struct CountingDecoder {
        calls: Arc<AtomicUsize>,
    }

    impl SequenceDecoder for CountingDecoder {
        fn decode(
            &self,
            emissions: &[Vec<f64>],
            transitions: &TransitionMatrix,
        ) -> Result<DecodedPath, AlignmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ViterbiSequenceDecoder.decode(emissions, transitions)
        }
    }

    fn three_frame_input(vocab: &PhonemeVocabulary, phoneme: &str) -> AlignmentInput {
        let id = vocab.phoneme_to_index(phoneme).unwrap();
        AlignmentInput {
            phonemes: vec![vocab.silence_id(), id, vocab.silence_id()],
            emissions: vec![
                vec![0.0, -5.0, -5.0],
                vec![-5.0, 0.0, -5.0],
                vec![-5.0, -5.0, 0.0],
            ],
            loudness_db: None,
            word_spans: None,
        }
    }

    #[test]
    fn build_defaults_to_arpabet() {
        let aligner = ForcedAlignerBuilder::new(AlignerConfig::default())
            .build()
            .expect("build should succeed");
        assert_eq!(aligner.vocabulary().len(), PhonemeVocabulary::arpabet().len());
        assert_eq!(aligner.config().backend, BackendKind::Neural);
    }

    #[test]
    fn build_rejects_external_backends() {
        for backend in [BackendKind::Mfa, BackendKind::P2fa] {
            let config = AlignerConfig {
                backend,
                ..AlignerConfig::default()
            };
            let err = ForcedAlignerBuilder::new(config).build().err().unwrap();
            assert!(matches!(err, AlignmentError::UnsupportedBackend { .. }));
        }
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = AlignerConfig::default();
        config.decoder.hop_duration_s = 0.0;
        assert!(ForcedAlignerBuilder::new(config).build().is_err());
    }

    #[test]
    fn build_loads_vocabulary_from_temp_file() {
        let vocab_path = std::env::temp_dir().join("phoneme_aligner_rs_builder_vocab.txt");
        std::fs::write(&vocab_path, "<silent>\n<unk>\na\nb\n").expect("write vocab");

        let config = AlignerConfig {
            vocab_path: Some(vocab_path.to_string_lossy().to_string()),
            ..AlignerConfig::default()
        };
        let aligner = ForcedAlignerBuilder::new(config)
            .build()
            .expect("build should succeed");
        assert_eq!(aligner.vocabulary().len(), 4);

        let out = aligner
            .align(&three_frame_input(aligner.vocabulary(), "b"))
            .unwrap();
        assert_eq!(out.alignment.phonemes[1].phoneme, "b");

        let _ = std::fs::remove_file(&vocab_path);
    }

    #[test]
    fn build_fails_on_missing_vocab_file() {
        let config = AlignerConfig {
            vocab_path: Some("/nonexistent/phoneme_aligner_rs/vocab.txt".to_string()),
            ..AlignerConfig::default()
        };
        let err = ForcedAlignerBuilder::new(config).build().err().unwrap();
        assert!(matches!(err, AlignmentError::Io { .. }));
    }

    #[test]
    fn explicit_vocabulary_wins_over_path() {
        let vocab = Arc::new(PhonemeVocabulary::new(["<silent>", "<unk>", "x"]).unwrap());
        let config = AlignerConfig {
            vocab_path: Some("/nonexistent/phoneme_aligner_rs/vocab.txt".to_string()),
            ..AlignerConfig::default()
        };
        let aligner = ForcedAlignerBuilder::new(config)
            .with_vocabulary(Arc::clone(&vocab))
            .build()
            .expect("build should succeed");
        assert!(Arc::ptr_eq(aligner.vocabulary(), &vocab));
    }

    #[test]
    fn custom_sequence_decoder_is_used() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aligner = ForcedAlignerBuilder::new(AlignerConfig::default())
            .with_sequence_decoder(Box::new(CountingDecoder {
                calls: Arc::clone(&calls),
            }))
            .build()
            .unwrap();
        let out = aligner
            .align(&three_frame_input(aligner.vocabulary(), "aa"))
            .unwrap();
        assert_eq!(out.path, vec![0, 1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
