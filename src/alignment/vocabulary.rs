use std::collections::HashMap;
use std::path::Path;

use crate::error::AlignmentError;

pub const SILENCE: &str = "<silent>";
pub const UNKNOWN: &str = "<unk>";

/// CMU ARPAbet phonemes without stress markers.
const ARPABET: [&str; 39] = [
    "aa", "ae", "ah", "ao", "aw", "ay", "b", "ch", "d", "dh", "eh", "er", "ey", "f", "g", "hh",
    "ih", "iy", "jh", "k", "l", "m", "n", "ng", "ow", "oy", "p", "r", "s", "sh", "t", "th", "uh",
    "uw", "v", "w", "y", "z", "zh",
];

const VOWELS: [&str; 15] = [
    "aa", "ae", "ah", "ao", "aw", "ay", "eh", "er", "ey", "ih", "iy", "ow", "oy", "uh", "uw",
];

const VOICED_CONSONANTS: [&str; 15] = [
    "b", "d", "dh", "g", "jh", "l", "m", "n", "ng", "r", "v", "w", "y", "z", "zh",
];

/// ARPAbet symbol without its stress digit, lowercased.
fn base_symbol(symbol: &str) -> String {
    symbol
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_lowercase()
}

/// Whether an ARPAbet phoneme is a vowel. Silence and non-ARPAbet symbols are not.
pub fn is_vowel(symbol: &str) -> bool {
    VOWELS.contains(&base_symbol(symbol).as_str())
}

/// Whether an ARPAbet phoneme is voiced: every vowel plus the voiced consonants.
pub fn is_voiced(symbol: &str) -> bool {
    let base = base_symbol(symbol);
    VOWELS.contains(&base.as_str()) || VOICED_CONSONANTS.contains(&base.as_str())
}

/// Immutable phoneme table. Build once and share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PhonemeVocabulary {
    symbols: Vec<String>,
    index: HashMap<String, usize>,
    silence_id: usize,
    unknown_id: usize,
}

impl PhonemeVocabulary {
    pub fn new<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Result<Self, AlignmentError> {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if symbol.trim().is_empty() {
                return Err(AlignmentError::invalid_input(format!(
                    "vocabulary entry {i} is empty"
                )));
            }
            if index.insert(symbol.clone(), i).is_some() {
                return Err(AlignmentError::invalid_input(format!(
                    "duplicate vocabulary entry '{symbol}'"
                )));
            }
        }
        let silence_id = *index.get(SILENCE).ok_or_else(|| {
            AlignmentError::invalid_input(format!("vocabulary is missing '{SILENCE}'"))
        })?;
        let unknown_id = *index.get(UNKNOWN).ok_or_else(|| {
            AlignmentError::invalid_input(format!("vocabulary is missing '{UNKNOWN}'"))
        })?;
        Ok(Self {
            symbols,
            index,
            silence_id,
            unknown_id,
        })
    }

    /// ARPAbet with the reserved symbols first.
    pub fn arpabet() -> Self {
        let symbols = [SILENCE, UNKNOWN].into_iter().chain(ARPABET);
        let symbols: Vec<String> = symbols.map(str::to_string).collect();
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Self {
            symbols,
            index,
            silence_id: 0,
            unknown_id: 1,
        }
    }

    /// One symbol per line; blank lines are ignored.
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read phoneme vocabulary", e))?;
        Self::new(
            data.lines()
                .map(str::trim_end)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn silence_id(&self) -> usize {
        self.silence_id
    }

    pub fn unknown_id(&self) -> usize {
        self.unknown_id
    }

    pub fn is_silence(&self, id: usize) -> bool {
        id == self.silence_id
    }

    pub fn is_voiced(&self, id: usize) -> bool {
        self.index_to_phoneme(id).is_some_and(is_voiced)
    }

    pub fn is_vowel(&self, id: usize) -> bool {
        self.index_to_phoneme(id).is_some_and(is_vowel)
    }

    pub fn phoneme_to_index(&self, symbol: &str) -> Result<usize, AlignmentError> {
        self.index
            .get(symbol)
            .copied()
            .ok_or_else(|| AlignmentError::UnknownPhoneme {
                symbol: symbol.to_string(),
            })
    }

    pub fn index_to_phoneme(&self, id: usize) -> Option<&str> {
        self.symbols.get(id).map(String::as_str)
    }

    pub fn encode<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Vec<usize>, AlignmentError> {
        symbols
            .iter()
            .map(|s| self.phoneme_to_index(s.as_ref()))
            .collect()
    }

    /// Like [`encode`](Self::encode), but out-of-vocabulary symbols become `<unk>`.
    pub fn encode_lossy<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<usize> {
        symbols
            .iter()
            .map(|s| {
                let s = s.as_ref();
                self.index.get(s).copied().unwrap_or_else(|| {
                    tracing::warn!(symbol = s, "vocabulary: mapping unknown phoneme to <unk>");
                    self.unknown_id
                })
            })
            .collect()
    }
}
