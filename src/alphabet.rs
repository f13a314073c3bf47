use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::types::RowOutcome;

const LATIN_SYMBOLS: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];
const BENGALI_SYMBOLS: &[char] = &['ক', 'খ', 'গ', 'ঘ'];

/// The alphabet answers are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Bengali,
}

impl From<&str> for Language {
    /// `eng` selects Latin letters; any other selector selects Bengali.
    fn from(s: &str) -> Self {
        match s {
            "eng" => Language::English,
            _ => Language::Bengali,
        }
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.as_str().into())
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Language::English => serializer.serialize_str("eng"),
            Language::Bengali => serializer.serialize_str("ben"),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Bengali => write!(f, "Bengali"),
        }
    }
}

impl Language {
    /// Option symbols in left-to-right bubble order.
    pub fn symbols(&self) -> &'static [char] {
        match self {
            Language::English => LATIN_SYMBOLS,
            Language::Bengali => BENGALI_SYMBOLS,
        }
    }

    /// The symbol recorded for a question with no marked bubble.
    pub fn sentinel(&self) -> char {
        match self {
            Language::English => 'X',
            Language::Bengali => '০',
        }
    }

    /// The most options a question can have while every marked option
    /// still reads differently from the sentinel.
    pub fn max_options(&self) -> usize {
        let symbols = self.symbols();
        symbols
            .iter()
            .position(|&symbol| symbol == self.sentinel())
            .unwrap_or(symbols.len())
    }

    /// Maps a row outcome to its answer symbol, or `None` if the winning
    /// index has no symbol in this alphabet.
    pub fn symbol_for(&self, outcome: RowOutcome) -> Option<char> {
        match outcome {
            RowOutcome::Marked(index) => self.symbols().get(index).copied(),
            RowOutcome::NoAnswer => Some(self.sentinel()),
        }
    }
}

/// Builds the detected-answer string, one symbol per row in row order.
pub fn decode_answers<I>(outcomes: I, language: Language) -> Option<String>
where
    I: IntoIterator<Item = RowOutcome>,
{
    outcomes
        .into_iter()
        .map(|outcome| language.symbol_for(outcome))
        .collect()
}
