//! Polarity lexicon used by the comment classifier.
//!
//! A [`Lexicon`] is four disjoint sets of lowercase words. It is plain data:
//! built once at startup (from the built-in lists or a YAML/JSON file) and
//! handed to the classifier, so tests can substitute their own word lists.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, SentimentError};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "delicious",
    "tasty",
    "love",
    "fantastic",
    "wonderful",
    "awesome",
    "pleasant",
    "enjoyable",
    "nice",
    "superb",
    "yummy",
    "satisfying",
    "perfect",
    "positive",
    "brilliant",
    "spectacular",
    "like",
    "enjoy",
    "happy",
    "pleased",
    "pleasing",
    "outstanding",
    "splendid",
    "remarkable",
    "exceptional",
];

// "not" belongs to the negation pass, so it is not a Negative word here.
const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "disgusting",
    "poor",
    "hate",
    "unpleasant",
    "horrible",
    "nasty",
    "dreadful",
    "subpar",
    "unappetizing",
    "atrocious",
    "gross",
    "dislike",
    "worst",
    "negative",
    "inferior",
    "unsatisfactory",
    "appalling",
    "sad",
    "unsatisfied",
    "unhappy",
    "displeased",
    "horrific",
    "abysmal",
    "pathetic",
    "lousy",
];

const NEUTRAL_WORDS: &[&str] = &[
    "average", "mediocre", "ok", "fine", "fair", "decent", "standard", "ordinary", "typical",
];

const INTENSIFIERS: &[&str] = &[
    "very",
    "extremely",
    "absolutely",
    "highly",
    "incredibly",
    "really",
    "quite",
    "super",
    "truly",
    "remarkably",
];

/// Category a lexicon word belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordCategory {
    /// Raises the positive count
    Positive,
    /// Raises the negative count
    Negative,
    /// Raises the neutral count
    Neutral,
    /// Doubles the weight of the following polar word
    Intensifier,
}

impl fmt::Display for WordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Intensifier => "Intensifier",
        };
        f.write_str(name)
    }
}

/// Raw word lists as they appear in a lexicon file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconLists {
    /// Positive words
    #[serde(default)]
    pub positive: Vec<String>,
    /// Negative words
    #[serde(default)]
    pub negative: Vec<String>,
    /// Neutral words
    #[serde(default)]
    pub neutral: Vec<String>,
    /// Intensifiers
    #[serde(default)]
    pub intensifier: Vec<String>,
}

/// Four disjoint, immutable word sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
    neutral: HashSet<String>,
    intensifier: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let set = |words: &[&str]| words.iter().map(ToString::to_string).collect();
        Self {
            positive: set(POSITIVE_WORDS),
            negative: set(NEGATIVE_WORDS),
            neutral: set(NEUTRAL_WORDS),
            intensifier: set(INTENSIFIERS),
        }
    }
}

impl Lexicon {
    /// Build a lexicon from word lists.
    ///
    /// Words are trimmed and lowercased. Empty words and words that appear in
    /// more than one category are rejected.
    pub fn from_lists(lists: LexiconLists) -> Result<Self> {
        let lexicon = Self {
            positive: normalize(&lists.positive, WordCategory::Positive)?,
            negative: normalize(&lists.negative, WordCategory::Negative)?,
            neutral: normalize(&lists.neutral, WordCategory::Neutral)?,
            intensifier: normalize(&lists.intensifier, WordCategory::Intensifier)?,
        };
        lexicon.check_disjoint()?;
        Ok(lexicon)
    }

    /// Load a lexicon from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let lists: LexiconLists = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&raw)?,
            other => {
                return Err(SentimentError::InvalidLexicon(format!(
                    "unsupported lexicon file extension: {}",
                    other.unwrap_or("<none>")
                )))
            },
        };
        tracing::info!(path = %path.display(), "Loaded lexicon file");
        Self::from_lists(lists)
    }

    /// Whether `word` is in the positive set
    #[must_use]
    pub fn is_positive(&self, word: &str) -> bool {
        self.positive.contains(word)
    }

    /// Whether `word` is in the negative set
    #[must_use]
    pub fn is_negative(&self, word: &str) -> bool {
        self.negative.contains(word)
    }

    /// Whether `word` is in the neutral set
    #[must_use]
    pub fn is_neutral(&self, word: &str) -> bool {
        self.neutral.contains(word)
    }

    /// Whether `word` is an intensifier
    #[must_use]
    pub fn is_intensifier(&self, word: &str) -> bool {
        self.intensifier.contains(word)
    }

    /// The category of `word`, if any
    #[must_use]
    pub fn category(&self, word: &str) -> Option<WordCategory> {
        if self.is_positive(word) {
            Some(WordCategory::Positive)
        } else if self.is_negative(word) {
            Some(WordCategory::Negative)
        } else if self.is_neutral(word) {
            Some(WordCategory::Neutral)
        } else if self.is_intensifier(word) {
            Some(WordCategory::Intensifier)
        } else {
            None
        }
    }

    fn check_disjoint(&self) -> Result<()> {
        let sets = [
            (WordCategory::Positive, &self.positive),
            (WordCategory::Negative, &self.negative),
            (WordCategory::Neutral, &self.neutral),
            (WordCategory::Intensifier, &self.intensifier),
        ];

        for (i, (left_name, left)) in sets.iter().enumerate() {
            for (right_name, right) in &sets[i + 1..] {
                let mut shared: Vec<&String> = left.intersection(right).collect();
                if !shared.is_empty() {
                    shared.sort();
                    return Err(SentimentError::InvalidLexicon(format!(
                        "{left_name} and {right_name} share words: {shared:?}"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn normalize(words: &[String], category: WordCategory) -> Result<HashSet<String>> {
    words
        .iter()
        .map(|word| {
            let word = word.trim().nfc().collect::<String>().to_lowercase();
            crate::validation::InputValidator::validate_lexicon_word(&word)
                .map_err(|e| SentimentError::InvalidLexicon(format!("{category}: {e}")))?;
            Ok(word)
        })
        .collect()
}
