use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, SentimentError};
use crate::lexicon::Lexicon;
use crate::models::WordTally;

/// The negation cue recognized by the classifier
pub const NEGATION_WORD: &str = "not";

/// How an intensified word is weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensifierMode {
    /// Intensifier pass adds 2 and the base pass still counts the word once more
    #[default]
    Add,
    /// Intensifier pass adds 2 and the word is skipped by the base pass
    Replace,
}

impl FromStr for IntensifierMode {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            other => Err(SentimentError::InvalidConfig(format!(
                "Invalid intensifier mode: {other}. Must be one of: add, replace"
            ))),
        }
    }
}

/// Lexicon-based classifier for a single feedback comment
#[derive(Debug, Clone)]
pub struct CommentClassifier {
    lexicon: Arc<Lexicon>,
    mode: IntensifierMode,
    separator_regex: Regex,
}

impl CommentClassifier {
    /// Create a classifier over the given lexicon
    pub fn new(lexicon: Arc<Lexicon>, mode: IntensifierMode) -> Result<Self> {
        // ASCII word class: accented letters separate tokens
        let separator_regex = Regex::new(r"[^0-9A-Za-z_]+")
            .map_err(|e| SentimentError::Other(format!("Failed to compile separator regex: {e}")))?;

        Ok(Self {
            lexicon,
            mode,
            separator_regex,
        })
    }

    /// The lexicon this classifier scores against
    #[must_use]
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Intensifier weighting in effect
    #[must_use]
    pub const fn mode(&self) -> IntensifierMode {
        self.mode
    }

    /// Lowercase the comment and split it on runs of non-ASCII-word characters
    #[must_use]
    pub fn tokenize(&self, comment: &str) -> Vec<String> {
        let normalized = comment.nfc().collect::<String>().to_lowercase();
        self.separator_regex
            .split(&normalized)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Classify one comment into weighted word hits
    ///
    /// Three passes run over the tokens:
    /// 1. `not` followed by a polar word counts one hit of the opposite
    ///    polarity and removes that word from the base pass.
    /// 2. An intensifier followed by a polar word counts two hits of the same
    ///    polarity, recording both words.
    /// 3. Every remaining token counts one hit for its own category.
    #[must_use]
    pub fn classify(&self, comment: &str) -> WordTally {
        let words = self.tokenize(comment);
        let mut adjusted: Vec<&str> = words.iter().map(String::as_str).collect();
        let mut tally = WordTally::default();
        let lexicon = &self.lexicon;

        for (i, pair) in words.windows(2).enumerate() {
            let (word, next) = (pair[0].as_str(), pair[1].as_str());
            if word != NEGATION_WORD {
                continue;
            }
            if lexicon.is_positive(next) {
                tally.add_negative(next);
                adjusted[i + 1] = "";
            } else if lexicon.is_negative(next) {
                tally.add_positive(next);
                adjusted[i + 1] = "";
            }
        }

        for (i, pair) in words.windows(2).enumerate() {
            let (word, next) = (pair[0].as_str(), pair[1].as_str());
            if !lexicon.is_intensifier(word) {
                continue;
            }
            let hit = if lexicon.is_positive(next) {
                tally.add_positive(word);
                tally.add_positive(next);
                true
            } else if lexicon.is_negative(next) {
                tally.add_negative(word);
                tally.add_negative(next);
                true
            } else {
                false
            };
            if hit && self.mode == IntensifierMode::Replace {
                adjusted[i + 1] = "";
            }
        }

        for word in adjusted {
            if lexicon.is_positive(word) {
                tally.add_positive(word);
            }
            if lexicon.is_negative(word) {
                tally.add_negative(word);
            }
            if lexicon.is_neutral(word) {
                tally.add_neutral(word);
            }
        }

        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(mode: IntensifierMode) -> CommentClassifier {
        CommentClassifier::new(Arc::new(Lexicon::default()), mode)
            .expect("Failed to create classifier")
    }

    #[test]
    fn test_tokenize() {
        let classifier = classifier(IntensifierMode::Add);

        let tokens = classifier.tokenize("  The FOOD, was... very-good!! ");
        assert_eq!(tokens, vec!["the", "food", "was", "very", "good"]);

        assert!(classifier.tokenize("").is_empty());
        assert!(classifier.tokenize(" \t\n !?").is_empty());
    }

    #[test]
    fn test_tokenize_splits_on_non_ascii_letters() {
        let classifier = classifier(IntensifierMode::Add);

        assert_eq!(classifier.tokenize("goodé"), vec!["good"]);
        assert_eq!(classifier.tokenize("Crème brûlée"), vec!["cr", "me", "br", "l", "e"]);
        // Decomposed input is composed first, so both spellings split alike
        assert_eq!(classifier.tokenize("cafe\u{301} ok"), vec!["caf", "ok"]);

        let tally = classifier.classify("goodé");
        assert_eq!(tally.positive_count, 1);
        assert_eq!(tally.positive_words, vec!["good"]);
    }

    #[test]
    fn test_negation_flips_positive_word() {
        let tally = classifier(IntensifierMode::Add).classify("not good");
        assert_eq!(tally.negative_count, 1);
        assert_eq!(tally.negative_words, vec!["good"]);
        assert_eq!(tally.positive_count, 0);
    }

    #[test]
    fn test_negation_flips_negative_word() {
        let tally = classifier(IntensifierMode::Add).classify("Not bad at all");
        assert_eq!(tally.positive_count, 1);
        assert_eq!(tally.positive_words, vec!["bad"]);
        assert_eq!(tally.negative_count, 0);
    }

    #[test]
    fn test_negation_leaves_neutral_word_alone() {
        let tally = classifier(IntensifierMode::Add).classify("not average");
        assert_eq!(tally.neutral_count, 1);
        assert_eq!(tally.total(), 1);
    }

    #[test]
    fn test_trailing_not_has_no_effect() {
        let tally = classifier(IntensifierMode::Add).classify("tasty or not");
        assert_eq!(tally.positive_count, 1);
        assert_eq!(tally.negative_count, 0);
    }

    #[test]
    fn test_intensifier_adds_to_base_count() {
        let tally = classifier(IntensifierMode::Add).classify("very good");
        assert_eq!(tally.positive_count, 3);
        assert_eq!(tally.positive_words, vec!["very", "good", "good"]);
    }

    #[test]
    fn test_intensifier_replace_mode() {
        let tally = classifier(IntensifierMode::Replace).classify("very good");
        assert_eq!(tally.positive_count, 2);
        assert_eq!(tally.positive_words, vec!["very", "good"]);
    }

    #[test]
    fn test_intensified_negative() {
        let tally = classifier(IntensifierMode::Add).classify("really awful");
        assert_eq!(tally.negative_count, 3);
        assert_eq!(tally.positive_count, 0);
    }

    #[test]
    fn test_intensifier_before_negation_is_ignored() {
        // "very not good": the intensifier sees "not", only the negation fires
        let tally = classifier(IntensifierMode::Add).classify("very not good");
        assert_eq!(tally.positive_count, 0);
        assert_eq!(tally.negative_count, 1);
    }

    #[test]
    fn test_no_lexicon_words() {
        let tally = classifier(IntensifierMode::Add).classify("the sky is blue");
        assert_eq!(tally, WordTally::default());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Replace".parse::<IntensifierMode>().ok(), Some(IntensifierMode::Replace));
        assert!("double".parse::<IntensifierMode>().is_err());
    }
}
