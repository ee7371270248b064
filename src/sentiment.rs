//! Corpus-level sentiment aggregation.
//!
//! Sums per-comment tallies for one menu item and maps the net score
//! (`positive% - negative%`) onto a recommendation label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SentimentError};
use crate::models::{AggregateSentiment, WordTally};
use crate::nlp::CommentClassifier;

/// Score given to items whose comments hit no lexicon word
pub const NEUTRAL_SCORE: u8 = 50;

/// Recommendation label derived from the net sentiment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    /// Net score of at least 80
    #[serde(rename = "Highly Recommended")]
    HighlyRecommended,
    /// Net score in [60, 80)
    Good,
    /// Net score in [40, 60)
    Average,
    /// Net score in [20, 40)
    Poor,
    /// Net score below 20
    Avoid,
    /// No lexicon word matched
    Neutral,
}

impl Sentiment {
    /// Every label, best first
    pub const ALL: [Self; 6] = [
        Self::HighlyRecommended,
        Self::Good,
        Self::Average,
        Self::Poor,
        Self::Neutral,
        Self::Avoid,
    ];

    /// Position in recommendation order, 0 is best
    ///
    /// The score is a magnitude, so an all-negative item scores 100. Ranking
    /// must start from the label.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::HighlyRecommended => 0,
            Self::Good => 1,
            Self::Average => 2,
            Self::Poor => 3,
            Self::Neutral => 4,
            Self::Avoid => 5,
        }
    }

    /// Label as stored and displayed
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HighlyRecommended => "Highly Recommended",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
            Self::Avoid => "Avoid",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Highly Recommended" => Ok(Self::HighlyRecommended),
            "Good" => Ok(Self::Good),
            "Average" => Ok(Self::Average),
            "Poor" => Ok(Self::Poor),
            "Avoid" => Ok(Self::Avoid),
            "Neutral" => Ok(Self::Neutral),
            other => Err(SentimentError::Other(format!("Unknown sentiment label: {other}"))),
        }
    }
}

/// Pick the label and score for summed counts.
///
/// The net score is `100 * (positive - negative) / total`. Threshold checks
/// and rounding are done on integers so boundary values land exactly.
#[must_use]
pub fn overall_sentiment(positive: usize, negative: usize, neutral: usize) -> (Sentiment, u8) {
    let total = positive + negative + neutral;
    if total == 0 {
        return (Sentiment::Neutral, NEUTRAL_SCORE);
    }

    let total = total as i128;
    let diff = positive as i128 - negative as i128;
    // net >= t  <=>  100 * diff >= t * total
    let scaled = 100 * diff;

    let sentiment = if scaled >= 80 * total {
        Sentiment::HighlyRecommended
    } else if scaled >= 60 * total {
        Sentiment::Good
    } else if scaled >= 40 * total {
        Sentiment::Average
    } else if scaled >= 20 * total {
        Sentiment::Poor
    } else {
        Sentiment::Avoid
    };

    // round(|scaled| / total), ties up
    let score = (2 * scaled.abs() + total) / (2 * total);
    let score = u8::try_from(score).unwrap_or(100);

    (sentiment, score)
}

/// Runs the classifier over a corpus of comments and labels the result
#[derive(Debug, Clone)]
pub struct SentimentAggregator {
    classifier: CommentClassifier,
}

impl SentimentAggregator {
    /// Wrap a classifier
    #[must_use]
    pub const fn new(classifier: CommentClassifier) -> Self {
        Self { classifier }
    }

    /// The classifier used for each comment
    #[must_use]
    pub const fn classifier(&self) -> &CommentClassifier {
        &self.classifier
    }

    /// Classify every comment and combine the tallies
    #[must_use]
    pub fn aggregate<S: AsRef<str>>(&self, comments: &[S]) -> AggregateSentiment {
        let matched_words = comments.iter().fold(WordTally::default(), |mut acc, comment| {
            acc.merge(self.classifier.classify(comment.as_ref()));
            acc
        });

        let (sentiment, score) = overall_sentiment(
            matched_words.positive_count,
            matched_words.negative_count,
            matched_words.neutral_count,
        );

        AggregateSentiment {
            sentiment,
            score,
            matched_words,
        }
    }
}
