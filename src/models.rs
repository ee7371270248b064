//! Data models for feedback scoring and storage
//!
//! This module contains the data structures that flow through the scoring
//! pipeline: raw feedback rows, per-comment word tallies, aggregated
//! sentiment and the stored recommendation records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sentiment::Sentiment;

/// Separator used when evidence words are joined for storage
pub const EVIDENCE_SEPARATOR: &str = ", ";

/// One feedback submission from the recent-comment feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingComment {
    /// Menu item the feedback is about
    pub menu_item_id: i64,
    /// Star rating, 1 to 5
    pub rating: i64,
    /// Free-text comment
    pub comment: String,
}

/// Weighted word hits for one or more comments
///
/// Each evidence list holds one entry per unit added to its count, in scan
/// order, so `positive_words.len() == positive_count` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTally {
    /// Weighted positive hits
    pub positive_count: usize,
    /// Weighted negative hits
    pub negative_count: usize,
    /// Neutral hits
    pub neutral_count: usize,
    /// Words that produced positive hits
    pub positive_words: Vec<String>,
    /// Words that produced negative hits
    pub negative_words: Vec<String>,
    /// Words that produced neutral hits
    pub neutral_words: Vec<String>,
}

impl WordTally {
    /// Sum of all three counts
    #[must_use]
    pub const fn total(&self) -> usize {
        self.positive_count + self.negative_count + self.neutral_count
    }

    pub(crate) fn add_positive(&mut self, word: &str) {
        self.positive_count += 1;
        self.positive_words.push(word.to_string());
    }

    pub(crate) fn add_negative(&mut self, word: &str) {
        self.negative_count += 1;
        self.negative_words.push(word.to_string());
    }

    pub(crate) fn add_neutral(&mut self, word: &str) {
        self.neutral_count += 1;
        self.neutral_words.push(word.to_string());
    }

    /// Fold another tally into this one, keeping evidence order
    pub fn merge(&mut self, other: Self) {
        self.positive_count += other.positive_count;
        self.negative_count += other.negative_count;
        self.neutral_count += other.neutral_count;
        self.positive_words.extend(other.positive_words);
        self.negative_words.extend(other.negative_words);
        self.neutral_words.extend(other.neutral_words);
    }
}

/// Overall sentiment for a set of comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSentiment {
    /// Label picked from the net score
    pub sentiment: Sentiment,
    /// Rounded absolute net score, 0 to 100
    pub score: u8,
    /// Summed counts and evidence words
    pub matched_words: WordTally,
}

/// Stored recommendation metadata for one menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// Menu item this record belongs to (unique)
    pub menu_item_id: i64,
    /// Sentiment label
    pub sentiment: Sentiment,
    /// Rounded absolute net score, 0 to 100
    pub score: u8,
    /// Mean rating over the window
    pub average_rating: f64,
    /// Joined positive evidence words
    pub positive_words: String,
    /// Joined negative evidence words
    pub negative_words: String,
    /// Joined neutral evidence words
    pub neutral_words: String,
    /// Day the record was computed
    pub date_calculated: NaiveDate,
}

impl SentimentRecord {
    /// Build a record from an aggregate and the item's ratings
    #[must_use]
    pub fn from_aggregate(
        menu_item_id: i64,
        aggregate: &AggregateSentiment,
        average_rating: f64,
        date_calculated: NaiveDate,
    ) -> Self {
        let words = &aggregate.matched_words;
        Self {
            menu_item_id,
            sentiment: aggregate.sentiment,
            score: aggregate.score,
            average_rating,
            positive_words: words.positive_words.join(EVIDENCE_SEPARATOR),
            negative_words: words.negative_words.join(EVIDENCE_SEPARATOR),
            neutral_words: words.neutral_words.join(EVIDENCE_SEPARATOR),
            date_calculated,
        }
    }

    /// Human readable evidence, e.g. `Positive: tasty, Neutral: ok`
    ///
    /// Empty categories are left out.
    #[must_use]
    pub fn evidence_summary(&self) -> String {
        [
            ("Positive", &self.positive_words),
            ("Negative", &self.negative_words),
            ("Neutral", &self.neutral_words),
        ]
        .iter()
        .filter(|(_, words)| !words.is_empty())
        .map(|(label, words)| format!("{label}: {words}"))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Data for a new feedback submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    /// Menu item being rated
    pub menu_item_id: i64,
    /// Star rating, 1 to 5
    pub rating: i64,
    /// Free-text comment
    pub comment: String,
    /// Day of the feedback; defaults to today when absent
    #[serde(default)]
    pub feedback_date: Option<NaiveDate>,
}

/// Database representation of a feedback row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbFeedback {
    /// Database primary key
    pub id: i64,
    /// Menu item being rated
    pub menu_item_id: i64,
    /// Star rating
    pub rating: i64,
    /// Free-text comment
    pub comment: String,
    /// Day of the feedback
    pub feedback_date: NaiveDate,
}

/// One row of the monthly feedback report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    /// Menu item
    pub menu_item_id: i64,
    /// Mean rating over the report window
    pub average_rating: f64,
    /// Number of feedback rows in the window
    pub feedback_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(positive: &str, negative: &str, neutral: &str) -> SentimentRecord {
        SentimentRecord {
            menu_item_id: 1,
            sentiment: Sentiment::Good,
            score: 60,
            average_rating: 4.0,
            positive_words: positive.to_string(),
            negative_words: negative.to_string(),
            neutral_words: neutral.to_string(),
            date_calculated: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
        }
    }

    #[test]
    fn test_evidence_summary_skips_empty_categories() {
        assert_eq!(
            record("delicious", "", "okay").evidence_summary(),
            "Positive: delicious, Neutral: okay"
        );
        assert_eq!(record("", "", "").evidence_summary(), "");
    }

    #[test]
    fn test_tally_merge_keeps_order() {
        let mut first = WordTally::default();
        first.add_positive("good");
        let mut second = WordTally::default();
        second.add_positive("tasty");
        second.add_neutral("ok");

        first.merge(second);
        assert_eq!(first.positive_words, vec!["good", "tasty"]);
        assert_eq!(first.total(), 3);
    }
}
