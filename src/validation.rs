use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};

use crate::models::NewFeedback;

/// Longest comment accepted on submission
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Validation utilities for feedback submissions and lexicon entries
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a star rating
    pub fn validate_rating(rating: i64) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(anyhow!("Rating must be between 1 and 5, got {rating}"));
        }
        Ok(())
    }

    /// Validate a menu item identifier
    pub fn validate_menu_item_id(menu_item_id: i64) -> Result<()> {
        if menu_item_id <= 0 {
            return Err(anyhow!("Menu item id must be positive, got {menu_item_id}"));
        }
        Ok(())
    }

    /// Validate comment length
    ///
    /// Content is never rejected: empty or symbol-only comments simply score
    /// no words.
    pub fn validate_comment(comment: &str) -> Result<()> {
        let length = comment.chars().count();
        if length > MAX_COMMENT_LENGTH {
            return Err(anyhow!(
                "Comment too long ({length} characters, max {MAX_COMMENT_LENGTH})"
            ));
        }
        Ok(())
    }

    /// Validate a feedback date
    pub fn validate_feedback_date(date: NaiveDate) -> Result<()> {
        let today = Local::now().date_naive();
        if date > today {
            return Err(anyhow!("Feedback date {date} is in the future"));
        }
        Ok(())
    }

    /// Validate a whole submission
    pub fn validate_feedback(feedback: &NewFeedback) -> Result<()> {
        Self::validate_menu_item_id(feedback.menu_item_id)?;
        Self::validate_rating(feedback.rating)?;
        Self::validate_comment(&feedback.comment)?;
        if let Some(date) = feedback.feedback_date {
            Self::validate_feedback_date(date)?;
        }
        Ok(())
    }

    /// Validate a normalized lexicon word
    pub fn validate_lexicon_word(word: &str) -> Result<()> {
        if word.is_empty() {
            return Err(anyhow!("Lexicon word cannot be empty"));
        }

        // The tokenizer splits on anything outside [0-9A-Za-z_], so such a word could never match
        if !word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!("Lexicon word {word:?} contains non-word characters"));
        }

        Ok(())
    }

    /// Sanitize comment text before storage
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate database URL
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(anyhow!("Database URL cannot be empty"));
        }

        if !url.starts_with("sqlite:") {
            return Err(anyhow!("Only SQLite databases are supported"));
        }

        if url.len() > 1000 {
            return Err(anyhow!("Database URL too long"));
        }

        Ok(())
    }
}
