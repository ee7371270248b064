//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.

/// Feedback table schema
pub mod feedback {
    /// Table name
    pub const TABLE: &str = "feedback";
    /// Primary key column
    pub const ID: &str = "id";
    /// Rated menu item column
    pub const MENU_ITEM_ID: &str = "menu_item_id";
    /// Star rating column (1-5)
    pub const RATING: &str = "rating";
    /// Free-text comment column
    pub const COMMENT: &str = "comment";
    /// Submission day column (YYYY-MM-DD)
    pub const FEEDBACK_DATE: &str = "feedback_date";
}

/// Sentiment table schema, one row per menu item
pub mod sentiment {
    /// Table name
    pub const TABLE: &str = "sentiment";
    /// Menu item column (unique)
    pub const MENU_ITEM_ID: &str = "menu_item_id";
    /// Sentiment label column
    pub const SENTIMENT: &str = "sentiment";
    /// Average rating column, two decimals
    pub const AVERAGE_RATING: &str = "average_rating";
    /// Absolute net score column
    pub const SENTIMENT_SCORE: &str = "sentiment_score";
    /// Joined positive evidence words
    pub const POSITIVE_WORDS: &str = "positive_words";
    /// Joined negative evidence words
    pub const NEGATIVE_WORDS: &str = "negative_words";
    /// Joined neutral evidence words
    pub const NEUTRAL_WORDS: &str = "neutral_words";
    /// Day the row was last computed
    pub const DATE_CALCULATED: &str = "date_calculated";
}
