//! Error types for the cafeteria-sentiment library.
//!
//! This module provides custom error types using `thiserror` so that the
//! scoring pipeline can tell a collaborator failure apart from a bad lexicon
//! or a rejected feedback submission.

use thiserror::Error;

/// Errors that can occur while scoring feedback and storing recommendations.
#[derive(Error, Debug)]
pub enum SentimentError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML lexicon or config parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Refresh cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Lexicon lists that overlap or contain unusable words
    #[error("Invalid lexicon: {0}")]
    InvalidLexicon(String),

    /// Rejected feedback submission
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The recent-comment feed could not be read
    #[error("Failed to fetch recent comments: {0}")]
    Fetch(String),

    /// Scoring or storing a single menu item failed
    #[error("Failed to store sentiment for menu item {menu_item_id}: {message}")]
    ItemFailed {
        /// Menu item whose upsert failed
        menu_item_id: i64,
        /// Underlying failure
        message: String,
    },

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `SentimentError`
pub type Result<T> = std::result::Result<T, SentimentError>;

impl From<anyhow::Error> for SentimentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for SentimentError {
    fn from(err: sled::Error) -> Self {
        Self::Cache(err.to_string())
    }
}
