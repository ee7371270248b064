//! Cafeteria Sentiment - Feedback Scoring and Menu Recommendations
//!
//! A Rust library that turns free-text cafeteria feedback into per-item
//! sentiment records using a fixed word lexicon.
//!
//! # Features
//!
//! - Lexicon-based comment classification with negation and intensifiers
//! - Net-score aggregation into five recommendation labels
//! - Windowed scoring pipeline with idempotent upserts into SQLite
//! - Recommendation and discard-candidate reads with an optional refresh cache

/// Refresh cache for completed scoring runs
pub mod cache;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Word lists used for classification
pub mod lexicon;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Comment classification
pub mod nlp;
/// Windowed scoring pipeline
pub mod pipeline;
/// Repository pattern for data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Sentiment labels and aggregation
pub mod sentiment;
/// Recommendation read path
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{Result, SentimentError};
pub use lexicon::Lexicon;
pub use models::{AggregateSentiment, RatingComment, SentimentRecord, WordTally};
pub use nlp::{CommentClassifier, IntensifierMode};
pub use pipeline::{FailurePolicy, PipelineReport, ScoringPipeline};
pub use repository::{SentimentRepository, SqliteSentimentRepository};
pub use sentiment::{Sentiment, SentimentAggregator};
pub use service::RecommendationService;
