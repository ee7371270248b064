use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::Database;
use crate::error::{Result, SentimentError};
use crate::models::{RatingComment, SentimentRecord};

/// Data access needed by the scoring pipeline and the recommendation read path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SentimentRepository: Send + Sync {
    /// Feedback rows submitted on or after `since`
    async fn fetch_recent_comments(&self, since: NaiveDate) -> Result<Vec<RatingComment>>;
    /// The stored record for one menu item, if any
    async fn get_existing_sentiment(&self, menu_item_id: i64) -> Result<Option<SentimentRecord>>;
    /// Store a record for an item that has none
    async fn insert_sentiment(&self, record: &SentimentRecord) -> Result<()>;
    /// Overwrite the record of an item
    async fn update_sentiment(&self, record: &SentimentRecord) -> Result<()>;
    /// Stored records ordered best first
    async fn list_sentiments(&self, limit: Option<usize>) -> Result<Vec<SentimentRecord>>;
}

/// `SentimentRepository` backed by the SQLite [`Database`]
#[derive(Clone)]
pub struct SqliteSentimentRepository {
    database: Database,
}

impl SqliteSentimentRepository {
    /// Wrap an open database
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// The underlying database
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl SentimentRepository for SqliteSentimentRepository {
    async fn fetch_recent_comments(&self, since: NaiveDate) -> Result<Vec<RatingComment>> {
        self.database
            .fetch_recent_comments(since)
            .map_err(|e| SentimentError::Fetch(e.to_string()))
    }

    async fn get_existing_sentiment(&self, menu_item_id: i64) -> Result<Option<SentimentRecord>> {
        self.database.get_sentiment(menu_item_id)
    }

    async fn insert_sentiment(&self, record: &SentimentRecord) -> Result<()> {
        self.database.insert_sentiment(record)
    }

    async fn update_sentiment(&self, record: &SentimentRecord) -> Result<()> {
        self.database.update_sentiment(record)
    }

    async fn list_sentiments(&self, limit: Option<usize>) -> Result<Vec<SentimentRecord>> {
        self.database.list_sentiments(limit)
    }
}
