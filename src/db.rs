use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{Local, Months, NaiveDate};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{Result, SentimentError};
use crate::models::{DbFeedback, FeedbackSummary, NewFeedback, RatingComment, SentimentRecord};
use crate::schema::{feedback, sentiment};
use crate::sentiment::Sentiment;
use crate::validation::InputValidator;

/// Pool of SQLite connections
pub type DbPool = Pool<SqliteConnectionManager>;
/// A connection checked out of the pool
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Round a mean rating to the two decimals it is persisted with
#[must_use]
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Database manager for feedback rows and sentiment records
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at `database_url` with a default pool
    pub fn new(database_url: &str) -> Result<Self> {
        Self::from_config(&DatabaseConfig {
            url: database_url.to_string(),
            ..DatabaseConfig::default()
        })
    }

    /// Open the database described by `config`
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        InputValidator::validate_database_url(&config.url)
            .map_err(|e| SentimentError::InvalidConfig(e.to_string()))?;
        let path = strip_scheme(&config.url);

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        debug!(path, "Database ready");

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2024-06-01-000000_create_tables/up.sql"))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Record a feedback submission
    pub fn add_feedback(&self, new_feedback: NewFeedback) -> Result<DbFeedback> {
        InputValidator::validate_feedback(&new_feedback)
            .map_err(|e| SentimentError::InvalidInput(e.to_string()))?;

        let comment = InputValidator::sanitize_text(&new_feedback.comment);
        let conn = self.get_connection()?;
        let feedback_date = new_feedback
            .feedback_date
            .unwrap_or_else(|| Local::now().date_naive());

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
                feedback::TABLE,
                feedback::MENU_ITEM_ID,
                feedback::RATING,
                feedback::COMMENT,
                feedback::FEEDBACK_DATE
            ),
            params![
                new_feedback.menu_item_id,
                new_feedback.rating,
                comment,
                feedback_date
            ],
        )?;

        Ok(DbFeedback {
            id: conn.last_insert_rowid(),
            menu_item_id: new_feedback.menu_item_id,
            rating: new_feedback.rating,
            comment,
            feedback_date,
        })
    }

    /// All feedback submitted on or after `since`, in submission order
    pub fn fetch_recent_comments(&self, since: NaiveDate) -> Result<Vec<RatingComment>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {}, {} FROM {} WHERE {} >= ? ORDER BY {} ASC",
            feedback::MENU_ITEM_ID,
            feedback::RATING,
            feedback::COMMENT,
            feedback::TABLE,
            feedback::FEEDBACK_DATE,
            feedback::ID
        ))?;

        let rows = stmt.query_map(params![since], |row| {
            Ok(RatingComment {
                menu_item_id: row.get(feedback::MENU_ITEM_ID)?,
                rating: row.get(feedback::RATING)?,
                comment: row.get::<_, Option<String>>(feedback::COMMENT)?.unwrap_or_default(),
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Every feedback row for one menu item
    pub fn feedback_for_item(&self, menu_item_id: i64) -> Result<Vec<DbFeedback>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {} ASC",
            feedback::TABLE,
            feedback::MENU_ITEM_ID,
            feedback::ID
        ))?;

        let rows = stmt.query_map(params![menu_item_id], Self::map_db_feedback)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Average rating and feedback count per item over the last calendar month
    pub fn monthly_feedback_report(&self, today: NaiveDate) -> Result<Vec<FeedbackSummary>> {
        let since = today
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| SentimentError::Other(format!("Cannot subtract a month from {today}")))?;

        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {item}, AVG({rating}) AS average_rating, COUNT({id}) AS feedback_count \
             FROM {table} WHERE {date} >= ? GROUP BY {item} ORDER BY {item} ASC",
            item = feedback::MENU_ITEM_ID,
            rating = feedback::RATING,
            id = feedback::ID,
            table = feedback::TABLE,
            date = feedback::FEEDBACK_DATE
        ))?;

        let rows = stmt.query_map(params![since], |row| {
            Ok(FeedbackSummary {
                menu_item_id: row.get(0)?,
                average_rating: round_rating(row.get(1)?),
                feedback_count: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Stored sentiment for a menu item, if any
    pub fn get_sentiment(&self, menu_item_id: i64) -> Result<Option<SentimentRecord>> {
        let conn = self.get_connection()?;

        let record = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", sentiment::TABLE, sentiment::MENU_ITEM_ID),
                params![menu_item_id],
                Self::map_sentiment_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Insert a sentiment record; fails if the item already has one
    pub fn insert_sentiment(&self, record: &SentimentRecord) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                sentiment::TABLE,
                sentiment::MENU_ITEM_ID,
                sentiment::SENTIMENT,
                sentiment::AVERAGE_RATING,
                sentiment::SENTIMENT_SCORE,
                sentiment::POSITIVE_WORDS,
                sentiment::NEGATIVE_WORDS,
                sentiment::NEUTRAL_WORDS,
                sentiment::DATE_CALCULATED
            ),
            params![
                record.menu_item_id,
                record.sentiment.as_str(),
                round_rating(record.average_rating),
                record.score,
                record.positive_words,
                record.negative_words,
                record.neutral_words,
                record.date_calculated
            ],
        )?;
        Ok(())
    }

    /// Overwrite every field of an existing sentiment record
    pub fn update_sentiment(&self, record: &SentimentRecord) -> Result<()> {
        let conn = self.get_connection()?;
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ?, {} = ? WHERE {} = ?",
                sentiment::TABLE,
                sentiment::SENTIMENT,
                sentiment::AVERAGE_RATING,
                sentiment::SENTIMENT_SCORE,
                sentiment::POSITIVE_WORDS,
                sentiment::NEGATIVE_WORDS,
                sentiment::NEUTRAL_WORDS,
                sentiment::DATE_CALCULATED,
                sentiment::MENU_ITEM_ID
            ),
            params![
                record.sentiment.as_str(),
                round_rating(record.average_rating),
                record.score,
                record.positive_words,
                record.negative_words,
                record.neutral_words,
                record.date_calculated,
                record.menu_item_id
            ],
        )?;

        if changed == 0 {
            return Err(SentimentError::Other(format!(
                "No sentiment record to update for menu item {}",
                record.menu_item_id
            )));
        }
        Ok(())
    }

    /// Stored records, best first: label rank, then score, then average rating
    pub fn list_sentiments(&self, limit: Option<usize>) -> Result<Vec<SentimentRecord>> {
        let conn = self.get_connection()?;
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC, {} DESC, {} DESC, {} ASC LIMIT ?",
            sentiment::TABLE,
            label_rank_expr(),
            sentiment::SENTIMENT_SCORE,
            sentiment::AVERAGE_RATING,
            sentiment::MENU_ITEM_ID
        ))?;

        let rows = stmt.query_map(params![limit], Self::map_sentiment_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Map a database row to a `DbFeedback`
    fn map_db_feedback(row: &Row) -> rusqlite::Result<DbFeedback> {
        Ok(DbFeedback {
            id: row.get(feedback::ID)?,
            menu_item_id: row.get(feedback::MENU_ITEM_ID)?,
            rating: row.get(feedback::RATING)?,
            comment: row.get::<_, Option<String>>(feedback::COMMENT)?.unwrap_or_default(),
            feedback_date: row.get(feedback::FEEDBACK_DATE)?,
        })
    }

    /// Map a database row to a `SentimentRecord`
    fn map_sentiment_record(row: &Row) -> rusqlite::Result<SentimentRecord> {
        let label: String = row.get(sentiment::SENTIMENT)?;
        let sentiment = label.parse::<Sentiment>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(SentimentRecord {
            menu_item_id: row.get(sentiment::MENU_ITEM_ID)?,
            sentiment,
            score: row.get(sentiment::SENTIMENT_SCORE)?,
            average_rating: row.get(sentiment::AVERAGE_RATING)?,
            positive_words: row.get(sentiment::POSITIVE_WORDS)?,
            negative_words: row.get(sentiment::NEGATIVE_WORDS)?,
            neutral_words: row.get(sentiment::NEUTRAL_WORDS)?,
            date_calculated: row.get(sentiment::DATE_CALCULATED)?,
        })
    }
}

/// SQL `CASE` mapping the stored label to `Sentiment::rank`
fn label_rank_expr() -> String {
    let arms: String = Sentiment::ALL
        .iter()
        .map(|label| format!(" WHEN '{}' THEN {}", label.as_str(), label.rank()))
        .collect();
    format!("CASE {}{arms} ELSE {} END", sentiment::SENTIMENT, Sentiment::ALL.len())
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}
