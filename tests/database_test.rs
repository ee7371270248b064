use chrono::NaiveDate;
use tempfile::TempDir;

use cafeteria_sentiment::db::Database;
use cafeteria_sentiment::models::{NewFeedback, SentimentRecord};
use cafeteria_sentiment::{Sentiment, SentimentError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn open_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_url = format!("sqlite://{}", temp_dir.path().join("data").join("test.db").display());
    let db = Database::new(&db_url).expect("Failed to create database");
    (temp_dir, db)
}

fn feedback(menu_item_id: i64, rating: i64, comment: &str, day: NaiveDate) -> NewFeedback {
    NewFeedback {
        menu_item_id,
        rating,
        comment: comment.to_string(),
        feedback_date: Some(day),
    }
}

fn record(menu_item_id: i64, sentiment: Sentiment, score: u8, average_rating: f64) -> SentimentRecord {
    SentimentRecord {
        menu_item_id,
        sentiment,
        score,
        average_rating,
        positive_words: "good, good".to_string(),
        negative_words: String::new(),
        neutral_words: "ok".to_string(),
        date_calculated: date(2024, 6, 10),
    }
}

#[test]
fn test_database_creation_and_initialization() {
    let (dir, db) = open_db();
    let _conn = db.get_connection().expect("Failed to get database connection");

    // Migrations are idempotent
    let url = format!("sqlite://{}", dir.path().join("data").join("test.db").display());
    Database::new(&url).expect("Failed to reopen database");
}

#[test]
fn test_non_sqlite_url_is_rejected() {
    let result = Database::new("postgres://localhost/menu");
    assert!(matches!(result, Err(SentimentError::InvalidConfig(_))));
}

#[test]
fn test_fetch_recent_comments_respects_window() {
    let (_dir, db) = open_db();
    db.add_feedback(feedback(1, 4, "old news", date(2024, 1, 5))).expect("insert");
    db.add_feedback(feedback(2, 5, "great", date(2024, 3, 10))).expect("insert");
    db.add_feedback(feedback(1, 2, "bad", date(2024, 6, 1))).expect("insert");

    let rows = db.fetch_recent_comments(date(2024, 3, 10)).expect("fetch");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].menu_item_id, 2);
    assert_eq!(rows[0].comment, "great");
    assert_eq!(rows[1].menu_item_id, 1);
    assert_eq!(rows[1].rating, 2);
}

#[test]
fn test_add_feedback_rejects_bad_rating() {
    let (_dir, db) = open_db();
    let result = db.add_feedback(feedback(1, 6, "wow", date(2024, 6, 1)));
    assert!(matches!(result, Err(SentimentError::InvalidInput(_))));
    assert!(db.feedback_for_item(1).expect("query").is_empty());
}

#[test]
fn test_add_feedback_trims_comment() {
    let (_dir, db) = open_db();
    let stored = db.add_feedback(feedback(3, 3, "  fine\u{7} ", date(2024, 6, 1))).expect("insert");
    assert_eq!(stored.comment, "fine");
    assert_eq!(db.feedback_for_item(3).expect("query")[0].comment, "fine");
}

#[test]
fn test_sentiment_insert_update_and_read() {
    let (_dir, db) = open_db();
    assert!(db.get_sentiment(5).expect("read").is_none());

    db.insert_sentiment(&record(5, Sentiment::Average, 40, 10.0 / 3.0)).expect("insert");
    let stored = db.get_sentiment(5).expect("read").expect("record exists");
    assert_eq!(stored.sentiment, Sentiment::Average);
    assert_eq!(stored.score, 40);
    assert!((stored.average_rating - 3.33).abs() < 1e-9);
    assert_eq!(stored.positive_words, "good, good");
    assert_eq!(stored.date_calculated, date(2024, 6, 10));

    db.update_sentiment(&record(5, Sentiment::HighlyRecommended, 100, 5.0)).expect("update");
    let updated = db.get_sentiment(5).expect("read").expect("record exists");
    assert_eq!(updated.sentiment, Sentiment::HighlyRecommended);
    assert_eq!(updated.score, 100);
}

#[test]
fn test_duplicate_insert_and_missing_update_fail() {
    let (_dir, db) = open_db();
    db.insert_sentiment(&record(1, Sentiment::Good, 60, 4.0)).expect("insert");

    assert!(db.insert_sentiment(&record(1, Sentiment::Good, 60, 4.0)).is_err());
    assert!(db.update_sentiment(&record(2, Sentiment::Good, 60, 4.0)).is_err());
}

#[test]
fn test_list_sentiments_orders_best_first() {
    let (_dir, db) = open_db();
    db.insert_sentiment(&record(1, Sentiment::Average, 40, 3.0)).expect("insert");
    db.insert_sentiment(&record(2, Sentiment::HighlyRecommended, 90, 4.5)).expect("insert");
    db.insert_sentiment(&record(3, Sentiment::Average, 40, 4.0)).expect("insert");

    let ids: Vec<i64> = db
        .list_sentiments(None)
        .expect("list")
        .iter()
        .map(|r| r.menu_item_id)
        .collect();
    assert_eq!(ids, vec![2, 3, 1]);

    assert_eq!(db.list_sentiments(Some(1)).expect("list").len(), 1);
}

#[test]
fn test_list_sentiments_ranks_label_before_score() {
    let (_dir, db) = open_db();
    db.insert_sentiment(&record(1, Sentiment::Avoid, 100, 1.0)).expect("insert");
    db.insert_sentiment(&record(2, Sentiment::Good, 60, 3.0)).expect("insert");
    db.insert_sentiment(&record(3, Sentiment::Neutral, 50, 4.0)).expect("insert");
    db.insert_sentiment(&record(4, Sentiment::Poor, 20, 2.5)).expect("insert");
    db.insert_sentiment(&record(5, Sentiment::HighlyRecommended, 80, 4.0)).expect("insert");

    let labels: Vec<Sentiment> = db
        .list_sentiments(None)
        .expect("list")
        .iter()
        .map(|r| r.sentiment)
        .collect();
    assert_eq!(labels, Sentiment::ALL.iter().copied().filter(|l| *l != Sentiment::Average).collect::<Vec<_>>());

    let top = db.list_sentiments(Some(1)).expect("list");
    assert_eq!(top[0].menu_item_id, 5);
}

#[test]
fn test_monthly_feedback_report() {
    let (_dir, db) = open_db();
    db.add_feedback(feedback(1, 5, "", date(2024, 6, 1))).expect("insert");
    db.add_feedback(feedback(1, 2, "", date(2024, 6, 5))).expect("insert");
    db.add_feedback(feedback(2, 4, "", date(2024, 4, 1))).expect("insert");

    let report = db.monthly_feedback_report(date(2024, 6, 10)).expect("report");

    assert_eq!(report.len(), 1);
    assert_eq!(report[0].menu_item_id, 1);
    assert_eq!(report[0].feedback_count, 2);
    assert!((report[0].average_rating - 3.5).abs() < 1e-9);
}
