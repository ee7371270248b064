//! Scoring pipeline: recent feedback in, one sentiment record per menu item out.
//!
//! A run fetches every comment in the trailing window, groups them by menu
//! item in first-seen order, aggregates each group and upserts the result.
//! Items without feedback in the window are left untouched.

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::error::{Result, SentimentError};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{RatingComment, SentimentRecord};
use crate::repository::SentimentRepository;
use crate::sentiment::SentimentAggregator;

/// Default trailing window, in calendar months
pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

/// What to do when storing one item fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run on the first failed item
    #[default]
    FailFast,
    /// Record the failure and keep going
    ContinueOnError,
}

impl FromStr for FailurePolicy {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "continue" | "continue_on_error" => Ok(Self::ContinueOnError),
            other => Err(SentimentError::InvalidConfig(format!(
                "Invalid failure policy: {other}. Must be one of: fail_fast, continue"
            ))),
        }
    }
}

/// Comments and ratings for one menu item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentGroup {
    /// Menu item
    pub menu_item_id: i64,
    /// Comments in fetch order
    pub comments: Vec<String>,
    /// Ratings in fetch order
    pub ratings: Vec<i64>,
}

impl CommentGroup {
    /// Arithmetic mean of the ratings, 0 when there are none
    #[must_use]
    pub fn average_rating(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let total: i64 = self.ratings.iter().sum();
        total as f64 / self.ratings.len() as f64
    }
}

/// Group rows by menu item, keeping the order in which items first appear
#[must_use]
pub fn group_by_menu_item(rows: &[RatingComment]) -> Vec<CommentGroup> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<CommentGroup> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.menu_item_id).or_insert_with(|| {
            groups.push(CommentGroup {
                menu_item_id: row.menu_item_id,
                ..CommentGroup::default()
            });
            groups.len() - 1
        });
        groups[slot].comments.push(row.comment.clone());
        groups[slot].ratings.push(row.rating);
    }

    groups
}

/// Start of the trailing window ending at `today` (inclusive lower bound)
///
/// Calendar months are subtracted from the month only. A day past the end of
/// the target month rolls into the next one, so May 31 minus three months is
/// March 2 in a leap year.
pub fn window_start(today: NaiveDate, months: u32) -> Result<NaiveDate> {
    today
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(months)))
        .and_then(|first| first.checked_add_days(Days::new(u64::from(today.day0()))))
        .ok_or_else(|| SentimentError::Other(format!("Cannot subtract {months} months from {today}")))
}

/// How one menu item fared in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    /// A new record was created
    Inserted,
    /// The existing record was overwritten
    Updated,
    /// Storing the record failed
    Failed(String),
}

/// Result for a single menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Menu item
    pub menu_item_id: i64,
    /// Computed record (present even when storing failed)
    pub record: SentimentRecord,
    /// Storage outcome
    pub status: ItemStatus,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Day the run was computed for
    pub run_date: NaiveDate,
    /// Inclusive lower bound of the window
    pub since: NaiveDate,
    /// Feedback rows read
    pub comments_fetched: usize,
    /// One entry per menu item, in processing order
    pub outcomes: Vec<ItemOutcome>,
}

impl PipelineReport {
    /// Items whose record was stored
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, ItemStatus::Failed(_)))
            .count()
    }

    /// Items whose record could not be stored
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when every item was stored
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

/// Recomputes sentiment records from recent feedback
pub struct ScoringPipeline<R> {
    repository: R,
    aggregator: SentimentAggregator,
    window_months: u32,
    policy: FailurePolicy,
    metrics: MetricsCollector,
}

impl<R: SentimentRepository> ScoringPipeline<R> {
    /// Create a pipeline with the default window and fail-fast policy
    pub fn new(repository: R, aggregator: SentimentAggregator) -> Self {
        Self {
            repository,
            aggregator,
            window_months: DEFAULT_WINDOW_MONTHS,
            policy: FailurePolicy::default(),
            metrics: MetricsCollector::default(),
        }
    }

    /// Use a different trailing window
    #[must_use]
    pub fn with_window_months(mut self, months: u32) -> Self {
        self.window_months = months;
        self
    }

    /// Use a different failure policy
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The repository the pipeline reads from and writes to
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Recompute every item with feedback in the window ending today
    pub async fn run(&self) -> Result<PipelineReport> {
        self.run_as_of(Local::now().date_naive()).await
    }

    /// Recompute every item with feedback in the window ending at `today`
    pub async fn run_as_of(&self, today: NaiveDate) -> Result<PipelineReport> {
        let timer = OperationTimer::new("sentiment_pipeline");
        let started = Instant::now();

        let result = self.execute(today).await;
        let complete = result.as_ref().is_ok_and(PipelineReport::is_complete);
        self.metrics.record_pipeline_run(started.elapsed(), complete);
        timer.finish();

        match &result {
            Ok(report) => info!(
                since = %report.since,
                comments = report.comments_fetched,
                items = report.outcomes.len(),
                failed = report.failed(),
                "Sentiment scores updated"
            ),
            Err(e) => error!(error = %e, "Error updating sentiment scores"),
        }

        result
    }

    async fn execute(&self, today: NaiveDate) -> Result<PipelineReport> {
        let since = window_start(today, self.window_months)?;
        let rows = self.repository.fetch_recent_comments(since).await?;
        self.metrics.record_comments_fetched(rows.len());
        debug!(%since, rows = rows.len(), "Fetched recent comments");

        let groups = group_by_menu_item(&rows);
        let mut outcomes = Vec::with_capacity(groups.len());

        for group in groups {
            let aggregate = self.aggregator.aggregate(&group.comments);
            let record = SentimentRecord::from_aggregate(
                group.menu_item_id,
                &aggregate,
                group.average_rating(),
                today,
            );
            debug!(
                menu_item_id = group.menu_item_id,
                sentiment = %record.sentiment,
                score = record.score,
                average_rating = record.average_rating,
                "Scored menu item"
            );

            let status = match self.upsert(&record).await {
                Ok(status) => status,
                Err(e) => {
                    self.metrics.record_item_failure();
                    error!(menu_item_id = group.menu_item_id, error = %e, "Failed to store sentiment");
                    if self.policy == FailurePolicy::FailFast {
                        return Err(SentimentError::ItemFailed {
                            menu_item_id: group.menu_item_id,
                            message: e.to_string(),
                        });
                    }
                    ItemStatus::Failed(e.to_string())
                },
            };

            outcomes.push(ItemOutcome {
                menu_item_id: group.menu_item_id,
                record,
                status,
            });
        }

        Ok(PipelineReport {
            run_date: today,
            since,
            comments_fetched: rows.len(),
            outcomes,
        })
    }

    async fn upsert(&self, record: &SentimentRecord) -> Result<ItemStatus> {
        let existing = self.repository.get_existing_sentiment(record.menu_item_id).await?;
        if existing.is_some() {
            self.repository.update_sentiment(record).await?;
            self.metrics.record_item_scored("update");
            Ok(ItemStatus::Updated)
        } else {
            self.repository.insert_sentiment(record).await?;
            self.metrics.record_item_scored("insert");
            Ok(ItemStatus::Inserted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::nlp::{CommentClassifier, IntensifierMode};
    use crate::repository::MockSentimentRepository;
    use crate::sentiment::Sentiment;
    use mockall::predicate::eq;
    use std::sync::Arc;

    fn aggregator() -> SentimentAggregator {
        let classifier = CommentClassifier::new(Arc::new(Lexicon::default()), IntensifierMode::Add)
            .expect("Failed to create classifier");
        SentimentAggregator::new(classifier)
    }

    fn row(menu_item_id: i64, rating: i64, comment: &str) -> RatingComment {
        RatingComment {
            menu_item_id,
            rating,
            comment: comment.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_group_by_menu_item_keeps_first_seen_order() {
        let rows = vec![row(7, 4, "good"), row(2, 1, "bad"), row(7, 2, "ok")];
        let groups = group_by_menu_item(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].menu_item_id, 7);
        assert_eq!(groups[0].comments, vec!["good", "ok"]);
        assert_eq!(groups[0].ratings, vec![4, 2]);
        assert_eq!(groups[1].menu_item_id, 2);
    }

    #[test]
    fn test_average_rating() {
        let group = CommentGroup {
            menu_item_id: 1,
            comments: vec![],
            ratings: vec![5, 2, 3],
        };
        assert!((group.average_rating() - 10.0 / 3.0).abs() < 1e-9);
        assert!(CommentGroup::default().average_rating().abs() < f64::EPSILON);
    }

    #[test]
    fn test_window_start_uses_calendar_months() {
        assert_eq!(window_start(date(2024, 6, 15), 3).ok(), Some(date(2024, 3, 15)));
        assert_eq!(window_start(date(2024, 1, 10), 3).ok(), Some(date(2023, 10, 10)));
    }

    #[test]
    fn test_window_start_rolls_over_short_months() {
        assert_eq!(window_start(date(2024, 5, 31), 3).ok(), Some(date(2024, 3, 2)));
        assert_eq!(window_start(date(2023, 5, 31), 3).ok(), Some(date(2023, 3, 3)));
        assert_eq!(window_start(date(2024, 7, 31), 1).ok(), Some(date(2024, 7, 1)));
        assert_eq!(window_start(date(2024, 3, 30), 1).ok(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("continue".parse::<FailurePolicy>().ok(), Some(FailurePolicy::ContinueOnError));
        assert_eq!("FAIL_FAST".parse::<FailurePolicy>().ok(), Some(FailurePolicy::FailFast));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[tokio::test]
    async fn test_inserts_new_and_updates_existing() {
        let mut repo = MockSentimentRepository::new();
        repo.expect_fetch_recent_comments()
            .with(eq(date(2024, 3, 10)))
            .returning(|_| Ok(vec![row(1, 5, "very good"), row(2, 1, "awful")]));
        repo.expect_get_existing_sentiment().with(eq(1)).returning(|_| Ok(None));
        repo.expect_get_existing_sentiment().with(eq(2)).returning(|id| {
            Ok(Some(SentimentRecord {
                menu_item_id: id,
                sentiment: Sentiment::Good,
                score: 60,
                average_rating: 4.0,
                positive_words: String::new(),
                negative_words: String::new(),
                neutral_words: String::new(),
                date_calculated: date(2024, 1, 1),
            }))
        });
        repo.expect_insert_sentiment()
            .withf(|r| r.menu_item_id == 1 && r.sentiment == Sentiment::HighlyRecommended)
            .times(1)
            .returning(|_| Ok(()));
        repo.expect_update_sentiment()
            .withf(|r| r.menu_item_id == 2 && r.sentiment == Sentiment::Avoid && r.score == 100)
            .times(1)
            .returning(|_| Ok(()));

        let report = ScoringPipeline::new(repo, aggregator())
            .run_as_of(date(2024, 6, 10))
            .await
            .expect("run should succeed");

        assert_eq!(report.comments_fetched, 2);
        assert_eq!(report.outcomes[0].status, ItemStatus::Inserted);
        assert_eq!(report.outcomes[1].status, ItemStatus::Updated);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_without_writes() {
        let mut repo = MockSentimentRepository::new();
        repo.expect_fetch_recent_comments()
            .returning(|_| Err(SentimentError::Fetch("store offline".to_string())));
        repo.expect_insert_sentiment().never();
        repo.expect_update_sentiment().never();

        let result = ScoringPipeline::new(repo, aggregator())
            .with_failure_policy(FailurePolicy::ContinueOnError)
            .run_as_of(date(2024, 6, 10))
            .await;

        assert!(matches!(result, Err(SentimentError::Fetch(_))));
    }

    fn failing_repo() -> MockSentimentRepository {
        let mut repo = MockSentimentRepository::new();
        repo.expect_fetch_recent_comments()
            .returning(|_| Ok(vec![row(1, 3, "bad"), row(2, 4, "tasty"), row(3, 5, "great")]));
        repo.expect_get_existing_sentiment().returning(|_| Ok(None));
        repo.expect_insert_sentiment()
            .withf(|r| r.menu_item_id == 1)
            .returning(|_| Err(SentimentError::Other("disk full".to_string())));
        repo.expect_insert_sentiment().returning(|_| Ok(()));
        repo
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let result = ScoringPipeline::new(failing_repo(), aggregator())
            .run_as_of(date(2024, 6, 10))
            .await;

        match result {
            Err(SentimentError::ItemFailed { menu_item_id, .. }) => assert_eq!(menu_item_id, 1),
            other => panic!("expected ItemFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_continue_on_error_reports_failures() {
        let report = ScoringPipeline::new(failing_repo(), aggregator())
            .with_failure_policy(FailurePolicy::ContinueOnError)
            .run_as_of(date(2024, 6, 10))
            .await
            .expect("run should complete");

        assert_eq!(report.outcomes.len(), 3);
        assert!(matches!(report.outcomes[0].status, ItemStatus::Failed(_)));
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_complete());
    }
}
