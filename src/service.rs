use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::RefreshCache;
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::SentimentRecord;
use crate::nlp::CommentClassifier;
use crate::pipeline::{PipelineReport, ScoringPipeline};
use crate::repository::SentimentRepository;
use crate::sentiment::{Sentiment, SentimentAggregator};

/// How current the data behind a read is
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// A pipeline run completed just before the read
    Recomputed(PipelineReport),
    /// A cached run inside the TTL was reused
    Cached,
    /// The refresh failed; stored records may be out of date
    Stale(String),
}

impl Freshness {
    /// True unless the refresh failed
    #[must_use]
    pub const fn is_current(&self) -> bool {
        !matches!(self, Self::Stale(_))
    }
}

/// A stored record plus its display summary
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Stored sentiment for the item
    pub record: SentimentRecord,
    /// e.g. `Positive: tasty, Neutral: ok`
    pub evidence: String,
}

/// Items served by a read, with the freshness of the data
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    /// How current the data is
    pub freshness: Freshness,
    /// The items
    pub items: Vec<T>,
}

/// Read path for menu recommendations and discard decisions
///
/// Every read first refreshes sentiment records. A failed refresh never fails
/// the read: stored records are served and marked stale.
pub struct RecommendationService<R> {
    pipeline: ScoringPipeline<R>,
    cache: Option<RefreshCache>,
    discard_rating_threshold: f64,
    default_limit: usize,
}

impl<R: SentimentRepository> RecommendationService<R> {
    /// Wrap a pipeline; no cache, threshold 2.0, limit 10
    pub fn new(pipeline: ScoringPipeline<R>) -> Self {
        Self {
            pipeline,
            cache: None,
            discard_rating_threshold: 2.0,
            default_limit: 10,
        }
    }

    /// Build the whole stack from configuration
    pub fn from_config(repository: R, config: &AppConfig) -> anyhow::Result<Self> {
        let lexicon = Arc::new(config.sentiment.load_lexicon()?);
        let classifier = CommentClassifier::new(lexicon, config.sentiment.intensifier_mode()?)?;
        let pipeline = ScoringPipeline::new(repository, SentimentAggregator::new(classifier))
            .with_window_months(config.sentiment.window_months)
            .with_failure_policy(config.sentiment.failure_policy()?);

        let mut service = Self::new(pipeline)
            .with_discard_threshold(config.sentiment.discard_rating_threshold)
            .with_default_limit(config.sentiment.recommendation_limit);

        if config.cache.enabled {
            let ttl = chrono::Duration::seconds(i64::try_from(config.cache.ttl_secs).unwrap_or(i64::MAX));
            service = service.with_cache(RefreshCache::open(std::path::Path::new(&config.cache.path), ttl)?);
        }

        Ok(service)
    }

    /// Reuse runs inside the cache TTL
    #[must_use]
    pub fn with_cache(mut self, cache: RefreshCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Average rating below which an item is a discard candidate
    #[must_use]
    pub fn with_discard_threshold(mut self, threshold: f64) -> Self {
        self.discard_rating_threshold = threshold;
        self
    }

    /// Number of recommendations returned when no limit is given
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// The underlying pipeline
    pub const fn pipeline(&self) -> &ScoringPipeline<R> {
        &self.pipeline
    }

    /// Bring sentiment records up to date before a read
    pub async fn refresh(&self) -> Freshness {
        if let Some(cache) = &self.cache {
            match cache.is_fresh(Utc::now()) {
                Ok(true) => {
                    debug!("Reusing cached sentiment run");
                    return Freshness::Cached;
                },
                Ok(false) => {},
                Err(e) => warn!(error = %e, "Refresh cache unreadable, recomputing"),
            }
        }

        match self.pipeline.run().await {
            Ok(report) => {
                if !report.is_complete() {
                    // Not cached, so the next read retries the failed items
                    warn!(failed = report.failed(), "Some menu items kept stale sentiment");
                } else if let Some(cache) = &self.cache {
                    if let Err(e) = cache.record_run(&report, Utc::now()) {
                        warn!(error = %e, "Failed to cache sentiment run");
                    }
                }
                Freshness::Recomputed(report)
            },
            Err(e) => {
                warn!(error = %e, "Serving stale recommendation data");
                Freshness::Stale(e.to_string())
            },
        }
    }

    /// Forget the cached run, e.g. after new feedback arrives
    pub fn invalidate(&self) -> Result<()> {
        if let Some(cache) = &self.cache {
            cache.invalidate()?;
        }
        Ok(())
    }

    /// Top items by label rank, then score, then average rating
    pub async fn recommendations(&self, limit: Option<usize>) -> Result<Served<Recommendation>> {
        let freshness = self.refresh().await;
        let limit = limit.unwrap_or(self.default_limit);
        let records = self.pipeline.repository().list_sentiments(Some(limit)).await?;

        let items = records
            .into_iter()
            .map(|record| Recommendation {
                evidence: record.evidence_summary(),
                record,
            })
            .collect();

        Ok(Served { freshness, items })
    }

    /// Items rated below the threshold or labelled `Avoid`
    pub async fn discard_candidates(&self) -> Result<Served<SentimentRecord>> {
        let freshness = self.refresh().await;
        let threshold = self.discard_rating_threshold;
        let items = self
            .pipeline
            .repository()
            .list_sentiments(None)
            .await?
            .into_iter()
            .filter(|r| r.average_rating < threshold || r.sentiment == Sentiment::Avoid)
            .collect();

        Ok(Served { freshness, items })
    }
}
