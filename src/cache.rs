use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::pipeline::PipelineReport;

const LAST_RUN_KEY: &[u8] = b"last_run";
const EPOCH_KEY: &[u8] = b"epoch";

/// A completed pipeline run and when it finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRun {
    /// Computation epoch this run belongs to
    pub epoch: u64,
    /// When the run completed
    pub computed_at: DateTime<Utc>,
    /// The run's report
    pub report: PipelineReport,
}

/// Remembers the last successful run so reads within the TTL can skip a recompute
///
/// Invalidating bumps the epoch, which makes any cached run stale regardless
/// of its age.
pub struct RefreshCache {
    db: sled::Db,
    ttl: Duration,
}

impl RefreshCache {
    /// Open (or create) the cache directory at `path`
    pub fn open(path: &Path, ttl: Duration) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Ok(Self { db, ttl })
    }

    /// A cache that lives only as long as this value
    pub fn temporary(ttl: Duration) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db, ttl })
    }

    /// Current computation epoch
    pub fn epoch(&self) -> Result<u64> {
        Ok(match self.db.get(EPOCH_KEY)? {
            Some(data) => bincode::deserialize(&data)?,
            None => 0,
        })
    }

    /// The last recorded run, if any
    pub fn last_run(&self) -> Result<Option<CachedRun>> {
        match self.db.get(LAST_RUN_KEY)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// Store a completed run under the current epoch
    pub fn record_run(&self, report: &PipelineReport, now: DateTime<Utc>) -> Result<CachedRun> {
        let entry = CachedRun {
            epoch: self.epoch()?,
            computed_at: now,
            report: report.clone(),
        };

        self.db.insert(LAST_RUN_KEY, bincode::serialize(&entry)?)?;
        self.db.flush()?;
        Ok(entry)
    }

    /// Whether the last run is from the current epoch and younger than the TTL
    pub fn is_fresh(&self, now: DateTime<Utc>) -> Result<bool> {
        if self.ttl <= Duration::zero() {
            return Ok(false);
        }
        let Some(run) = self.last_run()? else {
            return Ok(false);
        };
        Ok(run.epoch == self.epoch()? && now - run.computed_at < self.ttl)
    }

    /// Start a new epoch so the next read recomputes
    pub fn invalidate(&self) -> Result<u64> {
        let next = self.epoch()? + 1;
        self.db.insert(EPOCH_KEY, bincode::serialize(&next)?)?;
        self.db.flush()?;
        Ok(next)
    }
}
