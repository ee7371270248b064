use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names emitted by the scoring pipeline
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Completed pipeline runs, labelled by status
    pub pipeline_runs_total: &'static str,
    /// Pipeline run duration
    pub pipeline_duration: &'static str,
    /// Feedback rows read by the last run
    pub comments_fetched: &'static str,
    /// Stored items, labelled by insert/update
    pub items_scored_total: &'static str,
    /// Items that could not be stored
    pub item_failures_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            pipeline_runs_total: "cafeteria_pipeline_runs_total",
            pipeline_duration: "cafeteria_pipeline_duration_seconds",
            comments_fetched: "cafeteria_comments_fetched",
            items_scored_total: "cafeteria_items_scored_total",
            item_failures_total: "cafeteria_item_failures_total",
        }
    }
}

impl MetricsCollector {
    /// Install a no-op global recorder
    ///
    /// Fails if a recorder is already installed.
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record the end of a pipeline run
    pub fn record_pipeline_run(&self, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };
        counter!(self.pipeline_runs_total, "status" => status).increment(1);
        histogram!(self.pipeline_duration).record(duration.as_secs_f64());
    }

    /// Record how many feedback rows a run read
    pub fn record_comments_fetched(&self, count: usize) {
        gauge!(self.comments_fetched).set(count as f64);
    }

    /// Record a stored item
    pub fn record_item_scored(&self, action: &'static str) {
        counter!(self.items_scored_total, "action" => action).increment(1);
    }

    /// Record an item that could not be stored
    pub fn record_item_failure(&self) {
        counter!(self.item_failures_total).increment(1);
    }
}
