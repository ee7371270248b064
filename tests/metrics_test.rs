//! Tests for the pipeline metrics names and recorder hooks

use std::time::Duration;
use cafeteria_sentiment::metrics::MetricsCollector;

#[test]
fn test_metric_names_share_prefix() {
    let collector = MetricsCollector::default();
    for name in [
        collector.pipeline_runs_total,
        collector.pipeline_duration,
        collector.comments_fetched,
        collector.items_scored_total,
        collector.item_failures_total,
    ] {
        assert!(name.starts_with("cafeteria_"), "{name}");
    }
    assert!(collector.pipeline_runs_total.ends_with("_total"));
    assert!(collector.pipeline_duration.ends_with("_seconds"));
}

#[test]
fn test_metrics_initialization_once() {
    assert!(MetricsCollector::init().is_ok());
    // A second global recorder is refused
    assert!(MetricsCollector::init().is_err());
}

#[test]
fn test_recording_runs_and_items() {
    let collector = MetricsCollector::default();
    collector.record_pipeline_run(Duration::from_millis(120), true);
    collector.record_pipeline_run(Duration::from_millis(5), false);
    collector.record_comments_fetched(0);
    collector.record_comments_fetched(42);
    collector.record_item_scored("insert");
    collector.record_item_scored("update");
    collector.record_item_failure();
}
