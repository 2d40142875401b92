//! Metrics catalog for the curation pipeline.
//!
//! Names follow Prometheus conventions. Recording goes through the `metrics`
//! facade; the embedding application decides which exporter, if any, to
//! install.

use std::fmt;

/// Enum representing all metric names used by the pipeline.
/// This eliminates magic strings and provides compile-time safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Scoring metrics
    ScoringEventsScored,
    ScoringScore,

    // Duplicate-id merge metrics
    DedupeDuplicatesMerged,

    // Rerank application metrics
    RerankSelectionsApplied,
    RerankSelectionsDropped,
    RerankTopUps,

    // Collapse metrics
    CollapseBatchSize,
    CollapseGroupsCreated,
    CollapseMultiNightRuns,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ScoringEventsScored => "radar_scoring_events_scored_total",
            MetricName::ScoringScore => "radar_scoring_score",
            MetricName::DedupeDuplicatesMerged => "radar_dedupe_duplicates_merged_total",
            MetricName::RerankSelectionsApplied => "radar_rerank_selections_applied_total",
            MetricName::RerankSelectionsDropped => "radar_rerank_selections_dropped_total",
            MetricName::RerankTopUps => "radar_rerank_top_ups_total",
            MetricName::CollapseBatchSize => "radar_collapse_batch_size",
            MetricName::CollapseGroupsCreated => "radar_collapse_groups_created_total",
            MetricName::CollapseMultiNightRuns => "radar_collapse_multi_night_runs_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub mod scoring {
    use super::MetricName;

    /// Record that one event passed through the scorer
    pub fn event_scored() {
        ::metrics::counter!(MetricName::ScoringEventsScored.as_str()).increment(1);
    }

    /// Record the blended score for distribution tracking
    pub fn score_recorded(score: f64) {
        ::metrics::histogram!(MetricName::ScoringScore.as_str()).record(score);
    }
}

pub mod dedupe {
    use super::MetricName;

    /// Record that a duplicate-id record was merged away
    pub fn duplicate_merged() {
        ::metrics::counter!(MetricName::DedupeDuplicatesMerged.as_str()).increment(1);
    }
}

pub mod rerank {
    use super::MetricName;

    /// Record that an external selection was applied to an event
    pub fn selection_applied() {
        ::metrics::counter!(MetricName::RerankSelectionsApplied.as_str()).increment(1);
    }

    /// Record that an external selection dropped an event
    pub fn selection_dropped() {
        ::metrics::counter!(MetricName::RerankSelectionsDropped.as_str()).increment(1);
    }

    /// Record that an event was topped up from the heuristic order
    pub fn topped_up() {
        ::metrics::counter!(MetricName::RerankTopUps.as_str()).increment(1);
    }
}

pub mod collapse {
    use super::MetricName;

    /// Record the size of a collapse input batch
    pub fn batch_size(size: usize) {
        ::metrics::histogram!(MetricName::CollapseBatchSize.as_str()).record(size as f64);
    }

    /// Record that a collapsed group was produced
    pub fn group_created() {
        ::metrics::counter!(MetricName::CollapseGroupsCreated.as_str()).increment(1);
    }

    /// Record that a multi-night run was detected
    pub fn multi_night_run() {
        ::metrics::counter!(MetricName::CollapseMultiNightRuns.as_str()).increment(1);
    }
}
