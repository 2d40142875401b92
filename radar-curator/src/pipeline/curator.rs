use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use radar_core::domain::{CollapsedEvent, NormalizedEvent, Window};

use crate::pipeline::curation_config::CurationConfig;
use crate::pipeline::processing::collapse::{dedupe_by_id, DefaultCollapser, EventCollapser};
use crate::pipeline::processing::rerank::{apply_selections, heuristic_top_k, RankSelection};
use crate::pipeline::processing::scoring::HeuristicScorer;

/// Runs the full per-window curation sequence: score, merge duplicate ids,
/// cap the candidate pool, apply the external ranking verdict, collapse
/// multi-night runs.
///
/// Each window is processed independently; nothing is shared across calls, so
/// invoking the curator concurrently for different windows is safe.
pub struct EventCurator {
    config: CurationConfig,
    scorer: HeuristicScorer,
    collapser: DefaultCollapser,
}

impl EventCurator {
    pub fn new() -> Self {
        Self::with_config(CurationConfig::default())
    }

    pub fn with_config(config: CurationConfig) -> Self {
        let scorer = HeuristicScorer::with_policy(config.scoring.clone());
        Self {
            config,
            scorer,
            collapser: DefaultCollapser::new(),
        }
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    /// Curate one window out of a mixed batch. `selections` is the external
    /// re-ranker's verdict for this window; pass an empty slice to fall back
    /// to the heuristic order.
    pub fn curate_window(
        &self,
        window: Window,
        events: &[NormalizedEvent],
        selections: &[RankSelection],
        now: DateTime<Utc>,
    ) -> Vec<CollapsedEvent> {
        let window_events: Vec<NormalizedEvent> = events
            .iter()
            .filter(|e| e.window == window)
            .cloned()
            .collect();
        let fetched = window_events.len();

        let scored = self.scorer.score_batch(window_events, now);
        let mut candidates = dedupe_by_id(scored);
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(self.config.candidate_pool);

        let ranked = if selections.is_empty() {
            heuristic_top_k(&candidates, self.config.top_k)
        } else {
            apply_selections(&candidates, selections, self.config.top_k)
        };

        let collapsed = self.collapser.collapse(ranked);
        info!(
            window = %window,
            fetched,
            candidates = candidates.len(),
            curated = collapsed.len(),
            "curated window"
        );
        collapsed
    }

    /// Curate every window over one mixed batch.
    pub fn curate(
        &self,
        events: &[NormalizedEvent],
        selections: &HashMap<Window, Vec<RankSelection>>,
        now: DateTime<Utc>,
    ) -> HashMap<Window, Vec<CollapsedEvent>> {
        Window::ALL
            .iter()
            .map(|&window| {
                let window_selections = selections
                    .get(&window)
                    .map(|s| s.as_slice())
                    .unwrap_or(&[]);
                (
                    window,
                    self.curate_window(window, events, window_selections, now),
                )
            })
            .collect()
    }
}

impl Default for EventCurator {
    fn default() -> Self {
        Self::new()
    }
}
