use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use radar_core::common::error::Result;
use radar_core::domain::ScoredEvent;

use crate::observability::metrics;

/// One verdict row from the external re-ranking collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankSelection {
    pub id: String,
    /// Absent means keep; the re-ranker may drop events outright.
    #[serde(default = "default_keep")]
    pub keep: bool,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_keep() -> bool {
    true
}

impl RankSelection {
    /// Parse the JSON array the re-ranking collaborator emits.
    pub fn parse_batch(raw: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Apply an external re-ranker's verdict to a scored candidate list.
///
/// Selections referencing unknown ids are ignored; repeated ids count once;
/// `keep == false` drops the event. When fewer than `top_k` events survive,
/// the list is topped up with heuristic-ordered leftovers. The result is
/// sorted by (priority desc, score desc) and capped at `top_k`.
pub fn apply_selections(
    events: &[ScoredEvent],
    selections: &[RankSelection],
    top_k: usize,
) -> Vec<ScoredEvent> {
    if events.is_empty() || top_k == 0 {
        return Vec::new();
    }
    if selections.is_empty() {
        return heuristic_top_k(events, top_k);
    }

    let mut by_id: HashMap<&str, &ScoredEvent> = HashMap::new();
    for event in events {
        if !event.event.id.is_empty() {
            by_id.entry(event.event.id.as_str()).or_insert(event);
        }
    }

    let mut chosen: Vec<ScoredEvent> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for selection in selections {
        if selection.id.is_empty() || seen.contains(selection.id.as_str()) {
            continue;
        }
        if !selection.keep {
            // A dropped id stays dropped; the top-up below must not revive it.
            seen.insert(selection.id.as_str());
            metrics::rerank::selection_dropped();
            continue;
        }
        let Some(source) = by_id.get(selection.id.as_str()) else {
            continue;
        };
        seen.insert(selection.id.as_str());

        let mut event = (*source).clone();
        event.priority = selection.priority;
        event.priority_reason = selection.reason.clone();
        chosen.push(event);
        metrics::rerank::selection_applied();

        if chosen.len() >= top_k {
            break;
        }
    }

    // Too few survivors: fill from the heuristic order.
    if chosen.len() < top_k {
        for event in events {
            let id = event.event.id.as_str();
            if id.is_empty() || seen.contains(id) {
                continue;
            }
            seen.insert(id);
            chosen.push(event.clone());
            metrics::rerank::topped_up();
            if chosen.len() >= top_k {
                break;
            }
        }
    }

    chosen.sort_by(|a, b| {
        b.priority
            .unwrap_or(0)
            .cmp(&a.priority.unwrap_or(0))
            .then_with(|| b.score.total_cmp(&a.score))
    });
    chosen.truncate(top_k);
    chosen
}

/// Fallback when no external verdict is available: heuristic order, capped.
pub fn heuristic_top_k(events: &[ScoredEvent], top_k: usize) -> Vec<ScoredEvent> {
    let mut out = events.to_vec();
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out.truncate(top_k);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::domain::{NormalizedEvent, ScoreComponents, Window};

    fn scored(id: &str, score: f64) -> ScoredEvent {
        ScoredEvent {
            event: NormalizedEvent {
                id: id.to_string(),
                name: format!("Show {}", id),
                primary_artist: format!("Artist {}", id),
                url: None,
                venue_name: Some("The Chapel".to_string()),
                city: None,
                state: None,
                country: None,
                local_date: None,
                start_date_time: None,
                genre_primary: None,
                genre_tags: Vec::new(),
                promoter_name: None,
                window: Window::ShortTerm,
            },
            score,
            components: ScoreComponents::default(),
            priority: None,
            priority_reason: None,
        }
    }

    fn selection(id: &str, keep: bool, priority: Option<i32>) -> RankSelection {
        RankSelection {
            id: id.to_string(),
            keep,
            priority,
            reason: priority.map(|p| format!("priority {}", p)),
        }
    }

    #[test]
    fn test_attaches_priority_and_reason() {
        let events = vec![scored("a", 0.9), scored("b", 0.8)];
        let picked = apply_selections(&events, &[selection("b", true, Some(9))], 2);
        assert_eq!(picked[0].event.id, "b");
        assert_eq!(picked[0].priority, Some(9));
        assert_eq!(picked[0].priority_reason.as_deref(), Some("priority 9"));
        // "a" was topped up without a priority.
        assert_eq!(picked[1].event.id, "a");
        assert_eq!(picked[1].priority, None);
    }

    #[test]
    fn test_keep_false_drops_and_stays_dropped() {
        let events = vec![scored("a", 0.9), scored("b", 0.8), scored("c", 0.7)];
        let picked = apply_selections(&events, &[selection("a", false, None)], 3);
        let ids: Vec<&str> = picked.iter().map(|e| e.event.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_and_duplicate_selections_ignored() {
        let events = vec![scored("a", 0.9)];
        let picked = apply_selections(
            &events,
            &[
                selection("ghost", true, Some(10)),
                selection("a", true, Some(7)),
                selection("a", true, Some(2)),
            ],
            5,
        );
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].priority, Some(7));
    }

    #[test]
    fn test_sorted_by_priority_then_score() {
        let events = vec![scored("a", 0.5), scored("b", 0.9), scored("c", 0.7)];
        let picked = apply_selections(
            &events,
            &[selection("a", true, Some(3)), selection("c", true, Some(8))],
            3,
        );
        let ids: Vec<&str> = picked.iter().map(|e| e.event.id.as_str()).collect();
        // c has the top priority, a beats the priority-less top-up b.
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let events = vec![scored("a", 0.9), scored("b", 0.8), scored("c", 0.7)];
        let picked = apply_selections(&events, &[selection("c", true, Some(9))], 2);
        assert_eq!(picked.len(), 2);
        let ids: Vec<&str> = picked.iter().map(|e| e.event.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_empty_selections_fall_back_to_heuristic() {
        let events = vec![scored("a", 0.3), scored("b", 0.9)];
        let picked = apply_selections(&events, &[], 1);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].event.id, "b");
    }

    #[test]
    fn test_empty_batch_returns_empty() {
        assert!(apply_selections(&[], &[selection("a", true, None)], 5).is_empty());
        assert!(heuristic_top_k(&[], 5).is_empty());
    }

    #[test]
    fn test_parse_batch() {
        let raw = r#"[
            {"id": "a", "keep": true, "priority": 8, "reason": "hot ticket"},
            {"id": "b", "keep": false},
            {"id": "c"}
        ]"#;
        let selections = RankSelection::parse_batch(raw).unwrap();
        assert_eq!(selections.len(), 3);
        assert_eq!(selections[0].priority, Some(8));
        assert!(!selections[1].keep);
        assert!(selections[2].keep);
        assert_eq!(selections[2].priority, None);

        assert!(RankSelection::parse_batch("not json").is_err());
    }
}
