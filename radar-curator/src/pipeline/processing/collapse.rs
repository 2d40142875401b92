use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use radar_core::domain::{CollapsedEvent, ScoredEvent, Window};

use crate::observability::metrics;

use super::normalize_key;

/// Key that decides which records describe the same logical show.
///
/// The key is the sole merge criterion: an identical id appearing under two
/// different keys stays two independent records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    artist: String,
    venue: String,
    window: Window,
}

impl GroupKey {
    fn for_event(event: &ScoredEvent) -> Self {
        Self {
            artist: normalize_key(event.event.artist_or_name()),
            venue: normalize_key(event.event.venue_name.as_deref().unwrap_or("")),
            window: event.event.window,
        }
    }
}

/// Merge records that share a non-empty id within the same window, keeping
/// the earliest-dated one and breaking date ties by highest score. Records
/// without an id pass through untouched; they cannot be deduplicated.
///
/// Keying includes the window so a boundary-date event fetched into both
/// windows stays present in both.
pub fn dedupe_by_id(events: Vec<ScoredEvent>) -> Vec<ScoredEvent> {
    let mut slots: Vec<Option<ScoredEvent>> = Vec::with_capacity(events.len());
    let mut index: HashMap<(Window, String), usize> = HashMap::new();

    for event in events {
        if event.event.id.is_empty() {
            slots.push(Some(event));
            continue;
        }
        let key = (event.event.window, event.event.id.clone());
        match index.get(&key) {
            None => {
                index.insert(key, slots.len());
                slots.push(Some(event));
            }
            Some(&i) => {
                metrics::dedupe::duplicate_merged();
                if let Some(incumbent) = &slots[i] {
                    if wins_merge(&event, incumbent) {
                        slots[i] = Some(event);
                    }
                }
            }
        }
    }

    slots.into_iter().flatten().collect()
}

/// Earliest date wins; a missing timestamp sorts as infinitely far in the
/// future; equal dates fall back to the higher score.
fn wins_merge(challenger: &ScoredEvent, incumbent: &ScoredEvent) -> bool {
    match (
        challenger.event.start_date_time,
        incumbent.event.start_date_time,
    ) {
        (Some(a), Some(b)) if a != b => a < b,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        _ => challenger.score > incumbent.score,
    }
}

/// Collapses scored records into one canonical row per logical show.
pub trait EventCollapser {
    fn collapse(&self, events: Vec<ScoredEvent>) -> Vec<CollapsedEvent>;
}

/// Default collapser: groups by (artist-or-name, venue, window), keeps the
/// earliest night as the representative, aggregates dates and inherits the
/// maximum member priority.
#[derive(Debug, Default)]
pub struct DefaultCollapser;

impl DefaultCollapser {
    pub fn new() -> Self {
        Self
    }
}

impl EventCollapser for DefaultCollapser {
    fn collapse(&self, events: Vec<ScoredEvent>) -> Vec<CollapsedEvent> {
        if events.is_empty() {
            return Vec::new();
        }
        metrics::collapse::batch_size(events.len());

        // Partition by grouping key, preserving first-seen order so the final
        // stable sort breaks ties by input order. Records without an id never
        // merge: run membership cannot be tracked without one.
        let mut groups: Vec<Vec<ScoredEvent>> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();

        for event in events {
            if event.event.id.is_empty() {
                groups.push(vec![event]);
                continue;
            }
            let key = GroupKey::for_event(&event);
            match index.get(&key) {
                Some(&i) => groups[i].push(event),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![event]);
                }
            }
        }

        let mut collapsed: Vec<CollapsedEvent> = groups.into_iter().map(collapse_group).collect();

        for group in &collapsed {
            metrics::collapse::group_created();
            if group.multi_night {
                metrics::collapse::multi_night_run();
                debug!(
                    artist = %group.representative.event.artist_or_name(),
                    nights = group.night_count,
                    "collapsed multi-night run"
                );
            }
        }

        collapsed.sort_by(|a, b| {
            b.priority
                .unwrap_or(0)
                .cmp(&a.priority.unwrap_or(0))
                .then_with(|| b.score().total_cmp(&a.score()))
        });

        collapsed
    }
}

fn collapse_group(mut members: Vec<ScoredEvent>) -> CollapsedEvent {
    // Missing timestamps sort last so they never become the representative
    // while any sibling carries a date. The sort is stable: equal dates keep
    // their input order.
    members.sort_by(|a, b| match (a.event.start_date_time, b.event.start_date_time) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let night_count = members.len();
    let priority = members.iter().filter_map(|m| m.priority).max();

    let dates: Vec<DateTime<Utc>> = members
        .iter()
        .filter_map(|m| m.event.start_date_time)
        .collect();
    let date_start = dates.iter().min().copied();
    let date_end = dates.iter().max().copied();

    // Alphabetical so the member list is stable regardless of fetch order.
    let mut member_ids: Vec<String> = members
        .iter()
        .map(|m| m.event.id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    member_ids.sort();

    let representative = members.remove(0);
    if member_ids.is_empty() {
        member_ids.push(representative.event.id.clone());
    }

    CollapsedEvent {
        representative,
        member_ids,
        date_start,
        date_end,
        night_count,
        multi_night: night_count > 1,
        priority,
    }
}
