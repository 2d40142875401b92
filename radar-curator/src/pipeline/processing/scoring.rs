use chrono::{DateTime, Utc};
use tracing::debug;

use radar_core::domain::{NormalizedEvent, ScoreComponents, ScoreResult, ScoredEvent, Window};

use crate::observability::metrics;
use crate::pipeline::curation_config::ScoringPolicy;

use super::normalize_key;

/// Assigns a relevance score in [0, 1] to one normalized event.
///
/// Implementations must be pure: identical input and `now` produce an
/// identical result, and missing fields degrade to neutral defaults instead
/// of failing.
pub trait RelevanceScorer {
    fn score(&self, event: &NormalizedEvent, now: DateTime<Utc>) -> ScoreResult;
}

/// Policy-driven scorer blending venue prestige, genre fit, promoter weight,
/// date proximity and an editorial-fit heuristic.
pub struct HeuristicScorer {
    policy: ScoringPolicy,
}

impl HeuristicScorer {
    /// Create a scorer with the default policy tables.
    pub fn new() -> Self {
        Self::with_policy(ScoringPolicy::default())
    }

    /// Create a scorer with a custom policy. Table needles are lower-cased
    /// once here so per-event matching stays allocation-free on that side.
    pub fn with_policy(policy: ScoringPolicy) -> Self {
        Self {
            policy: policy.normalized(),
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Prestige tier for a venue name, first matching needle wins.
    fn venue_weight(&self, venue_name: Option<&str>) -> f64 {
        let key = normalize_key(venue_name.unwrap_or(""));
        if key.is_empty() {
            return self.policy.default_venue_weight;
        }
        for tier in &self.policy.venue_tiers {
            if key.contains(&tier.keyword) {
                return tier.weight;
            }
        }
        self.policy.default_venue_weight
    }

    /// Genre fit across every classification text the event carries. The
    /// maximum matched weight wins: one strong signal must not be diluted by
    /// an ambiguous secondary tag.
    fn genre_fit(&self, event: &NormalizedEvent) -> f64 {
        let texts: Vec<String> = event
            .genre_primary
            .iter()
            .chain(event.genre_tags.iter())
            .map(|t| normalize_key(t))
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            return self.policy.neutral_genre_weight;
        }

        let mut best = self.policy.matched_genre_floor;
        for text in &texts {
            for hint in &self.policy.genre_hints {
                if text.contains(&hint.keyword) {
                    best = best.max(hint.weight);
                }
            }
        }
        best
    }

    /// Promoter weight from the curated table, or inferred from venue
    /// prestige when the promoter is unknown: top venues rarely host with
    /// unknown promoters.
    fn promoter_weight(&self, promoter_name: Option<&str>, venue_weight: f64) -> f64 {
        if let Some(name) = promoter_name {
            let key = normalize_key(name);
            if !key.is_empty() {
                for entry in &self.policy.promoter_weights {
                    if key.contains(&entry.keyword) {
                        return entry.weight;
                    }
                }
            }
        }
        let lift = (venue_weight - self.policy.default_venue_weight).max(0.0)
            * self.policy.promoter_venue_slope;
        (self.policy.promoter_floor + lift).min(self.policy.promoter_ceiling)
    }

    /// Date sub-score relative to the event's window: full inside the sweet
    /// spot, ramping up before it, decaying after it, zero past the horizon,
    /// strongly negative for past events.
    fn date_bonus(&self, start: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Window) -> f64 {
        let Some(start) = start else {
            return self.policy.missing_date_weight;
        };
        let wp = self.policy.window_policy(window);
        let delta_days = (start - now).num_days();

        if delta_days < 0 {
            return self.policy.past_event_penalty;
        }
        if delta_days < wp.sweet_spot_start_days {
            let span = wp.sweet_spot_start_days.max(1) as f64;
            return self.policy.ramp_floor
                + (1.0 - self.policy.ramp_floor) * (delta_days as f64 / span);
        }
        if delta_days <= wp.sweet_spot_end_days {
            return 1.0;
        }
        if delta_days <= wp.horizon_end_days {
            let span = (wp.horizon_end_days - wp.sweet_spot_end_days).max(1) as f64;
            let progress = (delta_days - wp.sweet_spot_end_days) as f64 / span;
            return 1.0 - (1.0 - self.policy.tail_floor) * progress;
        }
        0.0
    }

    /// Auxiliary holistic signal: a base plus bonuses for a marquee room, a
    /// strong genre, a core coverage city and festival-sounding names.
    fn editorial_fit(&self, event: &NormalizedEvent, venue_weight: f64, genre_fit: f64) -> f64 {
        let ed = &self.policy.editorial;
        let mut fit = ed.base;
        if venue_weight >= ed.venue_threshold {
            fit += ed.venue_bonus;
        }
        if genre_fit >= ed.genre_threshold {
            fit += ed.genre_bonus;
        }
        if let Some(city) = &event.city {
            let city = normalize_key(city);
            if self.policy.core_cities.iter().any(|c| *c == city) {
                fit += ed.city_bonus;
            }
        }
        let name = normalize_key(&event.name);
        if !name.is_empty()
            && self
                .policy
                .festival_keywords
                .iter()
                .any(|kw| name.contains(kw.as_str()))
        {
            fit += ed.festival_bonus;
        }
        fit.clamp(0.0, 1.0)
    }

    /// Score a batch, attaching the result to each record.
    pub fn score_batch(&self, events: Vec<NormalizedEvent>, now: DateTime<Utc>) -> Vec<ScoredEvent> {
        events
            .into_iter()
            .map(|event| {
                let result = self.score(&event, now);
                metrics::scoring::event_scored();
                metrics::scoring::score_recorded(result.score);
                debug!(event_id = %event.id, score = result.score, "scored event");
                ScoredEvent {
                    event,
                    score: result.score,
                    components: result.components,
                    priority: None,
                    priority_reason: None,
                }
            })
            .collect()
    }
}

impl RelevanceScorer for HeuristicScorer {
    fn score(&self, event: &NormalizedEvent, now: DateTime<Utc>) -> ScoreResult {
        let venue_weight = self.venue_weight(event.venue_name.as_deref());
        let genre_fit = self.genre_fit(event);
        let promoter_weight = self.promoter_weight(event.promoter_name.as_deref(), venue_weight);
        let date_bonus = self.date_bonus(event.start_date_time, now, event.window);
        let editorial_fit = self.editorial_fit(event, venue_weight, genre_fit);

        let b = &self.policy.blend;
        let score = (b.venue * venue_weight
            + b.genre * genre_fit
            + b.editorial * editorial_fit
            + b.promoter * promoter_weight
            + b.date * date_bonus)
            .clamp(0.0, 1.0);

        ScoreResult {
            score,
            components: ScoreComponents {
                venue_weight,
                genre_fit,
                editorial_fit,
                promoter_weight,
                date_bonus,
            },
        }
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}
