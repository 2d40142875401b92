use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::common::error::RadarError;

/// Planning horizon a fetched event belongs to.
///
/// Every event is assigned exactly one window upstream, and scoring, grouping
/// and ranking never cross window boundaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// Shows close enough to plan coverage for.
    ShortTerm,
    /// Freshly announced tours months out.
    FarOut,
}

impl Window {
    pub const ALL: [Window; 2] = [Window::ShortTerm, Window::FarOut];

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::ShortTerm => "short_term",
            Window::FarOut => "far_out",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Window {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "short_term" => Ok(Window::ShortTerm),
            "far_out" => Ok(Window::FarOut),
            other => Err(RadarError::UnknownWindow(other.to_string())),
        }
    }
}

/// One event record as handed over by the fetch/normalize collaborator.
///
/// Optional attributes are genuinely optional in the upstream data; absence is
/// expected and handled by neutral defaults during scoring, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Stable external identifier, unique per underlying ticketed instance.
    /// May be empty for degenerate source rows; such records cannot be
    /// deduplicated or tracked across runs.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Headliner when attraction metadata exists; upstream falls back to the
    /// event name otherwise.
    #[serde(default)]
    pub primary_artist: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Date-only display fallback when no full timestamp was provided.
    #[serde(default)]
    pub local_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub genre_primary: Option<String>,
    /// Secondary classification texts (sub-genre, segment, type labels).
    #[serde(default)]
    pub genre_tags: Vec<String>,
    #[serde(default)]
    pub promoter_name: Option<String>,
    pub window: Window,
}

impl NormalizedEvent {
    /// The artist string used for grouping: the primary artist when present,
    /// the event name otherwise.
    pub fn artist_or_name(&self) -> &str {
        if self.primary_artist.trim().is_empty() {
            &self.name
        } else {
            &self.primary_artist
        }
    }

    /// Parse a single record from the JSON shape the fetch collaborator emits.
    pub fn from_json(value: serde_json::Value) -> crate::common::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Accepts an RFC 3339 timestamp string, treating anything unparseable as
/// absent rather than failing the whole record.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(err) => {
            tracing::warn!(value = %s, %err, "unparseable start timestamp, treating as absent");
            None
        }
    }))
}

/// Sub-score breakdown retained for explainability and debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub venue_weight: f64,
    pub genre_fit: f64,
    pub editorial_fit: f64,
    pub promoter_weight: f64,
    pub date_bonus: f64,
}

/// Result of scoring one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Blended relevance score, clamped to [0, 1].
    pub score: f64,
    pub components: ScoreComponents,
}

/// A normalized event with its heuristic relevance score attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub event: NormalizedEvent,
    /// Blended relevance score, clamped to [0, 1].
    pub score: f64,
    #[serde(default)]
    pub components: ScoreComponents,
    /// Priority attached by the external re-ranking step, higher is hotter.
    #[serde(default)]
    pub priority: Option<i32>,
    /// Short editorial justification from the re-ranking step.
    #[serde(default)]
    pub priority_reason: Option<String>,
}

/// One logical show: a single night, or a multi-night run collapsed into its
/// earliest-dated representative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollapsedEvent {
    /// The earliest-dated member; its display fields stand for the run.
    pub representative: ScoredEvent,
    /// Ids of every underlying ticketed instance, sorted alphabetically so
    /// the list is stable regardless of fetch order.
    pub member_ids: Vec<String>,
    /// Earliest member timestamp; None when no member carries one.
    pub date_start: Option<DateTime<Utc>>,
    /// Latest member timestamp; None when no member carries one.
    pub date_end: Option<DateTime<Utc>>,
    pub night_count: usize,
    pub multi_night: bool,
    /// Maximum priority across members; a run inherits its hottest night.
    pub priority: Option<i32>,
}

impl CollapsedEvent {
    pub fn score(&self) -> f64 {
        self.representative.score
    }

    pub fn window(&self) -> Window {
        self.representative.event.window
    }

    /// Stable cross-run identity used for new-show detection: the sorted
    /// member ids joined with `|` for a run, the single id otherwise.
    pub fn change_key(&self) -> String {
        if self.multi_night {
            self.member_ids.join("|")
        } else {
            self.representative.event.id.clone()
        }
    }

    /// Deterministic fixed-width identifier derived from the change key.
    pub fn group_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, self.change_key().as_bytes())
    }
}
