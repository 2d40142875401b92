use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use radar_core::common::error::{RadarError, Result};
use radar_core::domain::Window;

/// One entry of a curated lookup table: a lowercase needle matched by
/// substring against a normalized event field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub keyword: String,
    pub weight: f64,
}

fn kw(keyword: &str, weight: f64) -> KeywordWeight {
    KeywordWeight {
        keyword: keyword.to_string(),
        weight,
    }
}

/// Blend coefficients for the final score. Tunable policy, not a contract;
/// they must be non-negative and should sum to roughly 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub venue: f64,
    pub genre: f64,
    pub editorial: f64,
    pub promoter: f64,
    pub date: f64,
}

impl BlendWeights {
    pub fn sum(&self) -> f64 {
        self.venue + self.genre + self.editorial + self.promoter + self.date
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            venue: 0.30,
            genre: 0.20,
            editorial: 0.20,
            promoter: 0.15,
            date: 0.15,
        }
    }
}

/// Weights for the auxiliary editorial-fit blend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorialWeights {
    pub base: f64,
    /// Bonus when the venue weight reaches `venue_threshold`.
    pub venue_bonus: f64,
    pub venue_threshold: f64,
    /// Bonus when the genre fit reaches `genre_threshold`.
    pub genre_bonus: f64,
    pub genre_threshold: f64,
    /// Bonus for events in one of the core coverage cities.
    pub city_bonus: f64,
    /// Bonus when the event name reads like a festival or special run.
    pub festival_bonus: f64,
}

impl Default for EditorialWeights {
    fn default() -> Self {
        Self {
            base: 0.40,
            venue_bonus: 0.20,
            venue_threshold: 0.90,
            genre_bonus: 0.15,
            genre_threshold: 0.85,
            city_bonus: 0.15,
            festival_bonus: 0.10,
        }
    }
}

/// Day-range policy for one planning window.
///
/// The sweet spot is the stretch of days-until-event that earns the full date
/// bonus; the bonus ramps up before it and decays after it, reaching zero
/// past the horizon edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowPolicy {
    pub window: Window,
    /// Days from now to the window's near edge.
    pub horizon_start_days: i64,
    /// Days from now to the window's far edge.
    pub horizon_end_days: i64,
    pub sweet_spot_start_days: i64,
    pub sweet_spot_end_days: i64,
}

impl WindowPolicy {
    /// Built-in policy for a window, used when a config file omits it.
    pub fn default_for(window: Window) -> Self {
        match window {
            // Long enough out to plan coverage, soon enough to be actionable.
            Window::ShortTerm => Self {
                window,
                horizon_start_days: 14,
                horizon_end_days: 120,
                sweet_spot_start_days: 30,
                sweet_spot_end_days: 90,
            },
            // Freshly announced tours just past the window's near edge.
            Window::FarOut => Self {
                window,
                horizon_start_days: 120,
                horizon_end_days: 365,
                sweet_spot_start_days: 120,
                sweet_spot_end_days: 180,
            },
        }
    }
}

// Rough tiers for common Bay Area venues. Ordered: the first matching needle
// wins, so more specific names come before their prefixes.
static DEFAULT_VENUE_TIERS: Lazy<Vec<KeywordWeight>> = Lazy::new(|| {
    vec![
        // Arenas / stadiums
        kw("chase center", 1.00),
        kw("oakland arena", 0.98),
        kw("sap center", 0.97),
        kw("levi's stadium", 0.97),
        kw("levis stadium", 0.97),
        // Large amphitheaters / outdoor
        kw("shoreline amphitheatre", 0.96),
        kw("greek theatre", 0.96),
        kw("frost amphitheater", 0.94),
        kw("mountain winery", 0.93),
        kw("concord pavilion", 0.93),
        kw("toyota pavilion at concord", 0.93),
        // Large theaters / civic
        kw("bill graham civic auditorium", 0.94),
        kw("san jose civic", 0.92),
        kw("san jose center for the performing arts", 0.91),
        kw("paramount theatre oakland", 0.91),
        kw("palace of fine arts", 0.90),
        kw("davies symphony hall", 0.90),
        kw("war memorial opera house", 0.90),
        // Marquee clubs
        kw("the fillmore", 0.93),
        kw("warfield", 0.93),
        kw("fox theater", 0.93),
        kw("fox theatre", 0.93),
        kw("the masonic", 0.92),
        kw("regency ballroom", 0.91),
        kw("uc theatre", 0.89),
        kw("great american music hall", 0.89),
        kw("gamh", 0.89),
        kw("august hall", 0.88),
        kw("bimbo's 365 club", 0.88),
        kw("bimbos 365 club", 0.88),
        kw("bimbo's", 0.88),
        // Strong clubs
        kw("the independent", 0.88),
        kw("independent", 0.88),
        kw("the chapel", 0.85),
        kw("new parish", 0.84),
        kw("sweetwater", 0.84),
        kw("cornerstone", 0.83),
        // High-cred but small
        kw("bottom of the hill", 0.82),
        // Intimate / small music rooms
        kw("rickshaw stop", 0.82),
        kw("cafe du nord", 0.81),
        kw("brick & mortar music hall", 0.80),
        kw("brick and mortar music hall", 0.80),
        kw("neck of the woods", 0.79),
        kw("the lost church", 0.79),
        kw("boom boom room", 0.78),
        kw("music city san francisco", 0.78),
        kw("make-out room", 0.77),
        // Napa / North Bay
        kw("uptown theatre napa", 0.86),
        kw("blue note napa", 0.84),
    ]
});

static DEFAULT_GENRE_HINTS: Lazy<Vec<KeywordWeight>> = Lazy::new(|| {
    vec![
        kw("pop", 1.0),
        kw("rock", 1.0),
        kw("indie", 1.0),
        kw("alternative", 1.0),
        kw("alt", 1.0),
        kw("hip hop", 0.9),
        kw("hip-hop", 0.9),
        kw("rap", 0.9),
        kw("electronic", 0.85),
        kw("edm", 0.85),
        kw("reggae", 0.85),
        kw("country", 0.80),
        kw("latin", 0.80),
        kw("metal", 0.75),
        // De-prioritize non-music
        kw("theatre", 0.4),
        kw("comedy", 0.3),
        kw("sports", 0.2),
    ]
});

// National promoters whose bookings are almost always worth a look.
static DEFAULT_PROMOTER_WEIGHTS: Lazy<Vec<KeywordWeight>> = Lazy::new(|| {
    vec![
        kw("live nation", 0.95),
        kw("aeg presents", 0.93),
        kw("aeg", 0.92),
        kw("goldenvoice", 0.92),
        kw("another planet", 0.90),
        kw("noise pop", 0.88),
    ]
});

static DEFAULT_CORE_CITIES: Lazy<Vec<String>> = Lazy::new(|| {
    ["san francisco", "oakland", "berkeley", "san jose"]
        .iter()
        .map(|c| c.to_string())
        .collect()
});

static DEFAULT_FESTIVAL_KEYWORDS: Lazy<Vec<String>> = Lazy::new(|| {
    ["fest", "festival", "block party", "residency", "farewell"]
        .iter()
        .map(|c| c.to_string())
        .collect()
});

/// The full scoring policy: curated tables plus blend constants.
///
/// All values are tunable; the defaults below are the documented baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Weight for venues missing from the tier table. A neutral midpoint:
    /// absence of data is not punished as harshly as a known-small room.
    pub default_venue_weight: f64,
    pub venue_tiers: Vec<KeywordWeight>,
    /// Genre fit when the event carries no classification text at all.
    pub neutral_genre_weight: f64,
    /// Genre fit floor when classification text exists but nothing matches.
    pub matched_genre_floor: f64,
    pub genre_hints: Vec<KeywordWeight>,
    pub promoter_weights: Vec<KeywordWeight>,
    /// Inferred promoter weight at an unknown venue.
    pub promoter_floor: f64,
    /// Cap on the venue-inferred promoter weight.
    pub promoter_ceiling: f64,
    /// How strongly venue prestige above the default lifts an unknown
    /// promoter toward the ceiling.
    pub promoter_venue_slope: f64,
    pub core_cities: Vec<String>,
    pub festival_keywords: Vec<String>,
    /// Date sub-score for events already in the past.
    pub past_event_penalty: f64,
    /// Date sub-score when no timestamp is available.
    pub missing_date_weight: f64,
    /// Date sub-score at day zero of the pre-sweet-spot ramp.
    pub ramp_floor: f64,
    /// Date sub-score at the horizon edge after the sweet spot.
    pub tail_floor: f64,
    pub blend: BlendWeights,
    pub editorial: EditorialWeights,
    pub windows: Vec<WindowPolicy>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            default_venue_weight: 0.75,
            venue_tiers: DEFAULT_VENUE_TIERS.clone(),
            neutral_genre_weight: 0.8,
            matched_genre_floor: 0.7,
            genre_hints: DEFAULT_GENRE_HINTS.clone(),
            promoter_weights: DEFAULT_PROMOTER_WEIGHTS.clone(),
            promoter_floor: 0.55,
            promoter_ceiling: 0.85,
            promoter_venue_slope: 1.2,
            core_cities: DEFAULT_CORE_CITIES.clone(),
            festival_keywords: DEFAULT_FESTIVAL_KEYWORDS.clone(),
            past_event_penalty: -0.5,
            missing_date_weight: 0.5,
            ramp_floor: 0.4,
            tail_floor: 0.1,
            blend: BlendWeights::default(),
            editorial: EditorialWeights::default(),
            windows: Window::ALL.iter().map(|w| WindowPolicy::default_for(*w)).collect(),
        }
    }
}

impl ScoringPolicy {
    /// Day-range policy for a window, falling back to the built-in default
    /// when a config file omits the entry.
    pub fn window_policy(&self, window: Window) -> WindowPolicy {
        self.windows
            .iter()
            .find(|w| w.window == window)
            .copied()
            .unwrap_or_else(|| WindowPolicy::default_for(window))
    }

    /// Lower-case every needle so matching stays case-insensitive even when a
    /// config file spells entries with capitals.
    pub fn normalized(mut self) -> Self {
        for table in [
            &mut self.venue_tiers,
            &mut self.genre_hints,
            &mut self.promoter_weights,
        ] {
            for entry in table.iter_mut() {
                entry.keyword = entry.keyword.trim().to_lowercase();
            }
        }
        for city in self.core_cities.iter_mut() {
            *city = city.trim().to_lowercase();
        }
        for keyword in self.festival_keywords.iter_mut() {
            *keyword = keyword.trim().to_lowercase();
        }
        self
    }

    /// Validate the policy, naming the offending entry on failure.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| RadarError::InvalidConfig { message };

        for (table, name) in [
            (&self.venue_tiers, "venue_tiers"),
            (&self.genre_hints, "genre_hints"),
            (&self.promoter_weights, "promoter_weights"),
        ] {
            for entry in table {
                if entry.keyword.trim().is_empty() {
                    return Err(invalid(format!("{} contains an empty keyword", name)));
                }
                if !(0.0..=1.0).contains(&entry.weight) {
                    return Err(invalid(format!(
                        "{} weight {} for '{}' is outside [0, 1]",
                        name, entry.weight, entry.keyword
                    )));
                }
            }
        }

        if !(0.0..=1.0).contains(&self.default_venue_weight) {
            return Err(invalid("default_venue_weight is outside [0, 1]".to_string()));
        }
        if self.promoter_floor > self.promoter_ceiling {
            return Err(invalid("promoter_floor exceeds promoter_ceiling".to_string()));
        }

        let b = &self.blend;
        for (value, name) in [
            (b.venue, "venue"),
            (b.genre, "genre"),
            (b.editorial, "editorial"),
            (b.promoter, "promoter"),
            (b.date, "date"),
        ] {
            if value < 0.0 {
                return Err(invalid(format!("blend weight '{}' is negative", name)));
            }
        }
        if (b.sum() - 1.0).abs() > 0.01 {
            warn!(sum = b.sum(), "blend weights do not sum to 1.0");
        }

        let mut seen = Vec::new();
        for wp in &self.windows {
            if seen.contains(&wp.window) {
                return Err(invalid(format!("duplicate window policy for '{}'", wp.window)));
            }
            seen.push(wp.window);
            if wp.horizon_start_days < 0 || wp.horizon_start_days >= wp.horizon_end_days {
                return Err(invalid(format!("window '{}' has an invalid horizon", wp.window)));
            }
            if wp.sweet_spot_start_days < 0
                || wp.sweet_spot_start_days > wp.sweet_spot_end_days
                || wp.sweet_spot_end_days > wp.horizon_end_days
            {
                return Err(invalid(format!(
                    "window '{}' has a sweet spot outside its horizon",
                    wp.window
                )));
            }
        }

        Ok(())
    }
}

/// Configuration for a complete curation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Maximum rows per window offered to the external re-ranker.
    pub candidate_pool: usize,
    /// Final curated rows kept per window.
    pub top_k: usize,
    pub scoring: ScoringPolicy,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 200,
            top_k: 20,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl CurationConfig {
    /// Load a TOML config file. Missing fields keep their defaults, so a file
    /// may override just the handful of values being tuned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| RadarError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RadarError::InvalidConfig {
                message: "top_k must be at least 1".to_string(),
            });
        }
        if self.candidate_pool < self.top_k {
            return Err(RadarError::InvalidConfig {
                message: "candidate_pool must be at least top_k".to_string(),
            });
        }
        self.scoring.validate()
    }
}
