//! Domain model: user profiles, scheduled activities and interaction records.
//!
//! Everything here is plain data with serde derives. Optional fields stay
//! `None` when the user has not declared a preference; downstream code treats
//! that as "no signal", never as an error.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sports known to the encoder, in fixed segment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Football,
    Basketball,
    Volleyball,
    Badminton,
    Tennis,
    TableTennis,
    Futsal,
    Frisbee,
    Hockey,
    Rugby,
    Squash,
}

impl Sport {
    /// Number of known sports.
    pub const COUNT: usize = 11;

    /// Segment index in [0, COUNT).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Sport::Football => 0,
            Sport::Basketball => 1,
            Sport::Volleyball => 2,
            Sport::Badminton => 3,
            Sport::Tennis => 4,
            Sport::TableTennis => 5,
            Sport::Futsal => 6,
            Sport::Frisbee => 7,
            Sport::Hockey => 8,
            Sport::Rugby => 9,
            Sport::Squash => 10,
        }
    }

    /// Lenient name parsing ("soccer" maps to football, "ping pong" to
    /// table tennis). Returns `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "football" | "soccer" => Some(Sport::Football),
            "basketball" => Some(Sport::Basketball),
            "volleyball" => Some(Sport::Volleyball),
            "badminton" => Some(Sport::Badminton),
            "tennis" => Some(Sport::Tennis),
            "table tennis" | "table-tennis" | "ping pong" | "pingpong" => {
                Some(Sport::TableTennis)
            }
            "futsal" => Some(Sport::Futsal),
            "frisbee" | "ultimate frisbee" | "ultimate" => Some(Sport::Frisbee),
            "hockey" => Some(Sport::Hockey),
            "rugby" => Some(Sport::Rugby),
            "squash" => Some(Sport::Squash),
            _ => None,
        }
    }
}

/// Declared proficiency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Professional,
}

impl SkillLevel {
    /// Number of tiers.
    pub const COUNT: usize = 4;

    /// Segment index in [0, COUNT).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            SkillLevel::Beginner => 0,
            SkillLevel::Intermediate => 1,
            SkillLevel::Advanced => 2,
            SkillLevel::Professional => 3,
        }
    }

    /// Pairwise compatibility: 1.0 same tier, 0.75 adjacent, 0.5 two apart,
    /// 0.0 beginner vs professional.
    #[must_use]
    pub fn compatibility(self, other: Self) -> f32 {
        match self.index().abs_diff(other.index()) {
            0 => 1.0,
            1 => 0.75,
            2 => 0.5,
            _ => 0.0,
        }
    }
}

/// How the user prefers to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayStyle {
    Casual,
    Competitive,
}

impl PlayStyle {
    /// Segment index in {0, 1}.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            PlayStyle::Casual => 0,
            PlayStyle::Competitive => 1,
        }
    }
}

/// Self-declared gender; `Undisclosed` leaves the gender segment zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
    Undisclosed,
}

/// Faculty affiliations, in fixed segment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faculty {
    Engineering,
    Business,
    Science,
    Education,
    Medicine,
    Law,
    Arts,
}

impl Faculty {
    /// Number of faculties.
    pub const COUNT: usize = 7;

    /// Segment index in [0, COUNT).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Faculty::Engineering => 0,
            Faculty::Business => 1,
            Faculty::Science => 2,
            Faculty::Education => 3,
            Faculty::Medicine => 4,
            Faculty::Law => 5,
            Faculty::Arts => 6,
        }
    }
}

/// Coarse time-of-day slots for schedule preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Number of slots.
    pub const COUNT: usize = 5;

    /// Segment index in [0, COUNT).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            TimeOfDay::EarlyMorning => 0,
            TimeOfDay::Morning => 1,
            TimeOfDay::Afternoon => 2,
            TimeOfDay::Evening => 3,
            TimeOfDay::Night => 4,
        }
    }

    /// Slot for an hour of day (0..24).
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=8 => TimeOfDay::EarlyMorning,
            9..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

/// A sport the user has declared, with their tier in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SportSkill {
    pub sport: Sport,
    pub skill: SkillLevel,
}

/// A user's declared preferences plus an optional cached feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub sports: Vec<SportSkill>,
    pub play_style: Option<PlayStyle>,
    pub faculty: Option<Faculty>,
    pub gender: Option<Gender>,
    pub age: Option<u8>,
    pub preferred_days: Vec<Weekday>,
    pub preferred_times: Vec<TimeOfDay>,
    pub preferred_venues: Vec<String>,
    pub preferred_duration_hours: Option<f32>,
    /// Cached encoder output; `None` until first encoded.
    pub feature_vector: Option<Vec<f32>>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::new(Uuid::nil())
    }
}

impl Profile {
    /// Empty profile for a user id; everything undeclared.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            sports: Vec::new(),
            play_style: None,
            faculty: None,
            gender: None,
            age: None,
            preferred_days: Vec::new(),
            preferred_times: Vec::new(),
            preferred_venues: Vec::new(),
            preferred_duration_hours: None,
            feature_vector: None,
        }
    }

    /// The user's declared tier in a sport, if any.
    #[must_use]
    pub fn skill_in(&self, sport: Sport) -> Option<SkillLevel> {
        self.sports
            .iter()
            .find(|s| s.sport == sport)
            .map(|s| s.skill)
    }

    /// True when no preference field at all has been declared.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.sports.is_empty()
            && self.play_style.is_none()
            && self.faculty.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.preferred_days.is_empty()
            && self.preferred_times.is_empty()
            && self.preferred_venues.is_empty()
            && self.preferred_duration_hours.is_none()
    }
}

/// A scheduled group activity that can be recommended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub sport: Sport,
    pub required_skill: Option<SkillLevel>,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: u32,
    pub confirmed: u32,
    pub host_id: Uuid,
    pub host_faculty: Option<Faculty>,
    pub host_gender: Option<Gender>,
    pub host_style: Option<PlayStyle>,
    pub title: String,
    pub description: String,
    /// Cached encoder output; `None` until first encoded.
    pub feature_vector: Option<Vec<f32>>,
}

impl Candidate {
    /// Scheduled duration in hours (never negative).
    #[must_use]
    pub fn duration_hours(&self) -> f32 {
        let secs = (self.ends_at - self.starts_at).num_seconds().max(0);
        secs as f32 / 3600.0
    }

    /// Confirmed participants over capacity, in [0, 1]. Zero capacity
    /// counts as full.
    #[must_use]
    pub fn fill_ratio(&self) -> f32 {
        if self.capacity == 0 {
            return 1.0;
        }
        (self.confirmed as f32 / self.capacity as f32).min(1.0)
    }

    /// True when no open slot remains.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.confirmed >= self.capacity
    }

    /// True once the start time has passed.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    /// Inferred play style: competitive keywords in title/description win,
    /// then the host's declared style, defaulting to casual.
    #[must_use]
    pub fn play_style(&self) -> PlayStyle {
        let text = format!("{} {}", self.title, self.description).to_lowercase();
        if text.contains("competitive") || text.contains("tournament") {
            return PlayStyle::Competitive;
        }
        self.host_style.unwrap_or(PlayStyle::Casual)
    }
}

/// A positive or negative signal a user left on a candidate (join, like,
/// dismiss). Feeds the collaborative scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: Uuid,
    pub candidate_id: Uuid,
    pub positive: bool,
}

/// Per-user behavioral features for clustering.
///
/// All rates live in [0, 1]; `avg_response_time_secs` is unbounded and gets
/// z-scored before clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRecord {
    pub user_id: Uuid,
    /// Feedback events per week.
    pub feedback_frequency: f32,
    /// Share of feedback that was positive.
    pub satisfaction_rate: f32,
    /// Mean seconds between recommendation and reaction.
    pub avg_response_time_secs: f32,
    /// Composite engagement in [0, 1].
    pub engagement_level: f32,
    /// Preference mass over the three recommendation signals
    /// (content, collaborative, activity).
    pub algorithm_preference: [f32; 3],
    /// Activity mass over morning / afternoon / evening / night.
    pub time_patterns: [f32; 4],
    /// Share of recommendations the user accepted.
    pub acceptance_rate: f32,
}

impl BehaviorRecord {
    /// Number of features in the clustering row.
    pub const N_FEATURES: usize = 12;

    /// Flattens into the fixed 12-feature clustering row: four scalars,
    /// three algorithm preferences, four time patterns, acceptance.
    #[must_use]
    pub fn to_features(&self) -> Vec<f32> {
        let mut row = Vec::with_capacity(Self::N_FEATURES);
        row.push(self.feedback_frequency);
        row.push(self.satisfaction_rate);
        row.push(self.avg_response_time_secs);
        row.push(self.engagement_level);
        row.extend_from_slice(&self.algorithm_preference);
        row.extend_from_slice(&self.time_patterns);
        row.push(self.acceptance_rate);
        row
    }
}
