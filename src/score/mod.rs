//! Multi-signal match scoring.
//!
//! Each candidate gets three independent signals in [0, 1]:
//!
//! - direct: declared preferences against the candidate's attributes,
//! - collaborative: vector similarity to users who joined the candidate,
//! - activity: fill ratio, urgency and slot availability.
//!
//! Missing data degrades to documented neutral values; scoring itself
//! never fails.

use crate::domain::{Candidate, Interaction, Profile};
use crate::error::{CanchaError, Result};
use crate::metrics::cosine_similarity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Neutral value for a sub-score with no declared preference behind it.
pub const NEUTRAL: f32 = 0.5;

/// Weight of each direct-preference sub-score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectWeights {
    pub sport: f32,
    pub venue: f32,
    pub schedule: f32,
    pub skill: f32,
}

impl Default for DirectWeights {
    fn default() -> Self {
        Self {
            sport: 0.45,
            venue: 0.25,
            schedule: 0.20,
            skill: 0.10,
        }
    }
}

impl DirectWeights {
    /// # Errors
    ///
    /// Returns an error unless the weights sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let sum = self.sport + self.venue + self.schedule + self.skill;
        if (sum - 1.0).abs() > 1e-4 {
            return Err(CanchaError::InvalidHyperparameter {
                param: "direct_weights".to_string(),
                value: format!("{sum}"),
                constraint: "weights must sum to 1.0".to_string(),
            });
        }
        Ok(())
    }
}

/// Weight of each top-level signal. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub direct: f32,
    pub collaborative: f32,
    pub activity: f32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            direct: 0.35,
            collaborative: 0.45,
            activity: 0.20,
        }
    }
}

impl SignalWeights {
    /// # Errors
    ///
    /// Returns an error unless the weights sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let sum = self.direct + self.collaborative + self.activity;
        if (sum - 1.0).abs() > 1e-4 {
            return Err(CanchaError::InvalidHyperparameter {
                param: "signal_weights".to_string(),
                value: format!("{sum}"),
                constraint: "weights must sum to 1.0".to_string(),
            });
        }
        Ok(())
    }
}

/// Scorer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub direct_weights: DirectWeights,
    pub signal_weights: SignalWeights,
    /// Candidates scoring below this weighted total are dropped.
    pub min_score: f32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            direct_weights: DirectWeights::default(),
            signal_weights: SignalWeights::default(),
            min_score: 0.15,
        }
    }
}

impl ScorerConfig {
    /// # Errors
    ///
    /// Returns an error unless both weight sets sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        self.direct_weights.validate()?;
        self.signal_weights.validate()
    }
}

/// Per-sub-score detail of the direct signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectBreakdown {
    pub sport: f32,
    pub venue: f32,
    pub schedule: f32,
    pub skill: f32,
}

/// Full scoring result for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScore {
    /// Weighted combination of the three signals.
    pub total: f32,
    pub direct: f32,
    pub collaborative: f32,
    pub activity: f32,
    pub direct_breakdown: DirectBreakdown,
    /// Human-readable reasons for the score.
    pub explanation: String,
}

/// Scores candidates against a profile with configurable weights.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScorerConfig,
}

impl Scorer {
    /// Creates a scorer after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when either weight set does not sum to 1.0.
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Computes all three signals and the weighted total.
    #[must_use]
    pub fn score(
        &self,
        profile: &Profile,
        profile_vector: &[f32],
        candidate: &Candidate,
        interactions: &[Interaction],
        user_vectors: &HashMap<Uuid, Vec<f32>>,
        now: DateTime<Utc>,
    ) -> MatchScore {
        let (direct, breakdown) = self.direct_score(profile, candidate);
        let collaborative =
            collaborative_score(profile, profile_vector, candidate, interactions, user_vectors);
        let activity = activity_score(profile, candidate, now);

        let w = self.config.signal_weights;
        let total = w.direct * direct + w.collaborative * collaborative + w.activity * activity;

        let explanation = explain(profile, candidate, &breakdown, collaborative, activity, now);

        MatchScore {
            total,
            direct,
            collaborative,
            activity,
            direct_breakdown: breakdown,
            explanation,
        }
    }

    /// Direct-preference signal with per-sub-score breakdown.
    ///
    /// A profile with no declared preferences at all scores the neutral
    /// value everywhere.
    #[must_use]
    pub fn direct_score(&self, profile: &Profile, candidate: &Candidate) -> (f32, DirectBreakdown) {
        let breakdown = if profile.is_blank() {
            DirectBreakdown {
                sport: NEUTRAL,
                venue: NEUTRAL,
                schedule: NEUTRAL,
                skill: NEUTRAL,
            }
        } else {
            DirectBreakdown {
                sport: sport_sub_score(profile, candidate),
                venue: venue_sub_score(profile, candidate),
                schedule: schedule_sub_score(profile, candidate),
                skill: skill_sub_score(profile, candidate),
            }
        };

        let w = self.config.direct_weights;
        let total = w.sport * breakdown.sport
            + w.venue * breakdown.venue
            + w.schedule * breakdown.schedule
            + w.skill * breakdown.skill;

        (total, breakdown)
    }
}

/// Sport membership: 1.0 when the candidate's sport is declared, 0.0 when
/// the user declared other sports, neutral when none declared.
fn sport_sub_score(profile: &Profile, candidate: &Candidate) -> f32 {
    if profile.sports.is_empty() {
        return NEUTRAL;
    }
    if profile.sports.iter().any(|s| s.sport == candidate.sport) {
        1.0
    } else {
        0.0
    }
}

/// Venue match with a 0.25 floor: an unlisted venue is a weak negative,
/// not disqualifying.
fn venue_sub_score(profile: &Profile, candidate: &Candidate) -> f32 {
    if profile.preferred_venues.is_empty() {
        return NEUTRAL;
    }
    let target = candidate.venue.trim().to_lowercase();
    if profile
        .preferred_venues
        .iter()
        .any(|v| v.trim().to_lowercase() == target)
    {
        1.0
    } else {
        0.25
    }
}

/// Schedule fit: 0.7 for the day, 0.3 for the time slot. A declared-day
/// mismatch zeroes the whole sub-score.
fn schedule_sub_score(profile: &Profile, candidate: &Candidate) -> f32 {
    use chrono::{Datelike, Timelike};
    use crate::domain::TimeOfDay;

    if profile.preferred_days.is_empty() && profile.preferred_times.is_empty() {
        return NEUTRAL;
    }

    let day = candidate.starts_at.weekday();
    if !profile.preferred_days.is_empty() && !profile.preferred_days.contains(&day) {
        return 0.0;
    }
    // Day matched (or no day preference declared alongside time ones).
    let day_part = 0.7;

    let slot = TimeOfDay::from_hour(candidate.starts_at.hour());
    let time_part = if profile.preferred_times.is_empty() {
        0.15
    } else if profile.preferred_times.contains(&slot) {
        0.3
    } else {
        0.0
    };

    day_part + time_part
}

/// Skill compatibility via the tier matrix; neutral when either side has
/// no declared tier for this sport.
fn skill_sub_score(profile: &Profile, candidate: &Candidate) -> f32 {
    match (profile.skill_in(candidate.sport), candidate.required_skill) {
        (Some(mine), Some(required)) => mine.compatibility(required),
        _ => NEUTRAL,
    }
}

/// Collaborative signal: cosine similarity to the mean vector of users who
/// positively interacted with the candidate. Falls back to a preference
/// heuristic when there is no usable history. Always in [0, 1].
#[must_use]
pub fn collaborative_score(
    profile: &Profile,
    profile_vector: &[f32],
    candidate: &Candidate,
    interactions: &[Interaction],
    user_vectors: &HashMap<Uuid, Vec<f32>>,
) -> f32 {
    let peer_vectors: Vec<&Vec<f32>> = interactions
        .iter()
        .filter(|i| i.candidate_id == candidate.id && i.positive && i.user_id != profile.id)
        .filter_map(|i| user_vectors.get(&i.user_id))
        .filter(|v| v.len() == profile_vector.len() && !v.is_empty())
        .collect();

    if peer_vectors.is_empty() || profile_vector.iter().all(|&x| x == 0.0) {
        return collaborative_fallback(profile, candidate);
    }

    let dim = profile_vector.len();
    let mut mean = vec![0.0_f32; dim];
    for v in &peer_vectors {
        for (acc, x) in mean.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    for x in &mut mean {
        *x /= peer_vectors.len() as f32;
    }

    cosine_similarity(profile_vector, &mean).clamp(0.0, 1.0)
}

/// Heuristic stand-in when no interaction history exists: sport preference
/// strength plus a small bonus for schedule flexibility.
fn collaborative_fallback(profile: &Profile, candidate: &Candidate) -> f32 {
    let base = if profile.sports.iter().any(|s| s.sport == candidate.sport) {
        0.8
    } else {
        0.4
    };
    let flexibility = (profile.preferred_days.len() as f32 / 7.0).min(0.3);
    (base + flexibility).min(1.0)
}

/// Activity signal: social fill sweet spot, urgency tiers, exact skill
/// match and open-slot bonus. Started or full candidates earn no urgency
/// or open-slot bonus.
#[must_use]
pub fn activity_score(profile: &Profile, candidate: &Candidate, now: DateTime<Utc>) -> f32 {
    let ratio = candidate.fill_ratio();
    let mut score: f32 = if (0.3..=0.7).contains(&ratio) {
        0.4
    } else if ratio < 0.3 {
        0.2
    } else if ratio < 1.0 {
        0.3
    } else {
        0.0
    };

    if !candidate.has_started(now) && !candidate.is_full() {
        let hours_until = (candidate.starts_at - now).num_minutes() as f32 / 60.0;
        if hours_until < 6.0 {
            score += 0.3;
        } else if hours_until < 24.0 {
            score += 0.2;
        } else if hours_until < 72.0 {
            score += 0.1;
        }
        score += 0.1; // open slot
    }

    if let (Some(mine), Some(required)) = (profile.skill_in(candidate.sport), candidate.required_skill) {
        if mine == required {
            score += 0.2;
        }
    }

    score.min(1.0)
}

/// Assembles the human-readable reasons behind a score.
fn explain(
    profile: &Profile,
    candidate: &Candidate,
    breakdown: &DirectBreakdown,
    collaborative: f32,
    activity: f32,
    now: DateTime<Utc>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if breakdown.sport >= 1.0 {
        parts.push("matches a sport you play".to_string());
    }
    if breakdown.venue >= 1.0 {
        parts.push("at one of your preferred venues".to_string());
    }
    if breakdown.schedule >= 0.7 {
        parts.push("fits your weekly schedule".to_string());
    }
    if breakdown.skill >= 1.0 {
        parts.push("at your skill level".to_string());
    }
    if collaborative >= 0.6 {
        parts.push("popular with players like you".to_string());
    }
    if !candidate.has_started(now) {
        let hours_until = (candidate.starts_at - now).num_minutes() as f32 / 60.0;
        if hours_until < 24.0 && hours_until >= 0.0 {
            parts.push("starting soon".to_string());
        }
    }
    if activity >= 0.4 && !candidate.is_full() {
        parts.push("has open slots".to_string());
    }

    if parts.is_empty() {
        if profile.is_blank() {
            "suggested while we learn your preferences".to_string()
        } else {
            "may broaden your activity mix".to_string()
        }
    } else {
        parts.join("; ")
    }
}
