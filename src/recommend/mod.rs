//! Request-level recommendation engine.
//!
//! The engine is pure computation over a point-in-time [`Snapshot`]: it does
//! no I/O and holds no shared mutable state. Callers load the data, pass an
//! explicit clock, and persist whatever vectors the response hands back.

use crate::domain::{Candidate, Interaction, Profile};
use crate::encode::{encode_candidate, encode_profile};
use crate::error::{CanchaError, Result};
use crate::fuse::{fuse, FusionConfig, RankedEntry, SignalSource};
use crate::score::{MatchScore, Scorer, ScorerConfig};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Everything a recommendation run reads, captured at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// The requesting user.
    pub profile: Profile,
    /// Candidates to rank.
    pub candidates: Vec<Candidate>,
    /// Candidate ids to drop before scoring (already joined, dismissed).
    pub excluded: HashSet<Uuid>,
    /// Interaction history backing the collaborative signal.
    pub interactions: Vec<Interaction>,
    /// Other users' feature vectors, keyed by user id.
    pub user_vectors: HashMap<Uuid, Vec<f32>>,
}

/// Pagination and threshold parameters for one request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Request {
    pub limit: usize,
    pub offset: usize,
    /// Overrides the scorer's default minimum when set.
    pub min_score: Option<f32>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            min_score: None,
        }
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub candidate_id: Uuid,
    /// Fused (RRF) score that determined the rank.
    pub final_score: f32,
    /// Per-signal detail from the scorer.
    pub breakdown: MatchScore,
    /// Merged reasons across signals.
    pub explanation: String,
}

/// Result of a recommendation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub items: Vec<RecommendationItem>,
    /// Total matches before pagination.
    pub total: usize,
    /// Freshly computed profile vector when the snapshot had none; the
    /// caller is responsible for persisting it.
    pub refreshed_profile_vector: Option<Vec<f32>>,
}

/// The recommendation engine: encode, score in parallel, fuse, paginate.
///
/// # Examples
///
/// ```
/// use cancha::recommend::{Engine, Request, Snapshot};
/// use chrono::Utc;
///
/// let engine = Engine::default();
/// // An empty snapshot has no candidates to rank.
/// let result = engine.recommend(&Snapshot::default(), &Request::default(), Utc::now());
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    scorer: Scorer,
    fusion: FusionConfig,
}

impl Engine {
    /// Creates an engine after validating both configurations.
    ///
    /// # Errors
    ///
    /// Returns an error when the scorer weights do not sum to 1.0.
    pub fn new(scorer_config: ScorerConfig, fusion: FusionConfig) -> Result<Self> {
        let scorer = Scorer::new(scorer_config)?;
        Ok(Self { scorer, fusion })
    }

    /// Ranks the snapshot's candidates for its profile.
    ///
    /// # Errors
    ///
    /// Returns [`CanchaError::InsufficientData`] when no candidates remain
    /// after exclusions.
    pub fn recommend(
        &self,
        snapshot: &Snapshot,
        request: &Request,
        now: DateTime<Utc>,
    ) -> Result<Response> {
        let candidates: Vec<&Candidate> = snapshot
            .candidates
            .iter()
            .filter(|c| !snapshot.excluded.contains(&c.id))
            .collect();

        if candidates.is_empty() {
            return Err(CanchaError::insufficient_data(
                0,
                1,
                "no candidates remain after exclusions",
            ));
        }

        // Reuse the cached profile vector; re-encode when absent and hand
        // the fresh vector back for the caller to persist.
        let (profile_vector, refreshed_profile_vector) = match &snapshot.profile.feature_vector {
            Some(v) => (v.clone(), None),
            None => {
                let v = encode_profile(&snapshot.profile);
                (v.clone(), Some(v))
            }
        };

        let scored: Vec<(Uuid, MatchScore)> = candidates
            .par_iter()
            .map(|&candidate| {
                let score = self.scorer.score(
                    &snapshot.profile,
                    &profile_vector,
                    candidate,
                    &snapshot.interactions,
                    &snapshot.user_vectors,
                    now,
                );
                (candidate.id, score)
            })
            .collect();

        let min_score = request.min_score.unwrap_or(self.scorer.config().min_score);
        let mut kept: Vec<(Uuid, MatchScore)> = scored
            .into_iter()
            .filter(|(_, s)| s.total >= min_score)
            .collect();
        // Stable input order for the per-signal rankings below.
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::debug!(
            user = %snapshot.profile.id,
            candidates = candidates.len(),
            above_threshold = kept.len(),
            "scored candidates"
        );

        let lists = build_signal_lists(&kept);
        let fused = fuse(&lists, &self.fusion);

        let by_id: HashMap<Uuid, MatchScore> = kept.into_iter().collect();
        let total = fused.len();
        let items: Vec<RecommendationItem> = fused
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|f| {
                let breakdown = by_id
                    .get(&f.id)
                    .cloned()
                    .expect("fused ids come from the kept set");
                RecommendationItem {
                    candidate_id: f.id,
                    final_score: f.score,
                    explanation: f.explanation,
                    breakdown,
                }
            })
            .collect();

        Ok(Response {
            items,
            total,
            refreshed_profile_vector,
        })
    }
}

/// Builds the three per-signal rankings, each sorted by its own signal
/// (descending, id ascending on ties).
fn build_signal_lists(
    scored: &[(Uuid, MatchScore)],
) -> BTreeMap<SignalSource, Vec<RankedEntry>> {
    let mut lists = BTreeMap::new();

    for (source, key) in [
        (
            SignalSource::ContentBased,
            (|s: &MatchScore| s.direct) as fn(&MatchScore) -> f32,
        ),
        (SignalSource::Collaborative, |s: &MatchScore| {
            s.collaborative
        }),
        (SignalSource::ActivityBased, |s: &MatchScore| s.activity),
    ] {
        let mut entries: Vec<RankedEntry> = scored
            .iter()
            .map(|(id, score)| RankedEntry {
                id: *id,
                score: key(score),
                explanation: score.explanation.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        lists.insert(source, entries);
    }

    lists
}

/// Encodes every candidate that lacks a cached vector, returning
/// (candidate id, vector) pairs for the caller to persist.
#[must_use]
pub fn refresh_candidate_vectors(candidates: &[Candidate]) -> Vec<(Uuid, Vec<f32>)> {
    candidates
        .par_iter()
        .filter(|c| c.feature_vector.is_none())
        .map(|c| (c.id, encode_candidate(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SkillLevel, Sport, SportSkill};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap()
    }

    fn profile() -> Profile {
        let mut p = Profile::new(Uuid::from_u128(1));
        p.sports.push(SportSkill {
            sport: Sport::Badminton,
            skill: SkillLevel::Intermediate,
        });
        p.preferred_days = vec![chrono::Weekday::Tue];
        p
    }

    fn candidate(id: u128, sport: Sport) -> Candidate {
        Candidate {
            id: Uuid::from_u128(id),
            sport,
            required_skill: None,
            venue: "Sports Hall A".to_string(),
            starts_at: Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 3, 10, 20, 0, 0).unwrap(),
            capacity: 8,
            confirmed: 4,
            host_id: Uuid::from_u128(50),
            host_faculty: None,
            host_gender: None,
            host_style: None,
            title: String::new(),
            description: String::new(),
            feature_vector: None,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            profile: profile(),
            candidates: vec![
                candidate(10, Sport::Badminton),
                candidate(11, Sport::Rugby),
                candidate(12, Sport::Tennis),
            ],
            excluded: HashSet::new(),
            interactions: Vec::new(),
            user_vectors: HashMap::new(),
        }
    }

    #[test]
    fn test_declared_sport_ranks_first() {
        let engine = Engine::default();
        let response = engine
            .recommend(&snapshot(), &Request::default(), now())
            .expect("recommend");
        assert_eq!(response.items[0].candidate_id.as_u128(), 10);
        assert_eq!(response.total, response.items.len());
    }

    #[test]
    fn test_no_candidates_is_an_error() {
        let engine = Engine::default();
        let empty = Snapshot {
            profile: profile(),
            ..Snapshot::default()
        };
        let err = engine
            .recommend(&empty, &Request::default(), now())
            .unwrap_err();
        assert!(matches!(err, CanchaError::InsufficientData { .. }));
    }

    #[test]
    fn test_exclusions_can_empty_the_pool() {
        let engine = Engine::default();
        let mut snap = snapshot();
        snap.excluded = snap.candidates.iter().map(|c| c.id).collect();
        let err = engine
            .recommend(&snap, &Request::default(), now())
            .unwrap_err();
        assert!(matches!(err, CanchaError::InsufficientData { .. }));
    }

    #[test]
    fn test_excluded_candidate_never_appears() {
        let engine = Engine::default();
        let mut snap = snapshot();
        snap.excluded.insert(Uuid::from_u128(10));
        let response = engine
            .recommend(&snap, &Request::default(), now())
            .expect("recommend");
        assert!(response
            .items
            .iter()
            .all(|i| i.candidate_id.as_u128() != 10));
    }

    #[test]
    fn test_min_score_filters() {
        let engine = Engine::default();
        let snap = snapshot();
        let strict = Request {
            min_score: Some(0.99),
            ..Request::default()
        };
        let response = engine.recommend(&snap, &strict, now()).expect("recommend");
        assert_eq!(response.total, 0);
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_pagination_offset_and_limit() {
        let engine = Engine::default();
        let snap = snapshot();

        let all = engine
            .recommend(&snap, &Request::default(), now())
            .expect("recommend");
        let page = engine
            .recommend(
                &snap,
                &Request {
                    limit: 1,
                    offset: 1,
                    min_score: None,
                },
                now(),
            )
            .expect("recommend");

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, all.total);
        assert_eq!(page.items[0].candidate_id, all.items[1].candidate_id);
    }

    #[test]
    fn test_missing_profile_vector_is_refreshed() {
        let engine = Engine::default();
        let snap = snapshot();
        assert!(snap.profile.feature_vector.is_none());
        let response = engine
            .recommend(&snap, &Request::default(), now())
            .expect("recommend");
        let refreshed = response.refreshed_profile_vector.expect("refreshed");
        assert_eq!(refreshed.len(), crate::encode::DIM);

        let mut cached = snapshot();
        cached.profile.feature_vector = Some(refreshed);
        let second = engine
            .recommend(&cached, &Request::default(), now())
            .expect("recommend");
        assert!(second.refreshed_profile_vector.is_none());
    }

    #[test]
    fn test_runs_are_deterministic() {
        let engine = Engine::default();
        let snap = snapshot();
        let a = engine
            .recommend(&snap, &Request::default(), now())
            .expect("recommend");
        let b = engine
            .recommend(&snap, &Request::default(), now())
            .expect("recommend");
        let ids_a: Vec<Uuid> = a.items.iter().map(|i| i.candidate_id).collect();
        let ids_b: Vec<Uuid> = b.items.iter().map(|i| i.candidate_id).collect();
        assert_eq!(ids_a, ids_b);
        for (x, y) in a.items.iter().zip(b.items.iter()) {
            assert_eq!(x.final_score, y.final_score);
        }
    }

    #[test]
    fn test_breakdown_carries_all_signals() {
        let engine = Engine::default();
        let response = engine
            .recommend(&snapshot(), &Request::default(), now())
            .expect("recommend");
        let top = &response.items[0];
        assert!(top.breakdown.direct > 0.0);
        assert!(top.breakdown.collaborative > 0.0);
        assert!(top.breakdown.activity > 0.0);
        assert!(!top.explanation.is_empty());
    }

    #[test]
    fn test_refresh_candidate_vectors_skips_cached() {
        let mut candidates = vec![candidate(1, Sport::Tennis), candidate(2, Sport::Rugby)];
        candidates[0].feature_vector = Some(vec![0.0; crate::encode::DIM]);
        let refreshed = refresh_candidate_vectors(&candidates);
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].0.as_u128(), 2);
        assert_eq!(refreshed[0].1.len(), crate::encode::DIM);
    }
}
