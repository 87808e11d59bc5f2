//! End-to-end scenarios: encoding, scoring, fusion and clustering together.

use cancha::cluster::{BehaviorClustering, ClusterCache};
use cancha::domain::{
    BehaviorRecord, Candidate, Gender, Interaction, PlayStyle, Profile, SkillLevel, Sport,
    SportSkill, TimeOfDay,
};
use cancha::error::CanchaError;
use cancha::prelude::*;
use chrono::{DateTime, TimeZone, Utc, Weekday};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn monday_noon() -> DateTime<Utc> {
    // 2026-03-09 is a Monday.
    Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap()
}

fn badminton_player() -> Profile {
    let mut p = Profile::new(Uuid::from_u128(1));
    p.sports.push(SportSkill {
        sport: Sport::Badminton,
        skill: SkillLevel::Intermediate,
    });
    p.play_style = Some(PlayStyle::Casual);
    p.gender = Some(Gender::Female);
    p.age = Some(22);
    p.preferred_days = vec![Weekday::Tue];
    p.preferred_times = vec![TimeOfDay::Evening];
    p.preferred_venues = vec!["Sports Hall A".to_string()];
    p
}

fn candidate(
    id: u128,
    sport: Sport,
    venue: &str,
    starts_at: DateTime<Utc>,
    confirmed: u32,
) -> Candidate {
    Candidate {
        id: Uuid::from_u128(id),
        sport,
        required_skill: Some(SkillLevel::Intermediate),
        venue: venue.to_string(),
        starts_at,
        ends_at: starts_at + chrono::Duration::hours(2),
        capacity: 8,
        confirmed,
        host_id: Uuid::from_u128(999),
        host_faculty: None,
        host_gender: None,
        host_style: None,
        title: "Weekly session".to_string(),
        description: String::new(),
        feature_vector: None,
    }
}

fn badminton_tuesday_snapshot() -> Snapshot {
    let tuesday_evening = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
    let sunday_morning = Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap();

    Snapshot {
        profile: badminton_player(),
        candidates: vec![
            candidate(10, Sport::Badminton, "Sports Hall A", tuesday_evening, 4),
            candidate(11, Sport::Football, "North Field", sunday_morning, 4),
            candidate(12, Sport::Tennis, "Court 3", sunday_morning, 8),
        ],
        excluded: HashSet::new(),
        interactions: Vec::new(),
        user_vectors: HashMap::new(),
    }
}

#[test]
fn badminton_tuesday_match_ranks_first() {
    let engine = Engine::default();
    let response = engine
        .recommend(&badminton_tuesday_snapshot(), &Request::default(), monday_noon())
        .expect("recommend");

    let top = &response.items[0];
    assert_eq!(top.candidate_id.as_u128(), 10);
    assert!(
        top.breakdown.direct >= 0.8,
        "direct signal should be strong, got {}",
        top.breakdown.direct
    );
    assert!(top.explanation.contains("sport you play"));

    // The Sunday football game ranks below the Tuesday badminton session.
    let football_pos = response
        .items
        .iter()
        .position(|i| i.candidate_id.as_u128() == 11);
    if let Some(pos) = football_pos {
        assert!(pos > 0);
    }
}

#[test]
fn tuesday_session_beats_sunday_session_of_the_same_sport() {
    // Tuesday 16:00; the preferred session starts in 2 hours with 3 of 10
    // slots taken.
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 16, 0, 0).unwrap();
    let tuesday_evening = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
    let sunday_morning = Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap();

    let mut tuesday = candidate(40, Sport::Badminton, "Sports Hall A", tuesday_evening, 3);
    tuesday.capacity = 10;
    let sunday = candidate(41, Sport::Badminton, "Sports Hall A", sunday_morning, 3);

    let snapshot = Snapshot {
        profile: badminton_player(),
        candidates: vec![sunday.clone(), tuesday.clone()],
        excluded: HashSet::new(),
        interactions: Vec::new(),
        user_vectors: HashMap::new(),
    };

    let response = Engine::default()
        .recommend(&snapshot, &Request::default(), now)
        .expect("recommend");

    assert_eq!(response.items[0].candidate_id, tuesday.id);
    let top = &response.items[0];
    assert!(top.breakdown.direct >= 0.8);
    // Imminent start lands in the tightest urgency tier.
    assert!(top.breakdown.activity >= 0.8);
    assert!(top.explanation.contains("starting soon"));

    let below = response
        .items
        .iter()
        .find(|i| i.candidate_id == sunday.id)
        .expect("sunday candidate scored");
    assert!(top.breakdown.direct > below.breakdown.direct);
}

#[test]
fn urgent_session_outranks_identical_distant_one() {
    let in_three_hours = monday_noon() + chrono::Duration::hours(3);
    let next_week = Utc.with_ymd_and_hms(2026, 3, 17, 18, 0, 0).unwrap();

    let mut profile = Profile::new(Uuid::from_u128(2));
    profile.sports.push(SportSkill {
        sport: Sport::Badminton,
        skill: SkillLevel::Intermediate,
    });

    let snapshot = Snapshot {
        profile,
        candidates: vec![
            candidate(20, Sport::Badminton, "Sports Hall A", next_week, 4),
            candidate(21, Sport::Badminton, "Sports Hall A", in_three_hours, 4),
        ],
        excluded: HashSet::new(),
        interactions: Vec::new(),
        user_vectors: HashMap::new(),
    };

    let response = Engine::default()
        .recommend(&snapshot, &Request::default(), monday_noon())
        .expect("recommend");
    assert_eq!(response.items[0].candidate_id.as_u128(), 21);
    assert!(
        response.items[0].breakdown.activity > response.items[1].breakdown.activity
    );
}

#[test]
fn collaborative_history_lifts_a_candidate() {
    let mut snapshot = badminton_tuesday_snapshot();
    let profile_vector = encode_profile(&snapshot.profile);
    snapshot.profile.feature_vector = Some(profile_vector.clone());

    // Peers with vectors identical to the requester joined the tennis game.
    for peer in 30..33_u128 {
        let peer_id = Uuid::from_u128(peer);
        snapshot.interactions.push(Interaction {
            user_id: peer_id,
            candidate_id: Uuid::from_u128(12),
            positive: true,
        });
        snapshot
            .user_vectors
            .insert(peer_id, profile_vector.clone());
    }

    let response = Engine::default()
        .recommend(&snapshot, &Request::default(), monday_noon())
        .expect("recommend");

    let tennis = response
        .items
        .iter()
        .find(|i| i.candidate_id.as_u128() == 12)
        .expect("tennis present");
    assert!(
        (tennis.breakdown.collaborative - 1.0).abs() < 1e-5,
        "identical peer vectors should max the collaborative signal"
    );
}

#[test]
fn recommendations_are_deterministic() {
    let engine = Engine::default();
    let snapshot = badminton_tuesday_snapshot();
    let a = engine
        .recommend(&snapshot, &Request::default(), monday_noon())
        .expect("recommend");
    let b = engine
        .recommend(&snapshot, &Request::default(), monday_noon())
        .expect("recommend");

    assert_eq!(a.total, b.total);
    for (x, y) in a.items.iter().zip(b.items.iter()) {
        assert_eq!(x.candidate_id, y.candidate_id);
        assert_eq!(x.final_score, y.final_score);
        assert_eq!(x.explanation, y.explanation);
    }
}

#[test]
fn empty_candidate_pool_reports_insufficient_data() {
    let snapshot = Snapshot {
        profile: badminton_player(),
        ..Snapshot::default()
    };
    let err = Engine::default()
        .recommend(&snapshot, &Request::default(), monday_noon())
        .unwrap_err();
    match err {
        CanchaError::InsufficientData { found, .. } => assert_eq!(found, 0),
        other => panic!("expected InsufficientData, got {other}"),
    }
}

fn behavior_record(id: u128, satisfaction: f32, engagement: f32, frequency: f32) -> BehaviorRecord {
    BehaviorRecord {
        user_id: Uuid::from_u128(id),
        feedback_frequency: frequency,
        satisfaction_rate: satisfaction,
        avg_response_time_secs: 90.0 + (id % 7) as f32 * 5.0,
        engagement_level: engagement,
        algorithm_preference: [0.4, 0.4, 0.2],
        time_patterns: [0.1, 0.2, 0.5, 0.2],
        acceptance_rate: satisfaction,
    }
}

#[test]
fn fifty_users_with_two_behaviors_cluster_into_two_segments() {
    let mut records = Vec::with_capacity(50);
    for i in 0..25_u128 {
        // Happy, engaged power users with slight per-user variation.
        let wiggle = (i % 5) as f32 * 0.01;
        records.push(behavior_record(i, 0.88 + wiggle, 0.75 + wiggle, 4.0 + wiggle));
    }
    for i in 25..50_u128 {
        let wiggle = (i % 5) as f32 * 0.01;
        records.push(behavior_record(i, 0.15 + wiggle, 0.10 + wiggle, 0.5 + wiggle));
    }

    let analysis = BehaviorClustering::new()
        .with_random_state(42)
        .analyze(&records, monday_noon())
        .expect("analyze");

    assert_eq!(analysis.k, 2);
    assert_eq!(analysis.assignments.len(), 50);

    let first = analysis.assignments[0].cluster;
    assert!(analysis.assignments[..25].iter().all(|a| a.cluster == first));
    assert!(analysis.assignments[25..].iter().all(|a| a.cluster != first));

    let labels: Vec<&str> = analysis.profiles.iter().map(|p| p.label.as_str()).collect();
    assert!(labels.contains(&"Highly Satisfied Power Users"));
    assert!(labels.contains(&"Dissatisfied Users"));
    for profile in &analysis.profiles {
        assert_eq!(profile.size, 25);
    }
}

#[test]
fn response_and_analysis_serialize_to_json() {
    let response = Engine::default()
        .recommend(&badminton_tuesday_snapshot(), &Request::default(), monday_noon())
        .expect("recommend");
    let json = serde_json::to_string(&response).expect("serialize response");
    assert!(json.contains("final_score"));

    let records: Vec<BehaviorRecord> = (0..6_u128)
        .map(|i| behavior_record(i, 0.2 + (i as f32) * 0.12, 0.5, 2.0))
        .collect();
    let analysis = BehaviorClustering::new()
        .with_random_state(3)
        .analyze(&records, monday_noon())
        .expect("analyze");
    let json = serde_json::to_string(&analysis).expect("serialize analysis");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse back");
    assert_eq!(parsed["k"].as_u64().unwrap() as usize, analysis.k);
}

#[test]
fn cluster_cache_round_trip() {
    let records: Vec<BehaviorRecord> = (0..10_u128)
        .map(|i| behavior_record(i, 0.5 + (i as f32) * 0.04, 0.5, 2.0))
        .collect();
    let clustering = BehaviorClustering::new().with_random_state(7);
    let mut cache = ClusterCache::new();

    let fresh = cache
        .get_or_compute(false, monday_noon(), || {
            clustering.analyze(&records, monday_noon())
        })
        .expect("fresh");
    assert!(!fresh.cached);

    let hit = cache
        .get_or_compute(false, monday_noon() + chrono::Duration::hours(2), || {
            panic!("should not recompute inside the TTL")
        })
        .expect("hit");
    assert!(hit.cached);
    assert_eq!(hit.k, fresh.k);
}
