//! Deterministic 384-dim feature encoder.
//!
//! Profiles and candidates are encoded against one shared segment layout so
//! that cosine similarity between the two is meaningful. Encoding is pure
//! arithmetic over declared fields; no randomness, no I/O. Missing optional
//! fields leave their segment zero.

use crate::domain::{Candidate, Faculty, Gender, Profile, SkillLevel, Sport, TimeOfDay};
use chrono::{Datelike, Timelike};

/// Total feature vector length.
pub const DIM: usize = 384;

/// One named region of the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub name: &'static str,
    pub start: usize,
    pub len: usize,
}

impl Segment {
    #[must_use]
    const fn new(name: &'static str, start: usize, len: usize) -> Self {
        Self { name, start, len }
    }

    /// End index (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

pub const SPORT: Segment = Segment::new("sport", 0, Sport::COUNT * 10);
pub const SKILL: Segment = Segment::new("skill", 110, SkillLevel::COUNT * 10);
pub const PLAY_STYLE: Segment = Segment::new("play_style", 150, 2 * 10);
pub const AFFILIATION: Segment = Segment::new("affiliation", 170, Faculty::COUNT * 10);
pub const DURATION: Segment = Segment::new("duration", 240, 4 * 5);
pub const VENUE: Segment = Segment::new("venue", 260, VENUE_BUCKETS * 10);
pub const GENDER: Segment = Segment::new("gender", 340, 10);
pub const AGE: Segment = Segment::new("age", 350, 10);
pub const SCHEDULE_DAY: Segment = Segment::new("schedule_day", 360, 7 * 2);
pub const TIME_OF_DAY: Segment = Segment::new("time_of_day", 374, TimeOfDay::COUNT * 2);

/// Number of venue hash buckets.
pub const VENUE_BUCKETS: usize = 8;

/// The full layout in index order. Contiguous and non-overlapping; the
/// segments sum to [`DIM`].
#[must_use]
pub fn layout() -> [Segment; 10] {
    [
        SPORT,
        SKILL,
        PLAY_STYLE,
        AFFILIATION,
        DURATION,
        VENUE,
        GENDER,
        AGE,
        SCHEDULE_DAY,
        TIME_OF_DAY,
    ]
}

/// Writes `strength * (1.0 - i * 0.01)` across a sub-block, keeping the max
/// where something already wrote (overlapping credit never accumulates).
fn fill(v: &mut [f32], start: usize, len: usize, strength: f32) {
    for i in 0..len {
        let val = strength * (1.0 - i as f32 * 0.01);
        if val > v[start + i] {
            v[start + i] = val;
        }
    }
}

/// FNV-1a over the lowercased venue name, reduced to a bucket index.
/// Stable across runs and platforms, unlike the std hasher.
#[must_use]
pub fn venue_bucket(venue: &str) -> usize {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for byte in venue.trim().to_lowercase().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % VENUE_BUCKETS as u64) as usize
}

/// Duration bucket index (1h / 2h / 3h / 4h+), 5 dims each.
fn duration_bucket(hours: f32) -> usize {
    if hours < 1.5 {
        0
    } else if hours < 2.5 {
        1
    } else if hours < 3.5 {
        2
    } else {
        3
    }
}

/// Gender sub-block: own half at full strength, the complementary half at
/// 0.3 so cross-gender activities still get partial credit. `Other` writes
/// both halves weakly; `Undisclosed` writes nothing.
fn encode_gender(v: &mut [f32], gender: Gender) {
    let half = GENDER.len / 2;
    match gender {
        Gender::Male => {
            fill(v, GENDER.start, half, 1.0);
            fill(v, GENDER.start + half, half, 0.3);
        }
        Gender::Female => {
            fill(v, GENDER.start + half, half, 1.0);
            fill(v, GENDER.start, half, 0.3);
        }
        Gender::Other => {
            fill(v, GENDER.start, half, 0.3);
            fill(v, GENDER.start + half, half, 0.3);
        }
        Gender::Undisclosed => {}
    }
}

/// Gaussian bump over the age sub-block, centered at the normalized age.
fn encode_age(v: &mut [f32], age: u8) {
    const SIGMA: f32 = 2.0;
    let center = ((f32::from(age) - 18.0) / 7.0 * 10.0).clamp(0.0, 9.0);
    for i in 0..AGE.len {
        let d = i as f32 - center;
        let val = (-(d * d) / (2.0 * SIGMA * SIGMA)).exp();
        if val > v[AGE.start + i] {
            v[AGE.start + i] = val;
        }
    }
}

/// Day-of-week credit: the day itself at full strength, adjacent days at
/// [0.7, 0.6]. Adjacency does not wrap around the week. Overlap takes max.
fn encode_day(v: &mut [f32], day_idx: usize) {
    fill(v, SCHEDULE_DAY.start + day_idx * 2, 2, 1.0);
    let adjacent = [0.7, 0.6];
    if day_idx > 0 {
        let base = SCHEDULE_DAY.start + (day_idx - 1) * 2;
        for (i, &val) in adjacent.iter().enumerate() {
            if val > v[base + i] {
                v[base + i] = val;
            }
        }
    }
    if day_idx < 6 {
        let base = SCHEDULE_DAY.start + (day_idx + 1) * 2;
        for (i, &val) in adjacent.iter().enumerate() {
            if val > v[base + i] {
                v[base + i] = val;
            }
        }
    }
}

/// L2-normalizes in place; an all-zero vector stays zero (the "no signal"
/// marker downstream code checks for).
fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Encodes a user profile into the shared 384-dim space.
///
/// Deterministic: the same profile always yields the same vector. A profile
/// with no declared preferences yields the zero vector.
///
/// # Examples
///
/// ```
/// use cancha::domain::{Profile, Sport, SkillLevel, SportSkill};
/// use cancha::encode::{encode_profile, DIM};
/// use uuid::Uuid;
///
/// let mut p = Profile::new(Uuid::new_v4());
/// p.sports.push(SportSkill { sport: Sport::Badminton, skill: SkillLevel::Intermediate });
/// let v = encode_profile(&p);
/// assert_eq!(v.len(), DIM);
/// let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
/// assert!((norm - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn encode_profile(profile: &Profile) -> Vec<f32> {
    let mut v = vec![0.0_f32; DIM];

    for entry in &profile.sports {
        fill(&mut v, SPORT.start + entry.sport.index() * 10, 10, 1.0);
        fill(&mut v, SKILL.start + entry.skill.index() * 10, 10, 1.0);
    }
    if let Some(style) = profile.play_style {
        fill(&mut v, PLAY_STYLE.start + style.index() * 10, 10, 1.0);
    }
    if let Some(faculty) = profile.faculty {
        fill(&mut v, AFFILIATION.start + faculty.index() * 10, 10, 1.0);
    }
    if let Some(hours) = profile.preferred_duration_hours {
        fill(&mut v, DURATION.start + duration_bucket(hours) * 5, 5, 1.0);
    }
    for venue in &profile.preferred_venues {
        fill(&mut v, VENUE.start + venue_bucket(venue) * 10, 10, 1.0);
    }
    if let Some(gender) = profile.gender {
        encode_gender(&mut v, gender);
    }
    if let Some(age) = profile.age {
        encode_age(&mut v, age);
    }
    for day in &profile.preferred_days {
        encode_day(&mut v, day.num_days_from_monday() as usize);
    }
    for time in &profile.preferred_times {
        fill(&mut v, TIME_OF_DAY.start + time.index() * 2, 2, 1.0);
    }

    l2_normalize(&mut v);
    v
}

/// Encodes a candidate activity into the shared 384-dim space.
///
/// The age segment stays zero: activities have no age. Play style comes
/// from [`Candidate::play_style`] inference.
#[must_use]
pub fn encode_candidate(candidate: &Candidate) -> Vec<f32> {
    let mut v = vec![0.0_f32; DIM];

    fill(&mut v, SPORT.start + candidate.sport.index() * 10, 10, 1.0);
    if let Some(skill) = candidate.required_skill {
        fill(&mut v, SKILL.start + skill.index() * 10, 10, 1.0);
    }
    fill(
        &mut v,
        PLAY_STYLE.start + candidate.play_style().index() * 10,
        10,
        1.0,
    );
    if let Some(faculty) = candidate.host_faculty {
        fill(&mut v, AFFILIATION.start + faculty.index() * 10, 10, 1.0);
    }
    fill(
        &mut v,
        DURATION.start + duration_bucket(candidate.duration_hours()) * 5,
        5,
        1.0,
    );
    fill(
        &mut v,
        VENUE.start + venue_bucket(&candidate.venue) * 10,
        10,
        1.0,
    );
    if let Some(gender) = candidate.host_gender {
        encode_gender(&mut v, gender);
    }
    encode_day(
        &mut v,
        candidate.starts_at.weekday().num_days_from_monday() as usize,
    );
    fill(
        &mut v,
        TIME_OF_DAY.start + TimeOfDay::from_hour(candidate.starts_at.hour()).index() * 2,
        2,
        1.0,
    );

    l2_normalize(&mut v);
    v
}
