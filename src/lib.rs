//! Cancha: recommendation and clustering engine for scheduled group sports
//! activities.
//!
//! Cancha matches user profiles to upcoming group activities with three
//! independent signals (declared preferences, collaborative similarity,
//! activity dynamics), fuses the rankings with reciprocal rank fusion, and
//! segments the user base with behavioral K-Means clustering. All of it is
//! deterministic, pure computation: the caller owns I/O, persistence and
//! the clock.
//!
//! # Quick Start
//!
//! ```
//! use cancha::prelude::*;
//! use cancha::domain::{Profile, Sport, SkillLevel, SportSkill};
//! use uuid::Uuid;
//!
//! let mut profile = Profile::new(Uuid::new_v4());
//! profile.sports.push(SportSkill {
//!     sport: Sport::Badminton,
//!     skill: SkillLevel::Intermediate,
//! });
//!
//! // Encode into the shared 384-dim feature space.
//! let vector = encode_profile(&profile);
//! assert_eq!(vector.len(), cancha::encode::DIM);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`domain`]: Profiles, candidates, interactions, behavior records
//! - [`encode`]: Deterministic 384-dim feature encoder
//! - [`score`]: Multi-signal match scoring
//! - [`cluster`]: K-Means, elbow selection, behavioral analysis
//! - [`fuse`]: Reciprocal rank fusion
//! - [`recommend`]: The request-level engine
//! - [`preprocessing`]: Data transformers (StandardScaler)
//! - [`metrics`]: Evaluation metrics (inertia, cosine similarity)

pub mod cluster;
pub mod domain;
pub mod encode;
pub mod error;
pub mod fuse;
pub mod metrics;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod recommend;
pub mod score;
pub mod traits;
