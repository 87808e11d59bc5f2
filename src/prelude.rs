//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use cancha::prelude::*;
//! ```

pub use crate::cluster::{BehaviorClustering, ClusterCache, KMeans};
pub use crate::encode::{encode_candidate, encode_profile};
pub use crate::error::{CanchaError, Result};
pub use crate::fuse::{fuse, FusionConfig, SignalSource};
pub use crate::metrics::{cosine_similarity, inertia};
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::recommend::{Engine, Request, Snapshot};
pub use crate::score::{Scorer, ScorerConfig};
pub use crate::traits::{Transformer, UnsupervisedEstimator};
