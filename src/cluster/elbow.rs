//! Elbow-method model selection for K-Means.

use super::KMeans;
use crate::error::{CanchaError, Result};
use crate::primitives::Matrix;
use crate::traits::UnsupervisedEstimator;
use serde::{Deserialize, Serialize};

/// Outcome of an elbow sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElbowResult {
    /// Selected number of clusters.
    pub k: usize,
    /// WCSS per k, index 0 holding k = 1.
    pub wcss: Vec<f32>,
}

/// Selects a cluster count by the elbow method.
///
/// Runs K-Means for k = 1..=min(`max_k`, n - 1), records the within-cluster
/// sum of squares, and picks the k with the sharpest drop in improvement
/// (maximum second difference). The result is clamped to [2, 6] so the
/// downstream profiling always has labeled segments to talk about.
///
/// # Errors
///
/// Returns an error if `max_k` is zero or there are fewer than 2 samples.
pub fn select_k(data: &Matrix<f32>, max_k: usize, seed: Option<u64>) -> Result<ElbowResult> {
    if max_k == 0 {
        return Err(CanchaError::InvalidHyperparameter {
            param: "max_k".to_string(),
            value: "0".to_string(),
            constraint: "> 0".to_string(),
        });
    }

    let n_samples = data.n_rows();
    let upper = max_k.min(n_samples.saturating_sub(1));
    if upper < 1 {
        return Err(CanchaError::insufficient_data(
            n_samples,
            2,
            "elbow sweep needs at least 2 samples",
        ));
    }

    let mut wcss = Vec::with_capacity(upper);
    for k in 1..=upper {
        let mut kmeans = KMeans::new(k);
        if let Some(s) = seed {
            kmeans = kmeans.with_random_state(s);
        }
        kmeans.fit(data)?;
        wcss.push(kmeans.inertia());
    }

    // Maximum second difference of consecutive WCSS values; falls back to
    // the largest k tried when the sweep is too short to bend.
    let mut best_k = upper;
    let mut best_curvature = f32::NEG_INFINITY;
    for i in 1..wcss.len().saturating_sub(1) {
        let curvature = wcss[i - 1] - 2.0 * wcss[i] + wcss[i + 1];
        if curvature > best_curvature {
            best_curvature = curvature;
            best_k = i + 1; // wcss[i] belongs to k = i + 1
        }
    }

    let k = best_k.clamp(2, 6).min(upper).max(2.min(upper));

    Ok(ElbowResult { k, wcss })
}
