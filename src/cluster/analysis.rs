//! Behavioral clustering pipeline: scale, pick k, cluster, profile.
//!
//! Takes per-user [`BehaviorRecord`]s, z-scores them, runs the elbow sweep
//! and K-Means, then summarizes each cluster into a labeled profile the
//! product layer can show. A 24-hour cache wrapper avoids recomputing on
//! every request.

use super::elbow::select_k;
use super::KMeans;
use crate::domain::BehaviorRecord;
use crate::error::{CanchaError, Result};
use crate::preprocessing::StandardScaler;
use crate::primitives::Matrix;
use crate::traits::{Transformer, UnsupervisedEstimator};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum records required to cluster at all.
pub const MIN_RECORDS: usize = 3;

/// Human-readable names for the three recommendation signals, in
/// [`BehaviorRecord::algorithm_preference`] order.
const ALGORITHM_NAMES: [&str; 3] = ["content", "collaborative", "activity"];

/// Names for the four time-pattern slots, in
/// [`BehaviorRecord::time_patterns`] order.
const TIME_PATTERN_NAMES: [&str; 4] = ["morning", "afternoon", "evening", "night"];

/// One user's cluster membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub user_id: Uuid,
    pub cluster: usize,
    /// Euclidean distance to the cluster centroid in scaled space.
    pub distance: f32,
}

/// Aggregate description of one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    /// Rule-based segment label.
    pub label: String,
    /// Centroid in original (unscaled) feature units.
    pub centroid: Vec<f32>,
    pub mean_satisfaction: f32,
    pub mean_engagement: f32,
    pub mean_frequency: f32,
    pub mean_response_time_secs: f32,
    pub mean_acceptance: f32,
    /// Top-2 preferred recommendation signals.
    pub top_algorithms: Vec<String>,
    /// Top-2 dominant time patterns.
    pub top_time_patterns: Vec<String>,
}

/// Full output of one clustering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    pub k: usize,
    pub assignments: Vec<ClusterAssignment>,
    pub profiles: Vec<ClusterProfile>,
    /// WCSS per k from the elbow sweep.
    pub wcss: Vec<f32>,
    /// When this run was computed.
    pub computed_at: DateTime<Utc>,
    /// True when served from the cache rather than recomputed.
    pub cached: bool,
}

/// Behavioral clustering with builder-style configuration.
///
/// # Examples
///
/// ```no_run
/// use cancha::cluster::BehaviorClustering;
/// use chrono::Utc;
///
/// let records = vec![]; // per-user BehaviorRecords
/// let clustering = BehaviorClustering::new().with_random_state(42);
/// let analysis = clustering.analyze(&records, Utc::now());
/// assert!(analysis.is_err()); // fewer than 3 records
/// ```
#[derive(Debug, Clone)]
pub struct BehaviorClustering {
    max_k: usize,
    random_state: Option<u64>,
}

impl Default for BehaviorClustering {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorClustering {
    /// Defaults: elbow sweep up to k = 6, unseeded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_k: 6,
            random_state: None,
        }
    }

    /// Sets the upper bound of the elbow sweep.
    #[must_use]
    pub fn with_max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Runs the full pipeline over the records.
    ///
    /// # Errors
    ///
    /// Returns [`CanchaError::InsufficientData`] with remediation text when
    /// fewer than [`MIN_RECORDS`] records are available.
    pub fn analyze(
        &self,
        records: &[BehaviorRecord],
        now: DateTime<Utc>,
    ) -> Result<ClusterAnalysis> {
        if records.len() < MIN_RECORDS {
            return Err(CanchaError::insufficient_data(
                records.len(),
                MIN_RECORDS,
                "collect more user feedback before clustering",
            ));
        }

        let rows: Vec<Vec<f32>> = records.iter().map(BehaviorRecord::to_features).collect();
        let data = Matrix::from_rows(&rows).map_err(CanchaError::from)?;

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&data)?;

        let elbow = select_k(&scaled, self.max_k, self.random_state)?;

        let mut kmeans = KMeans::new(elbow.k);
        if let Some(seed) = self.random_state {
            kmeans = kmeans.with_random_state(seed);
        }
        kmeans.fit(&scaled)?;
        let labels = kmeans.labels().to_vec();

        tracing::debug!(
            k = elbow.k,
            n_records = records.len(),
            converged = kmeans.converged(),
            n_iter = kmeans.n_iter(),
            "behavioral clustering complete"
        );

        let assignments = Self::build_assignments(records, &scaled, kmeans.centroids(), &labels);
        let profiles = Self::build_profiles(records, &labels, elbow.k, kmeans.centroids(), &scaler)?;

        Ok(ClusterAnalysis {
            k: elbow.k,
            assignments,
            profiles,
            wcss: elbow.wcss,
            computed_at: now,
            cached: false,
        })
    }

    fn build_assignments(
        records: &[BehaviorRecord],
        scaled: &Matrix<f32>,
        centroids: &Matrix<f32>,
        labels: &[usize],
    ) -> Vec<ClusterAssignment> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let point = scaled.row(i);
                let centroid = centroids.row(labels[i]);
                let distance = (&point - &centroid).norm();
                ClusterAssignment {
                    user_id: record.user_id,
                    cluster: labels[i],
                    distance,
                }
            })
            .collect()
    }

    fn build_profiles(
        records: &[BehaviorRecord],
        labels: &[usize],
        k: usize,
        scaled_centroids: &Matrix<f32>,
        scaler: &StandardScaler,
    ) -> Result<Vec<ClusterProfile>> {
        let original_centroids = scaler.inverse_transform(scaled_centroids)?;

        let mut profiles = Vec::with_capacity(k);
        for cluster in 0..k {
            let members: Vec<&BehaviorRecord> = records
                .iter()
                .zip(labels.iter())
                .filter(|(_, &l)| l == cluster)
                .map(|(r, _)| r)
                .collect();
            let size = members.len();
            if size == 0 {
                // A frozen zero centroid can end up with no members; it has
                // no segment to describe.
                continue;
            }

            let mean = |f: fn(&BehaviorRecord) -> f32| -> f32 {
                members.iter().map(|r| f(r)).sum::<f32>() / size as f32
            };

            let mean_satisfaction = mean(|r| r.satisfaction_rate);
            let mean_engagement = mean(|r| r.engagement_level);
            let mean_frequency = mean(|r| r.feedback_frequency);
            let mean_response_time_secs = mean(|r| r.avg_response_time_secs);
            let mean_acceptance = mean(|r| r.acceptance_rate);

            let mut algo_means = [0.0_f32; 3];
            let mut time_means = [0.0_f32; 4];
            for r in &members {
                for (acc, v) in algo_means.iter_mut().zip(r.algorithm_preference.iter()) {
                    *acc += v;
                }
                for (acc, v) in time_means.iter_mut().zip(r.time_patterns.iter()) {
                    *acc += v;
                }
            }
            for v in &mut algo_means {
                *v /= size as f32;
            }
            for v in &mut time_means {
                *v /= size as f32;
            }

            profiles.push(ClusterProfile {
                cluster,
                size,
                label: segment_label(mean_satisfaction, mean_engagement, mean_frequency)
                    .to_string(),
                centroid: original_centroids.row(cluster).as_slice().to_vec(),
                mean_satisfaction,
                mean_engagement,
                mean_frequency,
                mean_response_time_secs,
                mean_acceptance,
                top_algorithms: top_two(&algo_means, &ALGORITHM_NAMES),
                top_time_patterns: top_two(&time_means, &TIME_PATTERN_NAMES),
            });
        }

        Ok(profiles)
    }
}

/// Rule-based segment label from cluster means. Rules are checked in
/// priority order; the first match wins.
fn segment_label(satisfaction: f32, engagement: f32, frequency: f32) -> &'static str {
    if satisfaction >= 0.8 && engagement >= 0.7 {
        "Highly Satisfied Power Users"
    } else if satisfaction < 0.4 {
        "Dissatisfied Users"
    } else if engagement < 0.3 {
        "Low Engagement Users"
    } else if frequency >= 5.0 {
        "Feedback Champions"
    } else if satisfaction >= 0.6 && engagement >= 0.5 {
        "Regular Active Users"
    } else {
        "Moderate Users"
    }
}

/// Names of the two largest values, ties broken by position.
fn top_two(values: &[f32], names: &[&str]) -> Vec<String> {
    let mut indexed: Vec<(usize, f32)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed
        .iter()
        .take(2)
        .map(|&(i, _)| names[i].to_string())
        .collect()
}

/// Caches the last clustering run for 24 hours.
///
/// `get_or_compute` recomputes when forced, when empty, or when the cached
/// run is older than the TTL; a fresh run fully replaces the prior one.
#[derive(Debug, Clone, Default)]
pub struct ClusterCache {
    entry: Option<ClusterAnalysis>,
}

impl ClusterCache {
    /// Cache time-to-live.
    #[must_use]
    pub fn ttl() -> Duration {
        Duration::hours(24)
    }

    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Returns the cached analysis or computes a fresh one.
    ///
    /// # Errors
    ///
    /// Propagates errors from the compute closure; a failed computation
    /// leaves any prior cached run in place.
    pub fn get_or_compute<F>(
        &mut self,
        force: bool,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<ClusterAnalysis>
    where
        F: FnOnce() -> Result<ClusterAnalysis>,
    {
        if !force {
            if let Some(entry) = &self.entry {
                if now - entry.computed_at < Self::ttl() {
                    let mut hit = entry.clone();
                    hit.cached = true;
                    return Ok(hit);
                }
            }
        }

        let fresh = compute()?;
        self.entry = Some(fresh.clone());
        Ok(fresh)
    }
}
