//! Clustering algorithms for behavioral segmentation.
//!
//! K-Means with random min/max initialization, plus elbow-based model
//! selection and the behavioral analysis pipeline built on top.

mod analysis;
mod elbow;

pub use analysis::{
    BehaviorClustering, ClusterAnalysis, ClusterAssignment, ClusterCache, ClusterProfile,
    MIN_RECORDS,
};
pub use elbow::{select_k, ElbowResult};

use crate::error::{CanchaError, Result};
use crate::metrics::inertia;
use crate::primitives::Matrix;
use crate::traits::UnsupervisedEstimator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// K-Means clustering.
///
/// Lloyd's algorithm with centroids initialized uniformly at random within
/// each feature's observed min/max range. A cluster that loses all its
/// members is frozen at the zero centroid for that iteration (logged, not
/// an error).
///
/// # Examples
///
/// ```
/// use cancha::prelude::*;
///
/// let data = Matrix::from_vec(6, 2, vec![
///     1.0, 2.0,
///     1.5, 1.8,
///     1.0, 0.6,
///     8.0, 8.0,
///     9.0, 11.0,
///     8.5, 9.0,
/// ]).unwrap();
///
/// let mut kmeans = KMeans::new(2).with_random_state(42);
/// kmeans.fit(&data).unwrap();
/// let labels = kmeans.predict(&data);
/// assert_eq!(labels[0], labels[1]);
/// assert_ne!(labels[0], labels[3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    /// Number of clusters.
    n_clusters: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on centroid movement.
    tol: f32,
    /// Random seed for initialization.
    random_state: Option<u64>,
    /// Cluster centroids after fitting.
    centroids: Option<Matrix<f32>>,
    /// Labels for training data.
    labels: Option<Vec<usize>>,
    /// Sum of squared distances (inertia).
    inertia: f32,
    /// Number of iterations run.
    n_iter: usize,
    /// Whether fit converged within max_iter.
    converged: bool,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(4)
    }
}

impl KMeans {
    /// Creates a new K-Means with the specified number of clusters.
    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 100,
            tol: 1e-4,
            random_state: None,
            centroids: None,
            labels: None,
            inertia: 0.0,
            n_iter: 0,
            converged: false,
        }
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Returns the cluster centroids.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    #[must_use]
    pub fn centroids(&self) -> &Matrix<f32> {
        self.centroids
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the labels assigned to the training data.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        self.labels
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the inertia (within-cluster sum of squares).
    #[must_use]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Returns the number of iterations run.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Returns true if the last fit converged within max_iter.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.centroids.is_some()
    }

    /// Initializes centroids uniformly at random within each feature's
    /// observed min/max range.
    fn random_init(&self, x: &Matrix<f32>) -> Matrix<f32> {
        let (n_samples, n_features) = x.shape();

        let mut mins = vec![f32::INFINITY; n_features];
        let mut maxs = vec![f32::NEG_INFINITY; n_features];
        for i in 0..n_samples {
            for j in 0..n_features {
                let v = x.get(i, j);
                if v < mins[j] {
                    mins[j] = v;
                }
                if v > maxs[j] {
                    maxs[j] = v;
                }
            }
        }

        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut data = Vec::with_capacity(self.n_clusters * n_features);
        for _ in 0..self.n_clusters {
            for j in 0..n_features {
                data.push(rng.gen_range(mins[j]..=maxs[j]));
            }
        }

        Matrix::from_vec(self.n_clusters, n_features, data)
            .expect("centroid matrix dimensions are consistent by construction")
    }

    /// Assigns each sample to the nearest centroid.
    fn assign_labels(&self, x: &Matrix<f32>, centroids: &Matrix<f32>) -> Vec<usize> {
        let n_samples = x.n_rows();
        let mut labels = vec![0; n_samples];

        for (i, label) in labels.iter_mut().enumerate() {
            let point = x.row(i);
            let mut min_dist = f32::INFINITY;
            let mut min_cluster = 0;

            for k in 0..self.n_clusters {
                let centroid = centroids.row(k);
                let diff = &point - &centroid;
                let dist = diff.norm_squared();

                if dist < min_dist {
                    min_dist = dist;
                    min_cluster = k;
                }
            }

            *label = min_cluster;
        }

        labels
    }

    /// Updates centroids as the mean of assigned samples. An empty cluster
    /// gets the zero centroid for this iteration.
    fn update_centroids(&self, x: &Matrix<f32>, labels: &[usize]) -> Matrix<f32> {
        let (_, n_features) = x.shape();
        let mut new_centroids = vec![0.0; self.n_clusters * n_features];
        let mut counts = vec![0usize; self.n_clusters];

        for (i, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for j in 0..n_features {
                new_centroids[label * n_features + j] += x.get(i, j);
            }
        }

        for k in 0..self.n_clusters {
            if counts[k] > 0 {
                for j in 0..n_features {
                    new_centroids[k * n_features + j] /= counts[k] as f32;
                }
            } else {
                tracing::warn!(cluster = k, "empty cluster, centroid frozen at zero");
            }
        }

        Matrix::from_vec(self.n_clusters, n_features, new_centroids)
            .expect("centroid matrix dimensions are consistent by construction")
    }

    /// Maximum Euclidean movement across all centroids.
    fn max_centroid_movement(old: &Matrix<f32>, new: &Matrix<f32>) -> f32 {
        let (n_clusters, n_features) = old.shape();
        let mut max_move: f32 = 0.0;

        for k in 0..n_clusters {
            let mut dist_sq = 0.0;
            for j in 0..n_features {
                let diff = old.get(k, j) - new.get(k, j);
                dist_sq += diff * diff;
            }
            max_move = max_move.max(dist_sq.sqrt());
        }

        max_move
    }
}

impl UnsupervisedEstimator for KMeans {
    type Labels = Vec<usize>;

    /// Fits the K-Means model to data.
    ///
    /// # Errors
    ///
    /// Returns an error if `n_clusters` is zero or the data has fewer
    /// samples than clusters.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let n_samples = x.n_rows();

        if self.n_clusters == 0 {
            return Err(CanchaError::InvalidHyperparameter {
                param: "n_clusters".to_string(),
                value: "0".to_string(),
                constraint: "> 0".to_string(),
            });
        }
        if n_samples < self.n_clusters {
            return Err(CanchaError::insufficient_data(
                n_samples,
                self.n_clusters,
                "number of samples must be >= number of clusters",
            ));
        }

        let mut centroids = self.random_init(x);
        let mut labels = vec![0; n_samples];
        self.converged = false;

        for iter in 0..self.max_iter {
            labels = self.assign_labels(x, &centroids);
            let new_centroids = self.update_centroids(x, &labels);

            let movement = Self::max_centroid_movement(&centroids, &new_centroids);
            centroids = new_centroids;
            self.n_iter = iter + 1;

            if movement < self.tol {
                self.converged = true;
                break;
            }
        }

        self.inertia = inertia(x, &centroids, &labels);
        self.labels = Some(labels);
        self.centroids = Some(centroids);

        Ok(())
    }

    /// Predicts cluster labels for new data.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Vec<usize> {
        let centroids = self
            .centroids
            .as_ref()
            .expect("Model not fitted. Call fit() first.");

        self.assign_labels(x, centroids)
    }
}
