//! Evaluation metrics for clustering and vector similarity.

use crate::primitives::Matrix;

/// Within-cluster sum of squared distances (WCSS).
///
/// Lower is better; used by the elbow method to compare k values.
///
/// # Examples
///
/// ```
/// use cancha::primitives::Matrix;
/// use cancha::metrics::inertia;
///
/// let data = Matrix::from_vec(2, 1, vec![0.0, 2.0]).unwrap();
/// let centroids = Matrix::from_vec(1, 1, vec![1.0]).unwrap();
/// assert!((inertia(&data, &centroids, &[0, 0]) - 2.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn inertia(data: &Matrix<f32>, centroids: &Matrix<f32>, labels: &[usize]) -> f32 {
    let mut total = 0.0;

    for (i, &label) in labels.iter().enumerate() {
        let point = data.row(i);
        let centroid = centroids.row(label);
        let diff = &point - &centroid;
        total += diff.norm_squared();
    }

    total
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero magnitude or lengths differ;
/// a missing embedding contributes nothing rather than erroring.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
