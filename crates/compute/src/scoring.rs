//! Composite quality score used to pick between clustering strategies.
//!
//! Each metric is mapped onto `[0, 1]` (higher is better) and the parts
//! are combined with fixed weights summing to 1.

use serde::Serialize;
use tabgroup_core::Metrics;

pub const SILHOUETTE_WEIGHT: f64 = 0.4;
pub const DAVIES_BOULDIN_WEIGHT: f64 = 0.2;
pub const CALINSKI_HARABASZ_WEIGHT: f64 = 0.2;
pub const CLUSTER_COUNT_WEIGHT: f64 = 0.1;
pub const NOISE_WEIGHT: f64 = 0.1;

/// Davies–Bouldin values at or above this map to 0.
pub const DAVIES_BOULDIN_CEILING: f64 = 5.0;
/// Calinski–Harabasz values at or above this map to 1.
pub const CALINSKI_HARABASZ_CEILING: f64 = 100.0;
/// Cluster count that scores best.
pub const IDEAL_CLUSTER_COUNT: f64 = 3.5;
/// Distance from the ideal count at which the count score reaches 0.
pub const CLUSTER_COUNT_TOLERANCE: f64 = 1.5;

/// Normalised parts of a composite score, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub silhouette: f64,
    pub davies_bouldin: f64,
    pub calinski_harabasz: f64,
    pub cluster_count: f64,
    pub noise: f64,
    pub total: f64,
}

/// Score `metrics` for a run over `num_points` points.
pub fn composite_score(metrics: &Metrics, num_points: usize) -> ScoreBreakdown {
    let silhouette = (metrics.silhouette_score + 1.0) / 2.0;
    let davies_bouldin = 1.0 - (metrics.davies_bouldin / DAVIES_BOULDIN_CEILING).min(1.0);
    let calinski_harabasz = (metrics.calinski_harabasz / CALINSKI_HARABASZ_CEILING).min(1.0);
    let cluster_count = (1.0
        - (metrics.num_clusters as f64 - IDEAL_CLUSTER_COUNT).abs() / CLUSTER_COUNT_TOLERANCE)
        .clamp(0.0, 1.0);
    let noise = if num_points > 0 {
        1.0 - metrics.noise_points as f64 / num_points as f64
    } else {
        1.0
    };

    let total = SILHOUETTE_WEIGHT * silhouette
        + DAVIES_BOULDIN_WEIGHT * davies_bouldin
        + CALINSKI_HARABASZ_WEIGHT * calinski_harabasz
        + CLUSTER_COUNT_WEIGHT * cluster_count
        + NOISE_WEIGHT * noise;

    ScoreBreakdown {
        silhouette,
        davies_bouldin,
        calinski_harabasz,
        cluster_count,
        noise,
        total,
    }
}
