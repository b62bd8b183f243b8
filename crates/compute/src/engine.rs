use std::ops::RangeInclusive;
use std::time::Instant;

use tabgroup_core::{Algorithm, Metrics, Result, Settings, NOISE};
use tracing::{debug, info};

use crate::algorithms::distance::pairwise_cosine;
use crate::algorithms::hdbscan::{hdbscan, HdbscanParams};
use crate::algorithms::kmeans::optimal_kmeans;
use crate::evaluate::evaluate;

/// Seed for k-means++ initialization.
pub const KMEANS_SEED: u64 = 42;
/// Lloyd iteration cap per k-means run.
pub const KMEANS_MAX_ITERATIONS: usize = 100;
/// HDBSCAN cluster selection epsilon, in cosine distance.
pub const HDBSCAN_SELECTION_EPSILON: f64 = 0.3;

/// Labels and metrics from one clustering strategy.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub algorithm: Algorithm,
    /// One label per point, [`NOISE`] for unassigned points.
    pub labels: Vec<i32>,
    pub metrics: Metrics,
}

/// Candidate cluster counts for k-means over `n` points: `2..=min(max_k, n-1)`,
/// or `None` when that range is empty.
pub fn k_search_range(n: usize, max_k: usize) -> Option<RangeInclusive<usize>> {
    let upper = max_k.min(n.saturating_sub(1));
    (upper >= 2).then_some(2..=upper)
}

/// Cluster `points` with the strategy named `name`.
pub fn cluster_by_name(name: &str, points: &[Vec<f64>], settings: &Settings) -> Result<ClusterOutcome> {
    let algorithm: Algorithm = name.parse()?;
    cluster_points(algorithm, points, settings)
}

/// Cluster `points` with `algorithm` and score the result.
///
/// Empty input yields no labels and zeroed metrics. Input whose rows are all
/// identical is labelled entirely as noise.
pub fn cluster_points(
    algorithm: Algorithm,
    points: &[Vec<f64>],
    settings: &Settings,
) -> Result<ClusterOutcome> {
    let n = points.len();
    if n == 0 {
        return Ok(ClusterOutcome {
            algorithm,
            labels: Vec::new(),
            metrics: Metrics::zeroed(),
        });
    }
    if points.windows(2).all(|w| w[0] == w[1]) {
        debug!(%algorithm, points = n, "all points identical, labelling as noise");
        return Ok(ClusterOutcome {
            algorithm,
            labels: vec![NOISE; n],
            metrics: Metrics {
                noise_points: n,
                ..Metrics::zeroed()
            },
        });
    }

    let distances = pairwise_cosine(points);
    let labels: Vec<i32> = match algorithm {
        Algorithm::Kmeans => {
            let range = k_search_range(n, settings.num_clusters);
            let result = optimal_kmeans(points, &distances, range, KMEANS_MAX_ITERATIONS, KMEANS_SEED);
            debug!(k = result.k, iterations = result.iterations, "k-means selected");
            result.labels.iter().map(|&l| l as i32).collect()
        }
        Algorithm::Hdbscan => {
            let params = HdbscanParams {
                min_cluster_size: settings.hdbscan_min_cluster_size(),
                min_samples: None,
                cluster_selection_epsilon: HDBSCAN_SELECTION_EPSILON,
            };
            let result = hdbscan(&distances, &params);
            debug!(
                clusters = result.num_clusters,
                noise = result.noise_points(),
                "hdbscan finished"
            );
            result.labels
        }
    };

    let metrics = evaluate(points, &labels)?;
    Ok(ClusterOutcome {
        algorithm,
        labels,
        metrics,
    })
}

/// Runs every clustering strategy over the same reduced points.
pub struct ClusterEngine;

impl ClusterEngine {
    /// Run all strategies in [`Algorithm::ALL`] order.
    pub fn run_all(points: &[Vec<f64>], settings: &Settings) -> Result<Vec<ClusterOutcome>> {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(Algorithm::ALL.len());

        for algorithm in Algorithm::ALL {
            let algo_start = Instant::now();
            let outcome = cluster_points(algorithm, points, settings)?;
            info!(
                %algorithm,
                clusters = outcome.metrics.num_clusters,
                noise = outcome.metrics.noise_points,
                silhouette = outcome.metrics.silhouette_score,
                "  {} done in {:.1}ms",
                algorithm,
                algo_start.elapsed().as_secs_f64() * 1000.0
            );
            outcomes.push(outcome);
        }

        debug!(
            points = points.len(),
            "clustering complete in {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(outcomes)
    }
}
