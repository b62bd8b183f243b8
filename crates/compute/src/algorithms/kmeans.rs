use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::distance::squared_euclidean;
use crate::evaluate::silhouette;

/// Number of clusters used when no candidate `k` can be scored.
pub const DEFAULT_K: usize = 2;

/// Result of a full batch K-means run.
#[derive(Debug, Clone)]
pub struct KmeansResult {
    /// Cluster index of each point, in input order.
    pub labels: Vec<usize>,
    /// Final centroid vectors, indexed by cluster.
    pub centroids: Vec<Vec<f64>>,
    /// Number of clusters requested.
    pub k: usize,
    /// Number of Lloyd's iterations performed.
    pub iterations: usize,
    /// Sum of squared distances from each point to its assigned centroid.
    pub inertia: f64,
}

impl KmeansResult {
    /// Number of distinct labels actually used. Can be below `k` when the
    /// input has fewer distinct points than clusters.
    pub fn distinct_labels(&self) -> usize {
        self.labels.iter().collect::<HashSet<_>>().len()
    }
}

/// Run Lloyd's K-means with seeded K-means++ initialization.
///
/// Iterates until assignments stabilize or `max_iterations` is reached.
/// The same `seed` on the same input always yields the same partition.
///
/// # Panics
/// Panics if `k` is 0, `points` is empty, or `k > points.len()`.
pub fn kmeans(points: &[Vec<f64>], k: usize, max_iterations: usize, seed: u64) -> KmeansResult {
    assert!(!points.is_empty(), "kmeans: points must not be empty");
    assert!(k >= 1, "kmeans: k must be at least 1");
    assert!(k <= points.len(), "kmeans: k must be <= number of points");

    let dim = points[0].len();
    let n = points.len();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = kmeanspp_init(points, k, &mut rng);

    let mut labels = vec![0usize; n];
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;

        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        if !changed && iterations > 1 {
            break;
        }

        let mut new_centroids = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];

        for (i, point) in points.iter().enumerate() {
            let cluster = labels[i];
            counts[cluster] += 1;
            for (j, &val) in point.iter().enumerate() {
                new_centroids[cluster][j] += val;
            }
        }

        for (c, centroid) in new_centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                let count = counts[c] as f64;
                for val in centroid.iter_mut() {
                    *val /= count;
                }
            } else {
                // Empty cluster: keep previous centroid.
                centroid.clone_from(&centroids[c]);
            }
        }

        centroids = new_centroids;
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &c)| squared_euclidean(p, &centroids[c]))
        .sum();

    KmeansResult {
        labels,
        centroids,
        k,
        iterations,
        inertia,
    }
}

/// Run K-means for each `k` in `k_range` and keep the partition with the
/// best cosine silhouette.
///
/// `distances` is the pairwise cosine distance matrix of `points`. A
/// candidate is only scored when its partition has more than one distinct
/// label, and it must beat the incumbent strictly. When the range is `None`
/// or nothing is scored, [`DEFAULT_K`] is used.
pub fn optimal_kmeans(
    points: &[Vec<f64>],
    distances: &[Vec<f64>],
    k_range: Option<RangeInclusive<usize>>,
    max_iterations: usize,
    seed: u64,
) -> KmeansResult {
    assert!(points.len() >= 2, "optimal_kmeans: need at least 2 points");

    let mut best: Option<KmeansResult> = None;
    let mut best_score = -1.0;

    for k in k_range.into_iter().flatten() {
        let result = kmeans(points, k, max_iterations, seed);
        if result.distinct_labels() < 2 {
            debug!(k, "k-means collapsed to one label, skipped");
            continue;
        }

        let score = silhouette(distances, &result.labels);
        debug!(k, score, "k-means candidate");
        if score > best_score {
            best_score = score;
            best = Some(result);
        }
    }

    best.unwrap_or_else(|| kmeans(points, DEFAULT_K.min(points.len()), max_iterations, seed))
}

// ── Internal helpers ─────────────────────────────────────────

/// K-means++ initialization: first centroid uniform, the rest by
/// D²-weighted sampling.
fn kmeanspp_init(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_euclidean(p, &centroids[0]))
        .collect();

    for _ in 1..k {
        let total: f64 = closest.iter().sum();
        let idx = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.gen_range(0..n)
        };

        let centroid = points[idx].clone();
        for (c, p) in closest.iter_mut().zip(points) {
            *c = c.min(squared_euclidean(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Find the index of the nearest centroid.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}
