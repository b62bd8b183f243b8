//! Partition quality metrics.
//!
//! Silhouette is measured with cosine distance, Davies–Bouldin and
//! Calinski–Harabasz with Euclidean distance. Noise points (label -1)
//! form a group of their own in all three.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tabgroup_core::{Metrics, Result, TabGroupError, NOISE};

use crate::algorithms::distance::{centroid, euclidean, pairwise_cosine, squared_euclidean};

/// Score a labelled partition of `points`.
///
/// Metric values stay 0 unless there are at least two clusters and more
/// points than clusters. Noise points are scored as one more group. When
/// clusters plus the noise group leave no point to share a label, the
/// metrics are undefined and stay 0. `num_clusters` and `noise_points` are
/// always filled in.
pub fn evaluate(points: &[Vec<f64>], labels: &[i32]) -> Result<Metrics> {
    let clusters: HashSet<i32> = labels.iter().copied().filter(|&l| l != NOISE).collect();
    let noise_points = labels.iter().filter(|&&l| l == NOISE).count();

    let mut metrics = Metrics {
        num_clusters: clusters.len(),
        noise_points,
        ..Metrics::zeroed()
    };

    if clusters.len() < 2 || points.len() <= clusters.len() {
        return Ok(metrics);
    }
    let groups = clusters.len() + usize::from(noise_points > 0);
    if groups >= points.len() {
        return Ok(metrics);
    }

    let distances = pairwise_cosine(points);
    metrics.silhouette_score = silhouette(&distances, labels);
    metrics.davies_bouldin = davies_bouldin(points, labels);
    metrics.calinski_harabasz = calinski_harabasz(points, labels);

    for (name, value) in [
        ("silhouette", metrics.silhouette_score),
        ("davies_bouldin", metrics.davies_bouldin),
        ("calinski_harabasz", metrics.calinski_harabasz),
    ] {
        if !value.is_finite() {
            return Err(TabGroupError::Numerical(format!("{name} is {value}")));
        }
    }

    Ok(metrics)
}

/// Mean silhouette coefficient over a precomputed distance matrix.
///
/// Points in singleton clusters score 0. Returns 0 when fewer than two
/// clusters are present.
pub fn silhouette<L: Copy + Eq + Hash>(distances: &[Vec<f64>], labels: &[L]) -> f64 {
    let n = labels.len();
    let members = group_indices(labels);
    if n <= 1 || members.len() <= 1 {
        return 0.0;
    }

    let total: f64 = (0..n)
        .map(|i| {
            let own = &members[&labels[i]];
            if own.len() <= 1 {
                return 0.0;
            }

            let a = own.iter().filter(|&&j| j != i).map(|&j| distances[i][j]).sum::<f64>()
                / (own.len() - 1) as f64;

            let b = members
                .iter()
                .filter(|(label, _)| **label != labels[i])
                .map(|(_, idx)| idx.iter().map(|&j| distances[i][j]).sum::<f64>() / idx.len() as f64)
                .fold(f64::INFINITY, f64::min);

            let max_ab = a.max(b);
            if max_ab > 0.0 {
                (b - a) / max_ab
            } else {
                0.0
            }
        })
        .sum();

    total / n as f64
}

/// Davies–Bouldin index: mean over clusters of the worst
/// (scatter_i + scatter_j) / centroid_distance ratio. Lower is better.
pub fn davies_bouldin(points: &[Vec<f64>], labels: &[i32]) -> f64 {
    let groups = ordered_groups(labels);
    if groups.len() < 2 {
        return 0.0;
    }
    let dim = points[0].len();

    let centroids: Vec<Vec<f64>> = groups
        .iter()
        .map(|idx| centroid(idx.iter().map(|&i| &points[i]), dim))
        .collect();
    let scatter: Vec<f64> = groups
        .iter()
        .zip(&centroids)
        .map(|(idx, c)| idx.iter().map(|&i| euclidean(&points[i], c)).sum::<f64>() / idx.len() as f64)
        .collect();

    let k = groups.len();
    let mut centroid_dist = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let d = euclidean(&centroids[i], &centroids[j]);
            centroid_dist[i][j] = d;
            centroid_dist[j][i] = d;
        }
    }

    let near_zero = |x: &f64| x.abs() < 1e-12;
    if scatter.iter().all(near_zero) || centroid_dist.iter().flatten().all(near_zero) {
        return 0.0;
    }

    let worst: f64 = (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i)
                .map(|j| {
                    let d = centroid_dist[i][j];
                    if d > 0.0 {
                        (scatter[i] + scatter[j]) / d
                    } else {
                        0.0
                    }
                })
                .fold(0.0, f64::max)
        })
        .sum();

    worst / k as f64
}

/// Calinski–Harabasz index: between-cluster over within-cluster dispersion,
/// scaled by degrees of freedom. Higher is better. Returns 1.0 when the
/// within-cluster dispersion is zero.
pub fn calinski_harabasz(points: &[Vec<f64>], labels: &[i32]) -> f64 {
    let groups = ordered_groups(labels);
    let n = points.len();
    let k = groups.len();
    if k < 2 || n <= k {
        return 0.0;
    }
    let dim = points[0].len();
    let overall = centroid(points, dim);

    let mut between = 0.0;
    let mut within = 0.0;
    for idx in &groups {
        let c = centroid(idx.iter().map(|&i| &points[i]), dim);
        between += idx.len() as f64 * squared_euclidean(&c, &overall);
        within += idx.iter().map(|&i| squared_euclidean(&points[i], &c)).sum::<f64>();
    }

    if within == 0.0 {
        1.0
    } else {
        between * (n - k) as f64 / (within * (k - 1) as f64)
    }
}

fn group_indices<L: Copy + Eq + Hash>(labels: &[L]) -> HashMap<L, Vec<usize>> {
    let mut members: HashMap<L, Vec<usize>> = HashMap::new();
    for (i, &l) in labels.iter().enumerate() {
        members.entry(l).or_default().push(i);
    }
    members
}

/// Member indices per label, in order of first appearance.
fn ordered_groups(labels: &[i32]) -> Vec<Vec<usize>> {
    let mut order: Vec<i32> = Vec::new();
    let mut members = group_indices(labels);
    for &l in labels {
        if !order.contains(&l) {
            order.push(l);
        }
    }
    order.iter().filter_map(|l| members.remove(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> (Vec<Vec<f64>>, Vec<i32>) {
        let points = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.1],
            vec![1.0, -0.1],
            vec![0.0, 1.0],
            vec![0.1, 1.0],
            vec![-0.1, 1.0],
        ];
        (points, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn separated_blobs_score_well() {
        let (points, labels) = two_blobs();
        let m = evaluate(&points, &labels).unwrap();
        assert_eq!(m.num_clusters, 2);
        assert_eq!(m.noise_points, 0);
        assert!(m.silhouette_score > 0.9, "silhouette = {}", m.silhouette_score);
        assert!(m.davies_bouldin < 0.2, "db = {}", m.davies_bouldin);
        assert!(m.calinski_harabasz > 50.0, "ch = {}", m.calinski_harabasz);
    }

    #[test]
    fn single_cluster_leaves_metrics_zero() {
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let m = evaluate(&points, &[0, 0, 0]).unwrap();
        assert_eq!(m.num_clusters, 1);
        assert_eq!(m.silhouette_score, 0.0);
        assert_eq!(m.davies_bouldin, 0.0);
        assert_eq!(m.calinski_harabasz, 0.0);
    }

    #[test]
    fn one_point_per_cluster_leaves_metrics_zero() {
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let m = evaluate(&points, &[0, 1]).unwrap();
        assert_eq!(m.num_clusters, 2);
        assert_eq!(m.silhouette_score, 0.0);
    }

    #[test]
    fn noise_is_scored_as_its_own_group() {
        let (mut points, mut labels) = two_blobs();
        points.push(vec![-1.0, -1.0]);
        labels.push(NOISE);

        let with_noise = evaluate(&points, &labels).unwrap();
        let (clean_points, clean_labels) = two_blobs();
        let clean = evaluate(&clean_points, &clean_labels).unwrap();

        assert_eq!(with_noise.noise_points, 1);
        assert_eq!(with_noise.num_clusters, 2);
        // The lone noise point scores 0 and is farther from both blobs than
        // they are from each other, so the blob members keep their scores.
        let expected = clean.silhouette_score * 6.0 / 7.0;
        assert!((with_noise.silhouette_score - expected).abs() < 1e-12);
        assert!(with_noise.davies_bouldin > 0.0);
        assert!(with_noise.calinski_harabasz > 0.0);
    }

    #[test]
    fn gate_counts_noise_points() {
        // Two singleton clusters plus two noise points: four points, two clusters.
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.1], vec![-1.0, -0.1]];
        let m = evaluate(&points, &[0, 1, NOISE, NOISE]).unwrap();
        assert_eq!(m.num_clusters, 2);
        assert_eq!(m.noise_points, 2);
        assert!(m.silhouette_score > 0.4, "silhouette = {}", m.silhouette_score);
        assert!(m.davies_bouldin > 0.0);
        assert!(m.calinski_harabasz > 0.0);
    }

    #[test]
    fn every_point_in_its_own_group_is_unscored() {
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]];
        let m = evaluate(&points, &[0, 1, NOISE]).unwrap();
        assert_eq!(m.num_clusters, 2);
        assert_eq!(m.silhouette_score, 0.0);
        assert_eq!(m.davies_bouldin, 0.0);
        assert_eq!(m.calinski_harabasz, 0.0);
    }

    #[test]
    fn all_noise() {
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let m = evaluate(&points, &[NOISE, NOISE]).unwrap();
        assert_eq!(m.num_clusters, 0);
        assert_eq!(m.noise_points, 2);
    }

    #[test]
    fn singleton_cluster_silhouette_is_zero() {
        let points = vec![vec![1.0, 0.0], vec![1.0, 0.01], vec![0.0, 1.0]];
        let d = pairwise_cosine(&points);
        let labels = [0, 0, 1];
        let s = silhouette(&d, &labels);
        // Two near-perfect members plus a zero for the singleton.
        assert!(s > 0.6 && s < 0.67, "silhouette = {s}");
    }

    #[test]
    fn calinski_harabasz_zero_dispersion_is_one() {
        let points = vec![vec![0.0, 0.0], vec![0.0, 0.0], vec![5.0, 5.0], vec![5.0, 5.0]];
        assert_eq!(calinski_harabasz(&points, &[0, 0, 1, 1]), 1.0);
    }

    #[test]
    fn davies_bouldin_known_value() {
        // Scatter 1 in each cluster, centroids 10 apart.
        let points = vec![vec![-1.0, 0.0], vec![1.0, 0.0], vec![9.0, 0.0], vec![11.0, 0.0]];
        let db = davies_bouldin(&points, &[0, 0, 1, 1]);
        assert!((db - 0.2).abs() < 1e-12);
    }
}
