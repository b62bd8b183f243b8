//! Uniform Manifold Approximation and Projection (UMAP).
//!
//! Builds a fuzzy k-nearest-neighbour graph under cosine distance, then
//! lays it out with negative-sampling SGD from a seeded random start. The
//! whole run is deterministic for a given seed.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabgroup_core::{Result, TabGroupError};

use super::distance::{cosine, squared_euclidean};

/// Curve parameters fitted for `min_dist = 0.1`, `spread = 1.0`.
const CURVE_A: f64 = 1.576_943_460_405_378;
const CURVE_B: f64 = 0.895_060_878_122_785_9;

const GRADIENT_CLIP: f64 = 4.0;
const INIT_RANGE: f64 = 10.0;
const SIGMA_SEARCH_STEPS: usize = 64;
const SIGMA_TOLERANCE: f64 = 1e-5;
const MIN_SIGMA_SCALE: f64 = 1e-3;

/// Weighted symmetric graph. Each undirected edge appears in both directions.
#[derive(Debug, Clone)]
struct FuzzyGraph {
    n_points: usize,
    edges: Vec<(usize, usize, f64)>,
}

#[derive(Debug, Clone)]
pub struct Umap {
    n_components: usize,
    n_neighbors: usize,
    n_epochs: usize,
    learning_rate: f64,
    negative_sample_rate: usize,
    seed: u64,
}

impl Default for Umap {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Umap {
    pub fn builder() -> UmapBuilder {
        UmapBuilder::default()
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Fit on `data` and return the low-dimensional layout, one row per input.
    pub fn fit_transform(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let n = data.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let dim = data[0].len();
        if let Some(row) = data.iter().find(|r| r.len() != dim) {
            return Err(TabGroupError::DimensionMismatch {
                expected: dim,
                actual: row.len(),
            });
        }
        if n == 1 {
            return Ok(vec![vec![0.0; self.n_components]]);
        }

        let graph = self.build_fuzzy_graph(data);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut embedding: Vec<Vec<f64>> = (0..n)
            .map(|_| {
                (0..self.n_components)
                    .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
                    .collect()
            })
            .collect();

        self.optimize_embedding(&mut embedding, &graph, &mut rng);

        if embedding.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TabGroupError::Numerical(
                "manifold layout diverged".to_string(),
            ));
        }
        Ok(embedding)
    }

    fn build_fuzzy_graph(&self, data: &[Vec<f64>]) -> FuzzyGraph {
        let n = data.len();
        let k = self.n_neighbors.clamp(1, n - 1);

        let mut neighbors = Vec::with_capacity(n);
        let mut knn_distances = Vec::with_capacity(n);
        for i in 0..n {
            let mut dists: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, cosine(&data[i], &data[j])))
                .collect();
            dists.sort_by(|a, b| a.1.total_cmp(&b.1));
            dists.truncate(k);

            neighbors.push(dists.iter().map(|&(j, _)| j).collect::<Vec<_>>());
            knn_distances.push(dists.iter().map(|&(_, d)| d).collect::<Vec<_>>());
        }

        // Local connectivity: distance to the nearest distinct neighbour.
        let rho: Vec<f64> = knn_distances
            .iter()
            .map(|d| d.iter().copied().find(|&x| x > 0.0).unwrap_or(0.0))
            .collect();

        let target = ((k + 1) as f64).log2();
        let sigma: Vec<f64> = (0..n)
            .map(|i| find_sigma(&knn_distances[i], rho[i], target))
            .collect();

        // Fuzzy union a + b - ab; ordered map keeps edge order reproducible.
        let mut directed: BTreeMap<(usize, usize), (f64, f64)> = BTreeMap::new();
        for i in 0..n {
            for (&j, &d) in neighbors[i].iter().zip(&knn_distances[i]) {
                let w = if d <= rho[i] {
                    1.0
                } else {
                    (-(d - rho[i]) / sigma[i]).exp()
                };
                let entry = directed.entry((i.min(j), i.max(j))).or_insert((0.0, 0.0));
                if i < j {
                    entry.0 = w;
                } else {
                    entry.1 = w;
                }
            }
        }

        let mut edges = Vec::with_capacity(directed.len() * 2);
        for ((i, j), (w1, w2)) in directed {
            let w = w1 + w2 - w1 * w2;
            if w > 0.0 {
                edges.push((i, j, w));
                edges.push((j, i, w));
            }
        }

        // Drop edges too weak to be sampled even once.
        let max_w = edges.iter().map(|e| e.2).fold(0.0, f64::max);
        let floor = max_w / self.n_epochs as f64;
        edges.retain(|e| e.2 >= floor);

        FuzzyGraph { n_points: n, edges }
    }

    fn optimize_embedding(&self, embedding: &mut [Vec<f64>], graph: &FuzzyGraph, rng: &mut StdRng) {
        if graph.edges.is_empty() {
            return;
        }
        let n = graph.n_points;
        let (a, b) = (CURVE_A, CURVE_B);

        let max_w = graph.edges.iter().map(|e| e.2).fold(0.0, f64::max);
        let epochs_per_sample: Vec<f64> = graph.edges.iter().map(|e| max_w / e.2).collect();
        let epochs_per_negative: Vec<f64> = epochs_per_sample
            .iter()
            .map(|e| e / self.negative_sample_rate.max(1) as f64)
            .collect();
        let mut next_sample = epochs_per_sample.clone();
        let mut next_negative = epochs_per_negative.clone();

        for epoch in 0..self.n_epochs {
            let alpha = self.learning_rate * (1.0 - epoch as f64 / self.n_epochs as f64);
            let now = epoch as f64;

            for (idx, &(i, j, _)) in graph.edges.iter().enumerate() {
                if next_sample[idx] > now {
                    continue;
                }

                let dist_sq = squared_euclidean(&embedding[i], &embedding[j]);
                let coeff = if dist_sq > 0.0 {
                    -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
                } else {
                    0.0
                };
                for d in 0..self.n_components {
                    let grad = (coeff * (embedding[i][d] - embedding[j][d]))
                        .clamp(-GRADIENT_CLIP, GRADIENT_CLIP);
                    embedding[i][d] += grad * alpha;
                    embedding[j][d] -= grad * alpha;
                }
                next_sample[idx] += epochs_per_sample[idx];

                let n_neg = ((now - next_negative[idx]) / epochs_per_negative[idx]).max(0.0) as usize;
                for _ in 0..n_neg {
                    let k = rng.gen_range(0..n);
                    if k == i {
                        continue;
                    }
                    let dist_sq = squared_euclidean(&embedding[i], &embedding[k]);
                    let coeff = if dist_sq > 0.0 {
                        2.0 * b / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0))
                    } else if k == j {
                        continue;
                    } else {
                        0.0
                    };
                    for d in 0..self.n_components {
                        let grad = if coeff > 0.0 {
                            (coeff * (embedding[i][d] - embedding[k][d]))
                                .clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
                        } else {
                            GRADIENT_CLIP
                        };
                        embedding[i][d] += grad * alpha;
                    }
                }
                next_negative[idx] += n_neg as f64 * epochs_per_negative[idx];
            }
        }
    }
}

/// Binary search for the bandwidth whose membership sum hits `target`.
fn find_sigma(distances: &[f64], rho: f64, target: f64) -> f64 {
    let mut lo = 0.0;
    let mut hi = f64::INFINITY;
    let mut sigma = 1.0;

    for _ in 0..SIGMA_SEARCH_STEPS {
        let sum: f64 = distances
            .iter()
            .map(|&d| if d > rho { (-(d - rho) / sigma).exp() } else { 1.0 })
            .sum();

        if (sum - target).abs() < SIGMA_TOLERANCE {
            break;
        }
        if sum > target {
            hi = sigma;
            sigma = (lo + hi) / 2.0;
        } else {
            lo = sigma;
            sigma = if hi.is_infinite() { sigma * 2.0 } else { (lo + hi) / 2.0 };
        }
    }

    let mean = distances.iter().sum::<f64>() / distances.len().max(1) as f64;
    sigma.max(MIN_SIGMA_SCALE * mean)
}

/// Builder for [`Umap`].
#[derive(Debug, Clone)]
pub struct UmapBuilder {
    n_components: usize,
    n_neighbors: usize,
    n_epochs: usize,
    learning_rate: f64,
    negative_sample_rate: usize,
    seed: u64,
}

impl Default for UmapBuilder {
    fn default() -> Self {
        Self {
            n_components: 2,
            n_neighbors: 15,
            n_epochs: 500,
            learning_rate: 1.0,
            negative_sample_rate: 5,
            seed: 42,
        }
    }
}

impl UmapBuilder {
    pub fn n_components(mut self, n: usize) -> Self {
        self.n_components = n.max(1);
        self
    }

    pub fn n_neighbors(mut self, n: usize) -> Self {
        self.n_neighbors = n;
        self
    }

    pub fn n_epochs(mut self, n: usize) -> Self {
        self.n_epochs = n.max(1);
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }

    pub fn build(self) -> Umap {
        Umap {
            n_components: self.n_components,
            n_neighbors: self.n_neighbors,
            n_epochs: self.n_epochs,
            learning_rate: self.learning_rate,
            negative_sample_rate: self.negative_sample_rate,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::distance::euclidean;

    /// Two groups of six points pointing in orthogonal directions.
    fn two_groups() -> Vec<Vec<f64>> {
        let mut data = Vec::new();
        for i in 0..6 {
            let mut v = vec![0.0; 8];
            v[0] = 1.0;
            v[2 + i % 3] = 0.1 * (i as f64 + 1.0);
            data.push(v);
        }
        for i in 0..6 {
            let mut v = vec![0.0; 8];
            v[1] = 1.0;
            v[5 + i % 3] = 0.1 * (i as f64 + 1.0);
            data.push(v);
        }
        data
    }

    fn umap() -> Umap {
        Umap::builder().n_components(3).n_neighbors(3).build()
    }

    #[test]
    fn output_shape() {
        let out = umap().fit_transform(&two_groups()).unwrap();
        assert_eq!(out.len(), 12);
        assert!(out.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn groups_stay_apart() {
        let out = umap().fit_transform(&two_groups()).unwrap();

        let mean = |pairs: Vec<(usize, usize)>| {
            let total: f64 = pairs.iter().map(|&(i, j)| euclidean(&out[i], &out[j])).sum();
            total / pairs.len() as f64
        };
        let within: Vec<(usize, usize)> = (0..6)
            .flat_map(|i| ((i + 1)..6).map(move |j| (i, j)))
            .chain((6..12).flat_map(|i| ((i + 1)..12).map(move |j| (i, j))))
            .collect();
        let between: Vec<(usize, usize)> = (0..6).flat_map(|i| (6..12).map(move |j| (i, j))).collect();

        let w = mean(within);
        let b = mean(between);
        assert!(b > 2.0 * w, "within = {w}, between = {b}");
    }

    #[test]
    fn deterministic_for_a_seed() {
        let data = two_groups();
        assert_eq!(umap().fit_transform(&data).unwrap(), umap().fit_transform(&data).unwrap());
    }

    #[test]
    fn single_point_maps_to_origin() {
        let out = umap().fit_transform(&[vec![1.0, 2.0]]).unwrap();
        assert_eq!(out, vec![vec![0.0; 3]]);
    }

    #[test]
    fn sigma_hits_target() {
        let distances = [0.1, 0.2, 0.4];
        let rho = 0.1;
        let target = 4f64.log2();
        let sigma = find_sigma(&distances, rho, target);
        let sum: f64 = distances
            .iter()
            .map(|&d| if d > rho { (-(d - rho) / sigma).exp() } else { 1.0 })
            .sum();
        assert!((sum - target).abs() < 1e-4);
    }
}
