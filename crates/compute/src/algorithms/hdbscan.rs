//! HDBSCAN over a precomputed distance matrix.
//!
//! Core distances → mutual reachability → minimum spanning tree → single
//! linkage hierarchy → condensed tree → excess-of-mass selection, followed
//! by an epsilon merge that lifts selected clusters born below
//! `cluster_selection_epsilon` up to their first ancestor born above it.
//! The root is never selected, so a single dense blob is reported as noise.

use std::collections::{HashMap, HashSet};

use tabgroup_core::NOISE;

/// Lambda used in place of `1 / 0` for merges at zero distance.
const MAX_LAMBDA: f64 = 1e12;

/// Result of HDBSCAN clustering.
#[derive(Debug, Clone)]
pub struct HdbscanResult {
    /// Cluster label per point in input order; [`NOISE`] for noise.
    pub labels: Vec<i32>,
    /// Number of clusters found.
    pub num_clusters: usize,
}

impl HdbscanResult {
    fn all_noise(n: usize) -> Self {
        Self {
            labels: vec![NOISE; n],
            num_clusters: 0,
        }
    }

    pub fn noise_points(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HdbscanParams {
    /// Smallest group reported as a cluster. Values below 2 are raised to 2.
    pub min_cluster_size: usize,
    /// Neighbour rank used for core distances. Defaults to `min_cluster_size`.
    pub min_samples: Option<usize>,
    /// Clusters born closer than this distance are merged upward.
    pub cluster_selection_epsilon: f64,
}

/// Run HDBSCAN on a symmetric `n × n` distance matrix.
pub fn hdbscan(distances: &[Vec<f64>], params: &HdbscanParams) -> HdbscanResult {
    let n = distances.len();
    let min_cluster_size = params.min_cluster_size.max(2);
    if n < min_cluster_size {
        return HdbscanResult::all_noise(n);
    }
    let min_samples = params.min_samples.unwrap_or(min_cluster_size).clamp(1, n);

    let core = core_distances(distances, min_samples);
    let mst = prim_mst(distances, &core);
    let hierarchy = single_linkage(n, mst);
    let tree = condense(&hierarchy, n, min_cluster_size);
    if tree.is_empty() {
        return HdbscanResult::all_noise(n);
    }

    let stability = stability(&tree, n);
    let mut selected = excess_of_mass(&tree, &stability, n);
    if params.cluster_selection_epsilon > 0.0 && !selected.is_empty() {
        selected = epsilon_search(&tree, &selected, params.cluster_selection_epsilon, n);
    }

    label_points(&tree, &selected, n)
}

// ── Hierarchy construction ───────────────────────────────────

/// Distance from each point to its `min_samples`-th nearest point,
/// counting the point itself.
fn core_distances(distances: &[Vec<f64>], min_samples: usize) -> Vec<f64> {
    distances
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(f64::total_cmp);
            sorted[min_samples - 1]
        })
        .collect()
}

/// Prim's algorithm over the dense mutual reachability graph.
/// Returns `(a, b, weight)` edges.
fn prim_mst(distances: &[Vec<f64>], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = distances.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        let mut next = usize::MAX;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = distances[current][j].max(core[current]).max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                from[j] = current;
            }
            if best[j] < next_weight || next == usize::MAX {
                next_weight = best[j];
                next = j;
            }
        }
        in_tree[next] = true;
        edges.push((from[next], next, next_weight));
        current = next;
    }
    edges
}

/// One merge in the single linkage hierarchy. Node ids below `n` are
/// points; merge `i` creates node `n + i`.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

fn single_linkage(n: usize, mut mst: Vec<(usize, usize, f64)>) -> Vec<Merge> {
    mst.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut parent: Vec<usize> = (0..2 * n).collect();
    let mut size = vec![1usize; 2 * n];

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    mst.into_iter()
        .enumerate()
        .map(|(i, (a, b, distance))| {
            let left = find(&mut parent, a);
            let right = find(&mut parent, b);
            let node = n + i;
            parent[left] = node;
            parent[right] = node;
            size[node] = size[left] + size[right];
            Merge {
                left,
                right,
                distance,
                size: size[node],
            }
        })
        .collect()
}

// ── Condensed tree ───────────────────────────────────────────

/// Edge of the condensed tree. Children below `n` are points, the rest are
/// clusters. Cluster ids start at `n`, which is the root.
#[derive(Debug, Clone, Copy)]
struct CondensedEdge {
    parent: usize,
    child: usize,
    lambda: f64,
    child_size: usize,
}

fn lambda_of(distance: f64) -> f64 {
    if distance > 0.0 {
        (1.0 / distance).min(MAX_LAMBDA)
    } else {
        MAX_LAMBDA
    }
}

fn condense(hierarchy: &[Merge], n: usize, min_cluster_size: usize) -> Vec<CondensedEdge> {
    let root = 2 * n - 2;
    let node_size = |node: usize| if node < n { 1 } else { hierarchy[node - n].size };

    let mut relabel = vec![0usize; 2 * n - 1];
    relabel[root] = n;
    let mut next_label = n + 1;
    let mut ignore = vec![false; 2 * n - 1];
    let mut tree = Vec::new();

    for node in bfs_hierarchy(hierarchy, root, n) {
        if ignore[node] || node < n {
            continue;
        }
        let merge = hierarchy[node - n];
        let lambda = lambda_of(merge.distance);
        let (left, right) = (merge.left, merge.right);
        let (left_size, right_size) = (node_size(left), node_size(right));
        let parent = relabel[node];

        let fall_out = |sub_root: usize, tree: &mut Vec<CondensedEdge>, ignore: &mut [bool]| {
            for sub in bfs_hierarchy(hierarchy, sub_root, n) {
                if sub < n {
                    tree.push(CondensedEdge {
                        parent,
                        child: sub,
                        lambda,
                        child_size: 1,
                    });
                }
                ignore[sub] = true;
            }
        };

        match (left_size >= min_cluster_size, right_size >= min_cluster_size) {
            (true, true) => {
                for (child, child_size) in [(left, left_size), (right, right_size)] {
                    relabel[child] = next_label;
                    tree.push(CondensedEdge {
                        parent,
                        child: next_label,
                        lambda,
                        child_size,
                    });
                    next_label += 1;
                }
            }
            (false, false) => {
                fall_out(left, &mut tree, &mut ignore);
                fall_out(right, &mut tree, &mut ignore);
            }
            (false, true) => {
                relabel[right] = parent;
                fall_out(left, &mut tree, &mut ignore);
            }
            (true, false) => {
                relabel[left] = parent;
                fall_out(right, &mut tree, &mut ignore);
            }
        }
    }

    // Only the root was found: nothing but points hanging off it.
    if tree.iter().all(|e| e.child < n) {
        return Vec::new();
    }
    tree
}

fn bfs_hierarchy(hierarchy: &[Merge], root: usize, n: usize) -> Vec<usize> {
    let mut order = vec![root];
    let mut i = 0;
    while i < order.len() {
        let node = order[i];
        if node >= n {
            let merge = hierarchy[node - n];
            order.push(merge.left);
            order.push(merge.right);
        }
        i += 1;
    }
    order
}

// ── Selection ────────────────────────────────────────────────

fn stability(tree: &[CondensedEdge], n: usize) -> HashMap<usize, f64> {
    let mut births: HashMap<usize, f64> = HashMap::from([(n, 0.0)]);
    for e in tree.iter().filter(|e| e.child >= n) {
        births.insert(e.child, e.lambda);
    }

    let mut stability: HashMap<usize, f64> = births.keys().map(|&c| (c, 0.0)).collect();
    for e in tree {
        let birth = births.get(&e.parent).copied().unwrap_or(0.0);
        *stability.entry(e.parent).or_insert(0.0) += (e.lambda - birth) * e.child_size as f64;
    }
    stability
}

fn child_clusters(tree: &[CondensedEdge], parent: usize, n: usize) -> Vec<usize> {
    tree.iter()
        .filter(|e| e.parent == parent && e.child >= n)
        .map(|e| e.child)
        .collect()
}

fn descendants(tree: &[CondensedEdge], cluster: usize, n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack = child_clusters(tree, cluster, n);
    while let Some(c) = stack.pop() {
        stack.extend(child_clusters(tree, c, n));
        out.push(c);
    }
    out
}

/// Excess-of-mass selection, leaves first. The root is never a candidate.
fn excess_of_mass(tree: &[CondensedEdge], stability: &HashMap<usize, f64>, n: usize) -> HashSet<usize> {
    let mut stability = stability.clone();
    let mut nodes: Vec<usize> = stability.keys().copied().filter(|&c| c != n).collect();
    nodes.sort_unstable_by(|a, b| b.cmp(a));

    let mut is_cluster: HashMap<usize, bool> = nodes.iter().map(|&c| (c, true)).collect();
    for &node in &nodes {
        let subtree: f64 = child_clusters(tree, node, n)
            .iter()
            .map(|c| stability.get(c).copied().unwrap_or(0.0))
            .sum();
        let own = stability.get(&node).copied().unwrap_or(0.0);

        if subtree > own {
            is_cluster.insert(node, false);
            stability.insert(node, subtree);
        } else {
            for d in descendants(tree, node, n) {
                is_cluster.insert(d, false);
            }
        }
    }

    is_cluster.into_iter().filter_map(|(c, keep)| keep.then_some(c)).collect()
}

/// Replace each selected cluster born below `epsilon` (in distance) with
/// its nearest ancestor born above it, stopping below the root.
fn epsilon_search(
    tree: &[CondensedEdge],
    selected: &HashSet<usize>,
    epsilon: f64,
    n: usize,
) -> HashSet<usize> {
    let parent_of: HashMap<usize, usize> =
        tree.iter().filter(|e| e.child >= n).map(|e| (e.child, e.parent)).collect();
    let birth_eps: HashMap<usize, f64> = tree
        .iter()
        .filter(|e| e.child >= n)
        .map(|e| (e.child, 1.0 / e.lambda))
        .collect();

    let mut leaves: Vec<usize> = selected.iter().copied().collect();
    leaves.sort_unstable();

    let mut chosen = HashSet::new();
    let mut processed = HashSet::new();
    for leaf in leaves {
        if processed.contains(&leaf) {
            continue;
        }
        let eps = birth_eps.get(&leaf).copied().unwrap_or(f64::INFINITY);
        if eps >= epsilon {
            chosen.insert(leaf);
            continue;
        }

        let mut node = leaf;
        loop {
            let Some(&parent) = parent_of.get(&node) else { break };
            if parent == n {
                break;
            }
            node = parent;
            if birth_eps.get(&parent).copied().unwrap_or(f64::INFINITY) > epsilon {
                break;
            }
        }
        chosen.insert(node);
        processed.extend(descendants(tree, node, n));
    }

    // Keep the outermost cluster when one chosen cluster contains another.
    let nested: HashSet<usize> = chosen
        .iter()
        .flat_map(|&c| descendants(tree, c, n))
        .collect();
    chosen.retain(|c| !nested.contains(c));
    chosen
}

/// Label each point with its nearest selected ancestor. Labels are numbered
/// in order of cluster id.
fn label_points(tree: &[CondensedEdge], selected: &HashSet<usize>, n: usize) -> HdbscanResult {
    let parent_of: HashMap<usize, usize> = tree.iter().map(|e| (e.child, e.parent)).collect();

    let mut ordered: Vec<usize> = selected.iter().copied().collect();
    ordered.sort_unstable();
    let label_of: HashMap<usize, i32> = ordered
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i as i32))
        .collect();

    let labels = (0..n)
        .map(|point| {
            let mut node = point;
            while let Some(&parent) = parent_of.get(&node) {
                if let Some(&label) = label_of.get(&parent) {
                    return label;
                }
                node = parent;
            }
            NOISE
        })
        .collect();

    HdbscanResult {
        labels,
        num_clusters: ordered.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::distance::euclidean;

    fn matrix(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
        points
            .iter()
            .map(|a| points.iter().map(|b| euclidean(a, b)).collect())
            .collect()
    }

    fn params(min_cluster_size: usize, epsilon: f64) -> HdbscanParams {
        HdbscanParams {
            min_cluster_size,
            min_samples: None,
            cluster_selection_epsilon: epsilon,
        }
    }

    /// Tight groups on a line, `per_group` points each.
    fn groups(centers: &[f64], per_group: usize) -> Vec<Vec<f64>> {
        centers
            .iter()
            .flat_map(|&c| (0..per_group).map(move |i| vec![c + i as f64 * 0.1, 0.0]))
            .collect()
    }

    #[test]
    fn two_separated_groups() {
        let points = groups(&[0.0, 100.0], 5);
        let result = hdbscan(&matrix(&points), &params(3, 0.0));

        assert_eq!(result.num_clusters, 2);
        assert_eq!(result.noise_points(), 0);
        let a = result.labels[0];
        let b = result.labels[5];
        assert_ne!(a, b);
        assert!(result.labels[..5].iter().all(|&l| l == a));
        assert!(result.labels[5..].iter().all(|&l| l == b));
    }

    #[test]
    fn three_groups_with_outlier() {
        let mut points = groups(&[0.0, 50.0, 100.0], 4);
        points.push(vec![1000.0, 1000.0]);
        let result = hdbscan(&matrix(&points), &params(3, 0.0));

        assert_eq!(result.num_clusters, 3);
        assert_eq!(result.labels[12], NOISE);
        assert_eq!(result.noise_points(), 1);
    }

    #[test]
    fn single_blob_is_noise() {
        let points = groups(&[0.0], 6);
        let result = hdbscan(&matrix(&points), &params(3, 0.0));
        assert_eq!(result.num_clusters, 0);
        assert!(result.labels.iter().all(|&l| l == NOISE));
    }

    #[test]
    fn fewer_points_than_min_size_is_noise() {
        let points = vec![vec![0.0], vec![10.0]];
        let result = hdbscan(&matrix(&points), &params(3, 0.3));
        assert_eq!(result.labels, vec![NOISE, NOISE]);
    }

    #[test]
    fn min_cluster_size_below_two_is_raised() {
        let points = groups(&[0.0, 100.0], 3);
        let result = hdbscan(&matrix(&points), &params(0, 0.0));
        assert_eq!(result.num_clusters, 2);
    }

    #[test]
    fn epsilon_merges_close_subclusters() {
        // Two pairs of sub-groups: {0, 1} and {100, 101}. Without epsilon the
        // four sub-groups are separate, with a large epsilon they fold into
        // the two top-level groups.
        let points = groups(&[0.0, 1.0, 100.0, 101.0], 3);
        let d = matrix(&points);

        let fine = hdbscan(&d, &params(3, 0.0));
        let coarse = hdbscan(&d, &params(3, 5.0));

        assert!(fine.num_clusters >= coarse.num_clusters);
        assert_eq!(coarse.num_clusters, 2);
        assert_eq!(coarse.labels[0], coarse.labels[3]);
        assert_eq!(coarse.labels[6], coarse.labels[9]);
        assert_ne!(coarse.labels[0], coarse.labels[6]);
    }

    #[test]
    fn identical_points_do_not_produce_nan() {
        let mut points = vec![vec![0.0, 0.0]; 4];
        points.extend(vec![vec![9.0, 9.0]; 4]);
        let result = hdbscan(&matrix(&points), &params(3, 0.3));
        assert_eq!(result.num_clusters, 2);
    }

    #[test]
    fn deterministic() {
        let points = groups(&[0.0, 20.0, 40.0], 4);
        let d = matrix(&points);
        assert_eq!(hdbscan(&d, &params(2, 0.3)).labels, hdbscan(&d, &params(2, 0.3)).labels);
    }
}
