use rayon::prelude::*;

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

#[inline]
fn norm(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine distance `1 - cos(a, b)`, clamped to `[0, 2]`.
///
/// A zero vector has similarity 0 with everything, so its distance is 1.
#[inline]
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    (1.0 - dot / (na * nb)).clamp(0.0, 2.0)
}

/// Full symmetric cosine distance matrix with a zero diagonal.
pub fn pairwise_cosine(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = points.len();
    (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0.0 } else { cosine(&points[i], &points[j]) })
                .collect()
        })
        .collect()
}

/// Mean of `points`. `points` must be non-empty.
pub fn centroid<'a, I>(points: I, dim: usize) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Vec<f64>>,
{
    let mut sum = vec![0.0; dim];
    let mut count = 0usize;
    for p in points {
        for (s, v) in sum.iter_mut().zip(p.iter()) {
            *s += v;
        }
        count += 1;
    }
    if count > 0 {
        for s in &mut sum {
            *s /= count as f64;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_opposite_vectors() {
        assert!(cosine(&[1.0, 0.0], &[3.0, 0.0]).abs() < 1e-12);
        assert!((cosine(&[1.0, 0.0], &[0.0, 2.0]) - 1.0).abs() < 1e-12);
        assert!((cosine(&[1.0, 1.0], &[-1.0, -1.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_is_at_distance_one() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 1.0);
    }

    #[test]
    fn pairwise_matrix_is_symmetric_with_zero_diagonal() {
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let d = pairwise_cosine(&points);
        for i in 0..3 {
            assert_eq!(d[i][i], 0.0);
            for j in 0..3 {
                assert!((d[i][j] - d[j][i]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn centroid_is_the_mean() {
        let points = vec![vec![0.0, 2.0], vec![2.0, 4.0]];
        assert_eq!(centroid(&points, 2), vec![1.0, 3.0]);
    }
}
