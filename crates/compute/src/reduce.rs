//! Size-dependent dimensionality reduction of tab embeddings.
//!
//! | tabs   | method           | components        |
//! |--------|------------------|-------------------|
//! | 1      | none             | input unchanged   |
//! | 2..=9  | PCA              | `min(n - 1, 30)`  |
//! | ≥ 10   | UMAP (cosine)    | `min(n - 1, 30)`  |
//!
//! The manifold layout is centred on the origin afterwards so that cosine
//! distances downstream measure direction from the layout's centre.

use serde::Serialize;
use tabgroup_core::Result;
use tracing::debug;

use crate::algorithms::pca::Pca;
use crate::algorithms::umap::Umap;

/// Inputs at or above this size use the manifold projection.
pub const MANIFOLD_MIN_POINTS: usize = 10;
/// Upper bound on the reduced dimensionality.
pub const MAX_COMPONENTS: usize = 30;
/// Neighbourhood size of the manifold graph (before capping at `n - 1`).
pub const MANIFOLD_NEIGHBORS: usize = 3;
/// Seed for every randomized step of the reduction.
pub const REDUCTION_SEED: u64 = 42;
/// Optimisation epochs of the manifold layout.
pub const MANIFOLD_EPOCHS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// A single tab; nothing to reduce.
    Skip,
    /// Few tabs; principal components.
    Linear,
    /// Enough tabs for a neighbourhood graph.
    Manifold,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Skip => "skip",
            SizeClass::Linear => "pca",
            SizeClass::Manifold => "umap",
        }
    }
}

pub fn size_class(n: usize) -> SizeClass {
    match n {
        0 | 1 => SizeClass::Skip,
        n if n < MANIFOLD_MIN_POINTS => SizeClass::Linear,
        _ => SizeClass::Manifold,
    }
}

/// Target dimensionality for `n` points: `min(n - 1, 30)`.
pub fn target_components(n: usize) -> usize {
    n.saturating_sub(1).min(MAX_COMPONENTS)
}

/// Reduced embeddings plus the method that produced them.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub points: Vec<Vec<f64>>,
    pub method: SizeClass,
}

/// Reduce `embeddings` according to their count. Deterministic.
pub fn reduce(embeddings: &[Vec<f64>]) -> Result<Reduction> {
    let n = embeddings.len();
    let method = size_class(n);
    let components = target_components(n);

    let points = match method {
        SizeClass::Skip => embeddings.to_vec(),
        SizeClass::Linear => Pca::new(components).fit_transform(embeddings)?,
        SizeClass::Manifold => {
            let umap = Umap::builder()
                .n_components(components)
                .n_neighbors(MANIFOLD_NEIGHBORS.min(n - 1))
                .n_epochs(MANIFOLD_EPOCHS)
                .seed(REDUCTION_SEED)
                .build();
            let mut layout = umap.fit_transform(embeddings)?;
            center(&mut layout);
            layout
        }
    };

    debug!(
        points = n,
        method = method.as_str(),
        dims = points.first().map(Vec::len).unwrap_or(0),
        "reduced embeddings"
    );
    Ok(Reduction { points, method })
}

/// Subtract the column means in place.
fn center(points: &mut [Vec<f64>]) {
    let Some(dim) = points.first().map(Vec::len) else {
        return;
    };
    let n = points.len() as f64;
    for d in 0..dim {
        let mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
        for p in points.iter_mut() {
            p[d] -= mean;
        }
    }
}
