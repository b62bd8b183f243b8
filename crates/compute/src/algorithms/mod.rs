pub mod distance;
pub mod hdbscan;
pub mod kmeans;
pub mod pca;
pub mod umap;
