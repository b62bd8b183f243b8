use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TabGroupError;
use crate::tab::Tab;

/// Cluster label for points a strategy declines to assign.
pub const NOISE: i32 = -1;

/// The two clustering strategies, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Kmeans,
    Hdbscan,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Kmeans, Algorithm::Hdbscan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Kmeans => "kmeans",
            Algorithm::Hdbscan => "hdbscan",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = TabGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kmeans" => Ok(Algorithm::Kmeans),
            "hdbscan" => Ok(Algorithm::Hdbscan),
            other => Err(TabGroupError::InvalidAlgorithm(other.to_string())),
        }
    }
}

/// Internal quality metrics of one clustering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub silhouette_score: f64,
    pub davies_bouldin: f64,
    pub calinski_harabasz: f64,
    pub num_clusters: usize,
    pub noise_points: usize,
}

impl Metrics {
    pub fn zeroed() -> Self {
        Self::default()
    }
}

/// A named cluster of tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub tabs: Vec<Tab>,
}

/// The winning strategy's grouping for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub groups: Vec<Group>,
    pub metrics: Metrics,
    /// `"kmeans"`, `"hdbscan"`, or empty when nothing was clustered.
    pub algorithm: String,
}

impl ClusterResult {
    /// Result for an empty or fully filtered request.
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            metrics: Metrics::zeroed(),
            algorithm: String::new(),
        }
    }
}
