pub mod algorithms;
pub mod engine;
pub mod evaluate;
pub mod pipeline;
pub mod reduce;
pub mod scoring;

pub use engine::{cluster_by_name, cluster_points, k_search_range, ClusterEngine, ClusterOutcome};
pub use evaluate::evaluate;
pub use pipeline::metrics::{PipelineMetrics, StageTimings};
pub use pipeline::TabGrouper;
pub use reduce::{reduce, size_class, target_components, Reduction, SizeClass};
pub use scoring::{composite_score, ScoreBreakdown};
