//! Tab grouping orchestrator.
//!
//! One request runs these stages:
//!
//! - **Filter**: drop browser-internal and empty URLs.
//! - **Embed**: weighted pseudo-document per tab → unit vector.
//! - **Reduce**: PCA or UMAP depending on the tab count.
//! - **Cluster**: every strategy in turn, each scored by [`composite_score`].
//! - **Group**: keep the best strategy's clusters that meet the minimum
//!   size, then name them.

pub mod filter;
pub mod metrics;
pub mod naming;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tabgroup_core::{ClusterResult, Group, Result, Settings, Tab, TabGroupError, NOISE};
use tabgroup_ingest::embedding::DEFAULT_BATCH_SIZE;
use tabgroup_ingest::{build_documents, embed_documents, Document, Embedder};
use tracing::{debug, info, warn};

use crate::engine::{ClusterEngine, ClusterOutcome};
use crate::reduce::{reduce, SizeClass};
use crate::scoring::composite_score;

use self::filter::filter_tabs;
use self::metrics::{PipelineMetrics, StageTimer, StageTimings};
use self::naming::GroupNamer;

/// Groups browser tabs into named workspaces.
///
/// Requests share nothing but the embedder and the service statistics.
pub struct TabGrouper {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    metrics: Mutex<PipelineMetrics>,
}

impl TabGrouper {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_batch_size(embedder, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            metrics: Mutex::new(PipelineMetrics::default()),
        }
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Snapshot of the service statistics.
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Group `tabs` into named workspaces.
    ///
    /// Returns [`ClusterResult::empty`] when no tab survives filtering. Any
    /// failure in embedding or clustering fails the whole request.
    pub async fn group_tabs(&self, tabs: &[Tab], settings: &Settings) -> Result<ClusterResult> {
        let mut timer = StageTimer::start();

        let valid = filter_tabs(tabs);
        if valid.is_empty() {
            debug!(received = tabs.len(), "no groupable tabs");
            self.with_metrics(|m| m.record_empty(timer.total()));
            return Ok(ClusterResult::empty());
        }

        let docs = build_documents(&valid, settings);
        let embeddings = embed_documents(self.embedder.as_ref(), &docs, self.batch_size)
            .await
            .map_err(|e| TabGroupError::Embedding(e.to_string()))?;
        if embeddings.len() != valid.len() {
            return Err(TabGroupError::EmbeddingCount {
                expected: valid.len(),
                actual: embeddings.len(),
            });
        }
        let embed = timer.lap();

        let settings = settings.clone();
        let grouped = tokio::task::spawn_blocking(move || cluster_and_group(embeddings, valid, docs, &settings))
            .await
            .map_err(|e| TabGroupError::Other(format!("clustering task failed: {e}")))??;
        let Grouped {
            result,
            tabs: grouped_tabs,
            method,
            score,
            reduce: reduce_time,
            cluster,
        } = grouped;

        let timings = StageTimings {
            embed,
            reduce: reduce_time,
            cluster,
            total: timer.total(),
        };
        info!(
            tabs = grouped_tabs,
            filtered = tabs.len() - grouped_tabs,
            reduction = method.as_str(),
            algorithm = %result.algorithm,
            score,
            groups = result.groups.len(),
            "grouped tabs in {:.1}ms",
            timings.total.as_secs_f64() * 1000.0
        );
        self.with_metrics(|m| {
            m.record_request(grouped_tabs, result.groups.len(), &result.algorithm, &timings)
        });

        Ok(result)
    }

    fn with_metrics(&self, f: impl FnOnce(&mut PipelineMetrics)) {
        match self.metrics.lock() {
            Ok(mut m) => f(&mut m),
            Err(_) => warn!("pipeline metrics lock poisoned, skipping update"),
        }
    }
}

/// Output of the CPU-bound stages of one request.
struct Grouped {
    result: ClusterResult,
    tabs: usize,
    method: SizeClass,
    score: f64,
    reduce: Duration,
    cluster: Duration,
}

/// Reduce, cluster, select and group. Runs on the blocking pool.
fn cluster_and_group(
    embeddings: Vec<Vec<f64>>,
    valid: Vec<Tab>,
    docs: Vec<Document>,
    settings: &Settings,
) -> Result<Grouped> {
    let start = Instant::now();
    let reduced = reduce(&embeddings)?;
    let reduce_time = start.elapsed();

    let outcomes = ClusterEngine::run_all(&reduced.points, settings)?;
    let (winner, score) = select_best(&outcomes, valid.len())
        .ok_or_else(|| TabGroupError::Other("no clustering strategy ran".to_string()))?;
    let groups = build_groups(&winner.labels, &valid, &docs, settings);

    Ok(Grouped {
        result: ClusterResult {
            groups,
            metrics: winner.metrics,
            algorithm: winner.algorithm.to_string(),
        },
        tabs: valid.len(),
        method: reduced.method,
        score,
        reduce: reduce_time,
        cluster: start.elapsed() - reduce_time,
    })
}

/// Highest composite score wins; on a tie the earlier strategy is kept.
fn select_best(outcomes: &[ClusterOutcome], num_points: usize) -> Option<(&ClusterOutcome, f64)> {
    let mut best: Option<(&ClusterOutcome, f64)> = None;
    for outcome in outcomes {
        let score = composite_score(&outcome.metrics, num_points);
        debug!(
            algorithm = %outcome.algorithm,
            total = score.total,
            silhouette = score.silhouette,
            davies_bouldin = score.davies_bouldin,
            calinski_harabasz = score.calinski_harabasz,
            cluster_count = score.cluster_count,
            noise = score.noise,
            "strategy score"
        );
        if best.map_or(true, |(_, s)| score.total > s) {
            best = Some((outcome, score.total));
        }
    }
    best
}

/// Turn labels into named groups. Clusters keep the order in which their
/// first member appears; clusters below the minimum size and noise are
/// dropped.
fn build_groups(labels: &[i32], tabs: &[Tab], docs: &[Document], settings: &Settings) -> Vec<Group> {
    let mut order: Vec<i32> = Vec::new();
    let mut members: HashMap<i32, Vec<usize>> = HashMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label == NOISE {
            continue;
        }
        members
            .entry(label)
            .or_insert_with(|| {
                order.push(label);
                Vec::new()
            })
            .push(i);
    }

    let min_size = settings.effective_min_workspace_size();
    let mut namer = GroupNamer::new(settings.naming_strategy.clone());

    order
        .iter()
        .filter_map(|label| members.remove(label))
        .filter(|idx| idx.len() >= min_size)
        .map(|idx| {
            let group_tabs: Vec<&Tab> = idx.iter().map(|&i| &tabs[i]).collect();
            let group_docs: Vec<&Document> = idx.iter().map(|&i| &docs[i]).collect();
            Group {
                name: namer.name(&group_tabs, &group_docs),
                tabs: group_tabs.into_iter().cloned().collect(),
            }
        })
        .collect()
}
