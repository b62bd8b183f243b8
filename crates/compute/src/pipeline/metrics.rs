use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Wall-clock time spent in each stage of one request.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    pub embed: Duration,
    pub reduce: Duration,
    pub cluster: Duration,
    pub total: Duration,
}

/// Grouping service statistics, updated after every request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// Requests served, including those that produced no groups.
    pub requests: u64,
    /// Requests with no groupable tabs.
    pub empty_requests: u64,
    /// Groupable tabs seen across all requests.
    pub tabs_processed: u64,
    /// Groups returned across all requests.
    pub groups_returned: u64,
    /// Average end-to-end latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Average embedding time per non-empty request, in milliseconds.
    pub avg_embed_ms: f64,
    /// Average reduction time per non-empty request, in milliseconds.
    pub avg_reduce_ms: f64,
    /// Average clustering time per non-empty request, in milliseconds.
    pub avg_cluster_ms: f64,
    /// How often each strategy was selected.
    pub algorithm_wins: HashMap<String, u64>,
    /// When the last request finished.
    pub last_request: Option<DateTime<Utc>>,

    #[serde(skip)]
    total_latency_ms: f64,
    #[serde(skip)]
    total_embed_ms: f64,
    #[serde(skip)]
    total_reduce_ms: f64,
    #[serde(skip)]
    total_cluster_ms: f64,
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl PipelineMetrics {
    /// Record a request that had nothing to group.
    pub fn record_empty(&mut self, elapsed: Duration) {
        self.requests += 1;
        self.empty_requests += 1;
        self.total_latency_ms += ms(elapsed);
        self.avg_latency_ms = self.total_latency_ms / self.requests as f64;
        self.last_request = Some(Utc::now());
    }

    /// Record a request that went through the full pipeline.
    pub fn record_request(&mut self, tabs: usize, groups: usize, algorithm: &str, timings: &StageTimings) {
        self.requests += 1;
        self.tabs_processed += tabs as u64;
        self.groups_returned += groups as u64;
        *self.algorithm_wins.entry(algorithm.to_owned()).or_insert(0) += 1;

        self.total_latency_ms += ms(timings.total);
        self.total_embed_ms += ms(timings.embed);
        self.total_reduce_ms += ms(timings.reduce);
        self.total_cluster_ms += ms(timings.cluster);

        let full = (self.requests - self.empty_requests) as f64;
        self.avg_latency_ms = self.total_latency_ms / self.requests as f64;
        self.avg_embed_ms = self.total_embed_ms / full;
        self.avg_reduce_ms = self.total_reduce_ms / full;
        self.avg_cluster_ms = self.total_cluster_ms / full;
        self.last_request = Some(Utc::now());
    }
}

/// Measures consecutive stages of one request.
pub struct StageTimer {
    start: Instant,
    lap: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self { start: now, lap: now }
    }

    /// Time since the previous lap (or the start).
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.lap;
        self.lap = now;
        elapsed
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }
}
