//! End-to-end grouping tests: tabs → documents → embeddings → reduction →
//! clustering → named groups, using the offline hashing embedder.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use tabgroup_compute::pipeline::naming::FALLBACK_NAME;
use tabgroup_compute::TabGrouper;
use tabgroup_core::{ClusterResult, NamingStrategy, Settings, Tab, TabGroupError};
use tabgroup_ingest::embedding::HashingEmbedder;
use tabgroup_ingest::{Embedder, EmbeddingError};

const DIMS: usize = 512;

fn grouper() -> TabGrouper {
    TabGrouper::new(Arc::new(HashingEmbedder::new(DIMS)))
}

fn news() -> Vec<Tab> {
    [
        ("election-results", "Election results parliament tonight"),
        ("election-polls", "Election polls parliament campaign"),
        ("budget-debate", "Parliament budget debate election"),
        ("minister-resigns", "Minister resigns election parliament"),
        ("voting-reform", "Voting reform parliament election"),
    ]
    .iter()
    .map(|(path, title)| Tab::new(format!("https://news.bbc.co.uk/politics/{path}"), *title))
    .collect()
}

fn shopping() -> Vec<Tab> {
    [
        ("wireless-headphones", "Wireless headphones discount offer"),
        ("running-shoes", "Running shoes discount offer"),
        ("coffee-grinder", "Coffee grinder discount offer"),
        ("standing-desk", "Standing desk discount offer"),
        ("mechanical-keyboard", "Mechanical keyboard discount offer"),
    ]
    .iter()
    .map(|(path, title)| Tab::new(format!("https://www.amazon.com/deals/{path}"), *title))
    .collect()
}

/// First `per_topic` tabs of each topic, interleaved news-first.
fn interleaved(per_topic: usize) -> Vec<Tab> {
    news()
        .into_iter()
        .zip(shopping())
        .take(per_topic)
        .flat_map(|(a, b)| [a, b])
        .collect()
}

fn urls(tabs: &[Tab]) -> HashSet<String> {
    tabs.iter().map(|t| t.url.clone()).collect()
}

fn assert_topics_split(result: &ClusterResult, per_topic: usize) {
    assert_eq!(result.groups.len(), 2, "groups: {:?}", result.groups);
    assert_eq!(result.metrics.num_clusters, 2);

    let news_urls = urls(&news()[..per_topic]);
    let shop_urls = urls(&shopping()[..per_topic]);
    // The first tab is news, so the news group comes first.
    assert_eq!(urls(&result.groups[0].tabs), news_urls);
    assert_eq!(urls(&result.groups[1].tabs), shop_urls);
}

// ── Empty and degenerate input ───────────────────────────────────

#[tokio::test]
async fn empty_input_is_empty_result() {
    let result = grouper().group_tabs(&[], &Settings::default()).await.unwrap();
    assert_eq!(result, ClusterResult::empty());
}

#[tokio::test]
async fn only_internal_pages_is_empty_result() {
    let tabs = vec![
        Tab::new("chrome://newtab", "New Tab"),
        Tab::new("about:blank", ""),
        Tab::new("moz-extension://abc/options.html", "Options"),
    ];
    let result = grouper().group_tabs(&tabs, &Settings::default()).await.unwrap();
    assert_eq!(result, ClusterResult::empty());
}

#[tokio::test]
async fn single_tab_makes_no_groups() {
    let tabs = vec![Tab::new("https://github.com/rust-lang/rust", "Rust")];
    let result = grouper().group_tabs(&tabs, &Settings::default()).await.unwrap();

    assert!(result.groups.is_empty());
    assert_eq!(result.metrics.noise_points, 1);
    assert_eq!(result.metrics.num_clusters, 0);
    assert_eq!(result.algorithm, "kmeans");
}

#[tokio::test]
async fn two_unrelated_tabs_fall_below_min_size() {
    let tabs = vec![news().remove(0), shopping().remove(0)];
    let result = grouper().group_tabs(&tabs, &Settings::default()).await.unwrap();
    assert!(result.groups.is_empty());
}

#[tokio::test]
async fn duplicate_tabs_are_all_noise() {
    let tabs = vec![Tab::new("https://docs.rs/tokio", "tokio docs"); 3];
    let result = grouper().group_tabs(&tabs, &Settings::default()).await.unwrap();
    assert!(result.groups.is_empty());
    assert_eq!(result.metrics.noise_points, 3);
}

// ── Topic separation ─────────────────────────────────────────────

#[tokio::test]
async fn ten_tabs_split_into_two_topics() {
    let result = grouper()
        .group_tabs(&interleaved(5), &Settings::default())
        .await
        .unwrap();
    assert_topics_split(&result, 5);
    assert!(result.metrics.silhouette_score > 0.0);
    assert!(["kmeans", "hdbscan"].contains(&result.algorithm.as_str()));
}

#[tokio::test]
async fn six_tabs_split_into_two_topics() {
    let result = grouper()
        .group_tabs(&interleaved(3), &Settings::default())
        .await
        .unwrap();
    assert_topics_split(&result, 3);
}

#[tokio::test]
async fn internal_pages_are_ignored_among_real_tabs() {
    let mut tabs = interleaved(5);
    tabs.insert(3, Tab::new("chrome://settings", "Settings"));
    tabs.push(Tab::new("about:blank", ""));

    let result = grouper().group_tabs(&tabs, &Settings::default()).await.unwrap();
    assert_topics_split(&result, 5);
    let returned: usize = result.groups.iter().map(|g| g.tabs.len()).sum();
    assert_eq!(returned, 10);
}

#[tokio::test]
async fn grouping_is_deterministic() {
    let tabs = interleaved(5);
    let settings = Settings {
        naming_strategy: NamingStrategy::AutoNumbered,
        ..Settings::default()
    };
    let g = grouper();
    let first = g.group_tabs(&tabs, &settings).await.unwrap();
    let second = g.group_tabs(&tabs, &settings).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn min_workspace_size_filters_groups() {
    let settings = Settings {
        min_workspace_size: 6,
        ..Settings::default()
    };
    let result = grouper().group_tabs(&interleaved(5), &settings).await.unwrap();
    assert!(result.groups.is_empty());
}

// ── Naming ───────────────────────────────────────────────────────

#[tokio::test]
async fn domain_naming_uses_bare_domains() {
    let settings = Settings {
        naming_strategy: NamingStrategy::Domain,
        ..Settings::default()
    };
    let result = grouper().group_tabs(&interleaved(5), &settings).await.unwrap();
    let names: Vec<&str> = result.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["news.bbc.co.uk", "amazon.com"]);
}

#[tokio::test]
async fn keyword_naming_produces_phrases() {
    let result = grouper()
        .group_tabs(&interleaved(5), &Settings::default())
        .await
        .unwrap();
    for group in &result.groups {
        assert_ne!(group.name, FALLBACK_NAME);
        assert!(group.name.split(", ").count() <= 3);
    }
    assert!(result.groups[1].name.contains("discount"), "name = {}", result.groups[1].name);
}

#[tokio::test]
async fn auto_numbered_names_share_one_sequence() {
    let settings = Settings {
        naming_strategy: NamingStrategy::AutoNumbered,
        ..Settings::default()
    };
    let result = grouper().group_tabs(&interleaved(5), &settings).await.unwrap();
    for group in &result.groups {
        assert!(group.name.starts_with("Group "), "name = {}", group.name);
        assert_eq!(&group.name[10..13], " - ");
    }
}

// ── Failures and stats ───────────────────────────────────────────

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api("model not loaded".to_string()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn embedder_failure_fails_the_request() {
    let g = TabGrouper::new(Arc::new(FailingEmbedder));
    let err = g.group_tabs(&interleaved(2), &Settings::default()).await.unwrap_err();
    match err {
        TabGroupError::Embedding(msg) => assert!(msg.contains("model not loaded")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn stats_track_requests() {
    let g = grouper();
    g.group_tabs(&[], &Settings::default()).await.unwrap();
    g.group_tabs(&interleaved(5), &Settings::default()).await.unwrap();

    let stats = g.metrics();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.empty_requests, 1);
    assert_eq!(stats.tabs_processed, 10);
    assert_eq!(stats.groups_returned, 2);
    assert_eq!(stats.algorithm_wins.values().sum::<u64>(), 1);
}

#[tokio::test]
async fn clustering_leaves_the_runtime_free() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        })
    };

    // Single-threaded runtime: the ticker only runs while the request is
    // parked waiting on the blocking pool.
    let result = grouper()
        .group_tabs(&interleaved(5), &Settings::default())
        .await
        .unwrap();
    let seen = ticks.load(Ordering::Relaxed);
    ticker.abort();

    assert_eq!(result.groups.len(), 2);
    assert!(seen > 0, "runtime was blocked during clustering");
}
