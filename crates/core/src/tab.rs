use serde::{Deserialize, Serialize};

/// A browser tab as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl Tab {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// How surviving clusters are labelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum NamingStrategy {
    /// Top three ranked keyword phrases, comma-joined.
    #[default]
    Keyword,
    /// Most frequent bare domain.
    Domain,
    /// Same as `Domain`; kept as a distinct value for client compatibility.
    DomainWord,
    /// `"Group NNNN - phrase"`.
    AutoNumbered,
    /// Anything else. Every group is named `"Workspace"`.
    Other(String),
}

impl NamingStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            NamingStrategy::Keyword => "keyword",
            NamingStrategy::Domain => "domain",
            NamingStrategy::DomainWord => "domain-word",
            NamingStrategy::AutoNumbered => "auto-numbered",
            NamingStrategy::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for NamingStrategy {
    fn from(s: String) -> Self {
        match s.as_str() {
            "keyword" => NamingStrategy::Keyword,
            "domain" => NamingStrategy::Domain,
            "domain-word" => NamingStrategy::DomainWord,
            "auto-numbered" => NamingStrategy::AutoNumbered,
            _ => NamingStrategy::Other(s),
        }
    }
}

impl From<&str> for NamingStrategy {
    fn from(s: &str) -> Self {
        NamingStrategy::from(s.to_string())
    }
}

impl From<NamingStrategy> for String {
    fn from(strategy: NamingStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Per-request grouping settings.
///
/// Field names follow the browser extension's JSON (camelCase). Absent
/// fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Accepted for compatibility; not read by the pipeline.
    pub similarity_threshold: f64,
    /// Clusters smaller than this are dropped from the result.
    pub min_workspace_size: usize,
    /// Accepted for compatibility; not read by the pipeline.
    pub auto_group_tabs: bool,
    pub naming_strategy: NamingStrategy,
    /// Accepted for compatibility; opaque to the pipeline.
    pub tab_source: String,
    /// Upper bound of the k-means cluster-count search.
    pub num_clusters: usize,
    /// Lower bound for HDBSCAN's minimum cluster size.
    pub min_cluster_size: usize,
    pub domain_weight: f64,
    pub path_weight: f64,
    pub title_weight: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            min_workspace_size: 2,
            auto_group_tabs: true,
            naming_strategy: NamingStrategy::Keyword,
            tab_source: "current-window".to_string(),
            num_clusters: 3,
            min_cluster_size: 3,
            domain_weight: 0.4,
            path_weight: 0.3,
            title_weight: 0.3,
        }
    }
}

impl Settings {
    /// `minWorkspaceSize`, floored at 1.
    pub fn effective_min_workspace_size(&self) -> usize {
        self.min_workspace_size.max(1)
    }

    /// Minimum cluster size handed to HDBSCAN.
    pub fn hdbscan_min_cluster_size(&self) -> usize {
        self.min_cluster_size.max(self.effective_min_workspace_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"numClusters": 6}"#).unwrap();
        assert_eq!(settings.num_clusters, 6);
        assert_eq!(settings.min_workspace_size, 2);
        assert_eq!(settings.naming_strategy, NamingStrategy::Keyword);
        assert!((settings.domain_weight - 0.4).abs() < 1e-12);
    }

    #[test]
    fn naming_strategy_parses_known_and_unknown_values() {
        let settings: Settings =
            serde_json::from_str(r#"{"namingStrategy": "domain-word"}"#).unwrap();
        assert_eq!(settings.naming_strategy, NamingStrategy::DomainWord);

        let settings: Settings = serde_json::from_str(r#"{"namingStrategy": "emoji"}"#).unwrap();
        assert_eq!(
            settings.naming_strategy,
            NamingStrategy::Other("emoji".to_string())
        );
    }

    #[test]
    fn naming_strategy_serializes_as_string() {
        let json = serde_json::to_value(NamingStrategy::AutoNumbered).unwrap();
        assert_eq!(json, serde_json::json!("auto-numbered"));
    }

    #[test]
    fn hdbscan_size_takes_the_larger_bound() {
        let settings = Settings {
            min_cluster_size: 2,
            min_workspace_size: 4,
            ..Settings::default()
        };
        assert_eq!(settings.hdbscan_min_cluster_size(), 4);

        let settings = Settings {
            min_workspace_size: 0,
            min_cluster_size: 0,
            ..Settings::default()
        };
        assert_eq!(settings.effective_min_workspace_size(), 1);
        assert_eq!(settings.hdbscan_min_cluster_size(), 1);
    }

    #[test]
    fn tab_title_is_optional() {
        let tab: Tab = serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(tab.title, "");
    }
}
