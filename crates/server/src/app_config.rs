//! Application configuration builders.
//!
//! Constructs the embedding backend and the grouping pipeline from `Config`.

use std::sync::Arc;

use tracing::{info, warn};

use tabgroup_compute::TabGrouper;
use tabgroup_core::config::EmbeddingConfig;
use tabgroup_core::Config;
use tabgroup_ingest::embedding::{HashingEmbedder, OllamaEmbedder, OpenAiEmbedder};
use tabgroup_ingest::Embedder;

use crate::state::AppState;

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> Config {
    tabgroup_core::config::load_dotenv();
    Config::from_env()
}

/// Build the embedding backend named by `EMBEDDING_PROVIDER`.
pub fn build_embedder(config: &EmbeddingConfig) -> Option<Arc<dyn Embedder>> {
    let dims = config.dimensions as usize;
    match config.provider.as_str() {
        "ollama" => {
            let embedder = OllamaEmbedder::new(config.ollama_url.clone(), config.model.clone(), dims);
            info!(
                "Embedding provider ready: ollama (model: {}, dims: {})",
                config.model, dims
            );
            Some(Arc::new(embedder))
        }
        "openai" => {
            let Some(api_key) = config.openai_api_key.clone() else {
                warn!("EMBEDDING_PROVIDER=openai but OPENAI_API_KEY is empty, grouping disabled");
                return None;
            };
            let embedder = OpenAiEmbedder::new(
                api_key,
                config.model.clone(),
                config.openai_base_url.clone(),
                dims,
            );
            info!(
                "Embedding provider ready: openai (model: {}, dims: {})",
                config.model, dims
            );
            Some(Arc::new(embedder))
        }
        "hashing" => {
            info!("Embedding provider ready: hashing (dims: {})", dims);
            Some(Arc::new(HashingEmbedder::new(dims)))
        }
        other => {
            warn!("Unknown embedding provider '{}', grouping disabled", other);
            None
        }
    }
}

/// Wrap the configured embedder in a grouping pipeline.
pub fn build_grouper(config: &EmbeddingConfig) -> Option<TabGrouper> {
    build_embedder(config)
        .map(|embedder| TabGrouper::with_batch_size(embedder, config.batch_size as usize))
}

pub fn build_state(config: Config) -> AppState {
    let grouper = build_grouper(&config.embedding);
    AppState::new(grouper, config)
}
