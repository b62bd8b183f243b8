pub mod batcher;
pub mod hashing;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use batcher::{embed_documents, DEFAULT_BATCH_SIZE};
pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};
