pub mod document;
pub mod embedding;
pub mod text;

pub use document::{build_document, build_documents, bare_domain, Document};
pub use embedding::{embed_documents, Embedder, EmbeddingError};
