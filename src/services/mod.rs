pub mod chat;
pub mod embedding;
mod ingest;
pub mod vector_index;

pub use chat::{Answer, Assistant, ChatClient};
pub use embedding::{Embedder, GeminiEmbedder, OpenAiEmbedder, create_embedder};
pub use ingest::{build_records, ingest};
pub use vector_index::{MemoryIndex, PineconeBackend, Provisioned, VectorIndex, create_index};
