mod chat;
mod config;
mod format;
mod record;
mod review;

pub use chat::{ChatMessage, Role};
pub use config::{
    ChatConfig, Config, DEFAULT_CHAT_MODEL, DEFAULT_GEMINI_URL, DEFAULT_INDEX_NAME,
    DEFAULT_NAMESPACE, DEFAULT_OPENAI_URL, DEFAULT_PINECONE_URL, EmbeddingConfig,
    EmbeddingProvider, GEMINI_API_KEY_VAR, IndexConfig, IndexDriver, Metric, OPENAI_API_KEY_VAR,
    OutputConfig, PINECONE_API_KEY_VAR, RetrySettings, require_env,
};
pub use format::OutputFormat;
pub use record::{IndexStats, IngestReport, NamespaceStats, QueryMatch, ReviewMetadata, UpsertRecord};
pub use review::{Review, ReviewFile};
