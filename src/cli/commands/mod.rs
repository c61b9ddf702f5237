mod ask;
mod config;
mod index;
mod ingest;
mod search;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use search::SearchArgs;

pub use ask::handle_ask;
pub use config::handle_config;
pub use index::{handle_create_index, handle_stats};
pub use ingest::handle_ingest;
pub use search::handle_search;
