pub mod card_service;
pub mod http_store;
pub mod pipeline_store;

pub use card_service::{CardService, StageMove};
pub use http_store::HttpStore;
pub use pipeline_store::{moved_message, PipelineStore, SqliteStore};
