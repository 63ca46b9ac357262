use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::PipelineError;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub sse_tx: broadcast::Sender<String>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Option<SqlitePool>, sse_tx: broadcast::Sender<String>, config: Arc<Config>) -> Self {
        Self { db, sse_tx, config }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, PipelineError> {
        self.db
            .as_ref()
            .ok_or_else(|| PipelineError::Internal("Database not available".into()))
    }
}
