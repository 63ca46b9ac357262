use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Conflict(_) => StatusCode::CONFLICT,
            PipelineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Http(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Internal(_)
            | PipelineError::Database(_)
            | PipelineError::Migration(_)
            | PipelineError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show to a user. Storage and encoding details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::NotFound(msg)
            | PipelineError::BadRequest(msg)
            | PipelineError::Conflict(msg)
            | PipelineError::Internal(msg) => msg.clone(),
            PipelineError::Timeout(_) => self.to_string(),
            PipelineError::Http(_) => "Upstream request failed".into(),
            PipelineError::Database(_)
            | PipelineError::Migration(_)
            | PipelineError::Serialization(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        match &self {
            PipelineError::Database(err) => tracing::error!("Database error: {:?}", err),
            PipelineError::Migration(err) => tracing::error!("Migration error: {:?}", err),
            PipelineError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err)
            }
            PipelineError::Http(err) => tracing::error!("Upstream http error: {:?}", err),
            _ => {}
        }

        let status = self.status_code();
        let body = json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
