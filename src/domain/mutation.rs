use serde::{Deserialize, Serialize};

/// Result of the stage mutation endpoint, discriminated by the presence of `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MutationResponse {
    Error { error: String },
    Message { message: String },
}

impl MutationResponse {
    pub fn error(error: impl Into<String>) -> Self {
        MutationResponse::Error {
            error: error.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        MutationResponse::Message {
            message: message.into(),
        }
    }
}
