use serde::{Deserialize, Serialize};

use crate::domain::{CardRow, StageInfo};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub value_cents: Option<i64>,
}

impl CreateCardRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            stage: None,
            company: None,
            contact_email: None,
            contact_phone: None,
            value_cents: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveStageRequest {
    pub stage: String,
}

#[derive(Debug, Serialize)]
pub struct ColumnResponse {
    pub stage: String,
    pub title: String,
    pub cards: Vec<CardRow>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub pipeline: String,
    pub columns: Vec<ColumnResponse>,
}

/// Pipeline metadata a board client needs before mounting.
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub id: String,
    pub noun: String,
    pub stages: Vec<StageInfo>,
    pub mutation_timeout_secs: u64,
}
