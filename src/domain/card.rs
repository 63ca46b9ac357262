use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{PipelineError, PipelineStage};

/// Stable identity of a pipeline card. Integer ids are kept as their decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<i64> for CardId {
    fn from(id: i64) -> Self {
        Self::new(id.to_string())
    }
}

/// Display payload of a card. The board never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub value_cents: Option<i64>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub stage_changed_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A lead or an opportunity, positioned in exactly one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card<S> {
    pub id: CardId,
    pub stage: S,
    #[serde(flatten)]
    pub details: CardDetails,
}

impl<S: PipelineStage> Card<S> {
    pub fn new(id: impl Into<CardId>, stage: S, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage,
            details: CardDetails {
                name: name.into(),
                ..CardDetails::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CardRow {
    pub id: String,
    pub pipeline: String,
    pub stage: String,
    pub name: String,
    pub company: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub value_cents: Option<i64>,
    pub score: i64,
    pub stage_changed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CardRow {
    pub fn into_card<S: PipelineStage>(self) -> Result<Card<S>, PipelineError> {
        let stage = self.stage.parse::<S>().map_err(|e| {
            PipelineError::Internal(format!("Invalid stage in DB for card {}: {}", self.id, e))
        })?;

        Ok(Card {
            id: CardId(self.id),
            stage,
            details: CardDetails {
                name: self.name,
                company: self.company,
                contact_email: self.contact_email,
                contact_phone: self.contact_phone,
                value_cents: self.value_cents,
                score: self.score,
                stage_changed_at: self.stage_changed_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        })
    }
}

/// Audit row written whenever a card changes stage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StageTransition {
    pub id: String,
    pub card_id: String,
    pub pipeline: String,
    pub from_stage: String,
    pub to_stage: String,
    pub created_at: String,
}
