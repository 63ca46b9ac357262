use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::{Card, CardId, MutationResponse, PipelineError, PipelineStage};

use super::CardService;

/// The remote side of a pipeline board: a list endpoint and a stage mutation endpoint.
#[async_trait]
pub trait PipelineStore<S: PipelineStage>: Send + Sync {
    /// Full current snapshot of the pipeline's cards.
    async fn list_cards(&self) -> Result<Vec<Card<S>>, PipelineError>;

    /// Requests a stage change. `Ok(MutationResponse::Error)` is a rejection by the
    /// store; `Err` is a failure to reach it.
    async fn move_card(
        &self,
        card_id: &CardId,
        new_stage: S,
    ) -> Result<MutationResponse, PipelineError>;
}

/// Message shown after a successful move, e.g. "Lead moved to Contacted".
pub fn moved_message(noun: &str, stage_title: &str) -> String {
    format!("{} moved to {}", noun, stage_title)
}

/// In-process store talking to the database directly.
pub struct SqliteStore<S> {
    pool: SqlitePool,
    _stage: PhantomData<fn() -> S>,
}

impl<S> SqliteStore<S> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _stage: PhantomData,
        }
    }
}

#[async_trait]
impl<S: PipelineStage> PipelineStore<S> for SqliteStore<S> {
    async fn list_cards(&self) -> Result<Vec<Card<S>>, PipelineError> {
        CardService::list_cards(&self.pool, S::PIPELINE)
            .await?
            .into_iter()
            .map(|row| row.into_card::<S>())
            .collect()
    }

    async fn move_card(
        &self,
        card_id: &CardId,
        new_stage: S,
    ) -> Result<MutationResponse, PipelineError> {
        match CardService::move_card(&self.pool, S::PIPELINE, card_id.as_str(), new_stage.as_str())
            .await
        {
            Ok(_) => Ok(MutationResponse::message(moved_message(
                S::PIPELINE.noun(),
                new_stage.title(),
            ))),
            Err(
                err @ (PipelineError::NotFound(_)
                | PipelineError::BadRequest(_)
                | PipelineError::Conflict(_)),
            ) => {
                Ok(MutationResponse::error(err.public_message()))
            }
            Err(err) => Err(err),
        }
    }
}
