use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{BoardResponse, ColumnResponse, CreateCardRequest};
use crate::domain::{CardRow, Pipeline, PipelineError, StageTransition};

/// Outcome of a stage mutation as seen by the server.
#[derive(Debug, Clone)]
pub struct StageMove {
    pub card: CardRow,
    pub from_stage: String,
    pub changed: bool,
}

const MAX_MOVE_ATTEMPTS: u32 = 5;

pub struct CardService;

impl CardService {
    pub async fn create_card(
        pool: &SqlitePool,
        pipeline: Pipeline,
        req: CreateCardRequest,
    ) -> Result<CardRow, PipelineError> {
        let id = req.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now().to_rfc3339();

        let stage = match req.stage.as_deref() {
            Some(stage) => pipeline
                .stage_info(stage)
                .map_err(PipelineError::BadRequest)?,
            None => pipeline.first_stage(),
        };

        if req.name.trim().is_empty() {
            return Err(PipelineError::BadRequest("Card name is required".into()));
        }

        sqlx::query(
            "INSERT INTO pipeline_cards (id, pipeline, stage, name, company, contact_email, contact_phone, value_cents, score, stage_changed_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(pipeline.as_str())
        .bind(stage.id)
        .bind(req.name.trim())
        .bind(&req.company)
        .bind(&req.contact_email)
        .bind(&req.contact_phone)
        .bind(req.value_cents)
        .bind(stage.score_weight)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                PipelineError::Conflict(format!("Card already exists: {}", id))
            }
            err => PipelineError::Database(err),
        })?;

        tracing::debug!(card_id = id.as_str(), pipeline = %pipeline, stage = stage.id, "Card created");

        Self::get_card(pool, pipeline, &id).await
    }

    pub async fn get_card(
        pool: &SqlitePool,
        pipeline: Pipeline,
        id: &str,
    ) -> Result<CardRow, PipelineError> {
        let card: CardRow =
            sqlx::query_as("SELECT * FROM pipeline_cards WHERE id = ? AND pipeline = ?")
                .bind(id)
                .bind(pipeline.as_str())
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| PipelineError::NotFound(format!("Card not found: {}", id)))?;

        Ok(card)
    }

    pub async fn list_cards(
        pool: &SqlitePool,
        pipeline: Pipeline,
    ) -> Result<Vec<CardRow>, PipelineError> {
        let cards: Vec<CardRow> = sqlx::query_as(
            "SELECT * FROM pipeline_cards WHERE pipeline = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(pipeline.as_str())
        .fetch_all(pool)
        .await?;

        Ok(cards)
    }

    pub async fn get_board(
        pool: &SqlitePool,
        pipeline: Pipeline,
    ) -> Result<BoardResponse, PipelineError> {
        let cards = Self::list_cards(pool, pipeline).await?;

        let mut columns: Vec<ColumnResponse> = pipeline
            .stages()
            .into_iter()
            .map(|stage| ColumnResponse {
                stage: stage.id.to_string(),
                title: stage.title.to_string(),
                cards: vec![],
            })
            .collect();

        for card in cards {
            match columns.iter_mut().find(|column| column.stage == card.stage) {
                Some(column) => column.cards.push(card),
                None => {
                    tracing::warn!(
                        card_id = card.id.as_str(),
                        stage = card.stage.as_str(),
                        "Card has a stage outside its pipeline, leaving it off the board"
                    );
                }
            }
        }

        Ok(BoardResponse {
            pipeline: pipeline.to_string(),
            columns,
        })
    }

    /// Moves a card to `new_stage`, refreshing derived fields and writing an audit row.
    ///
    /// Moving a card onto its current stage is accepted and changes nothing. The
    /// update only applies if the card still has the stage that was read, so
    /// overlapping moves of one card each record the stage they really left.
    pub async fn move_card(
        pool: &SqlitePool,
        pipeline: Pipeline,
        id: &str,
        new_stage: &str,
    ) -> Result<StageMove, PipelineError> {
        let target = pipeline
            .stage_info(new_stage)
            .map_err(PipelineError::BadRequest)?;

        for attempt in 1..=MAX_MOVE_ATTEMPTS {
            let existing = Self::get_card(pool, pipeline, id).await?;

            if existing.stage == target.id {
                return Ok(StageMove {
                    from_stage: existing.stage.clone(),
                    card: existing,
                    changed: false,
                });
            }

            let now = Utc::now().to_rfc3339();
            let mut tx = pool.begin().await?;

            let updated = sqlx::query(
                "UPDATE pipeline_cards SET stage = ?, score = ?, stage_changed_at = ?, updated_at = ? WHERE id = ? AND pipeline = ? AND stage = ?",
            )
            .bind(target.id)
            .bind(target.score_weight)
            .bind(&now)
            .bind(&now)
            .bind(id)
            .bind(pipeline.as_str())
            .bind(&existing.stage)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tracing::debug!(card_id = id, attempt, "Card stage changed underneath a move, retrying");
                tx.rollback().await?;
                continue;
            }

            sqlx::query(
                "INSERT INTO stage_transitions (id, card_id, pipeline, from_stage, to_stage, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id)
            .bind(pipeline.as_str())
            .bind(&existing.stage)
            .bind(target.id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            tracing::info!(
                card_id = id,
                pipeline = %pipeline,
                from_stage = existing.stage.as_str(),
                to_stage = target.id,
                "Card stage changed"
            );

            let card = Self::get_card(pool, pipeline, id).await?;

            return Ok(StageMove {
                card,
                from_stage: existing.stage,
                changed: true,
            });
        }

        Err(PipelineError::Conflict(format!(
            "Card {} is being moved elsewhere, try again",
            id
        )))
    }

    pub async fn list_transitions(
        pool: &SqlitePool,
        pipeline: Pipeline,
        id: &str,
    ) -> Result<Vec<StageTransition>, PipelineError> {
        Self::get_card(pool, pipeline, id).await?;

        let transitions: Vec<StageTransition> = sqlx::query_as(
            "SELECT * FROM stage_transitions WHERE card_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(transitions)
    }
}
