use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{BoardResponse, CreateCardRequest, MoveStageRequest};
use crate::api::handlers::sse::SseEvent;
use crate::api::AppState;
use crate::domain::{CardRow, MutationResponse, Pipeline, PipelineError, StageTransition};
use crate::services::{moved_message, CardService};

fn parse_pipeline(raw: &str) -> Result<Pipeline, PipelineError> {
    raw.parse::<Pipeline>().map_err(PipelineError::BadRequest)
}

pub async fn list_cards(
    State(state): State<AppState>,
    Path(pipeline): Path<String>,
) -> Result<Json<Vec<CardRow>>, PipelineError> {
    let pool = state.require_db()?;
    let pipeline = parse_pipeline(&pipeline)?;
    let cards = CardService::list_cards(pool, pipeline).await?;
    Ok(Json(cards))
}

pub async fn create_card(
    State(state): State<AppState>,
    Path(pipeline): Path<String>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardRow>), PipelineError> {
    let pool = state.require_db()?;
    let pipeline = parse_pipeline(&pipeline)?;
    let card = CardService::create_card(pool, pipeline, req).await?;

    SseEvent::CardCreated {
        pipeline: pipeline.to_string(),
        card_id: card.id.clone(),
        name: card.name.clone(),
    }
    .publish(&state);

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_card(
    State(state): State<AppState>,
    Path((pipeline, id)): Path<(String, String)>,
) -> Result<Json<CardRow>, PipelineError> {
    let pool = state.require_db()?;
    let pipeline = parse_pipeline(&pipeline)?;
    let card = CardService::get_card(pool, pipeline, &id).await?;
    Ok(Json(card))
}

/// Stage mutation endpoint. Answers `{message}` on success and `{error}` otherwise.
pub async fn move_card_stage(
    State(state): State<AppState>,
    Path((pipeline, id)): Path<(String, String)>,
    Json(req): Json<MoveStageRequest>,
) -> Result<Json<MutationResponse>, PipelineError> {
    let pool = state.require_db()?;
    let pipeline = parse_pipeline(&pipeline)?;
    let moved = CardService::move_card(pool, pipeline, &id, &req.stage).await?;

    let title = pipeline
        .stage_info(&req.stage)
        .map(|info| info.title)
        .map_err(PipelineError::Internal)?;

    if !moved.changed {
        return Ok(Json(MutationResponse::message(format!(
            "{} already in {}",
            pipeline.noun(),
            title
        ))));
    }

    SseEvent::CardMoved {
        pipeline: pipeline.to_string(),
        card_id: id,
        from_stage: moved.from_stage,
        to_stage: req.stage,
    }
    .publish(&state);

    Ok(Json(MutationResponse::message(moved_message(
        pipeline.noun(),
        title,
    ))))
}

pub async fn list_transitions(
    State(state): State<AppState>,
    Path((pipeline, id)): Path<(String, String)>,
) -> Result<Json<Vec<StageTransition>>, PipelineError> {
    let pool = state.require_db()?;
    let pipeline = parse_pipeline(&pipeline)?;
    let transitions = CardService::list_transitions(pool, pipeline, &id).await?;
    Ok(Json(transitions))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(pipeline): Path<String>,
) -> Result<Json<BoardResponse>, PipelineError> {
    let pool = state.require_db()?;
    let pipeline = parse_pipeline(&pipeline)?;
    let board = CardService::get_board(pool, pipeline).await?;
    Ok(Json(board))
}
