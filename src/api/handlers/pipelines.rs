use axum::{extract::State, Json};

use crate::api::dto::PipelineResponse;
use crate::api::AppState;
use crate::domain::Pipeline;

/// Lists both pipelines with their columns and the client-side mutation timeout.
pub async fn list_pipelines(State(state): State<AppState>) -> Json<Vec<PipelineResponse>> {
    let pipelines = Pipeline::all()
        .iter()
        .map(|pipeline| PipelineResponse {
            id: pipeline.to_string(),
            noun: pipeline.noun().to_string(),
            stages: pipeline.stages(),
            mutation_timeout_secs: state.config.mutation_timeout().as_secs(),
        })
        .collect();

    Json(pipelines)
}
