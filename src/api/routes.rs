use axum::http::HeaderValue;
use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::config::Config;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let pipeline_routes = Router::new()
        .route("/", get(handlers::pipelines::list_pipelines))
        .route(
            "/{pipeline}/cards",
            get(handlers::cards::list_cards).post(handlers::cards::create_card),
        )
        .route("/{pipeline}/cards/{id}", get(handlers::cards::get_card))
        .route(
            "/{pipeline}/cards/{id}/stage",
            patch(handlers::cards::move_card_stage),
        )
        .route(
            "/{pipeline}/cards/{id}/transitions",
            get(handlers::cards::list_transitions),
        )
        .route("/{pipeline}/board", get(handlers::cards::get_board));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/api/events", get(handlers::sse::sse_handler))
        .nest("/api/pipelines", pipeline_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
