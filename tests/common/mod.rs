#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::{broadcast, oneshot};
use tower::ServiceExt;

use revuoo_pipeline::api::{create_router, AppState};
use revuoo_pipeline::config::Config;
use revuoo_pipeline::domain::{Card, CardId, MutationResponse, PipelineError, PipelineStage};
use revuoo_pipeline::infrastructure::db;
use revuoo_pipeline::services::PipelineStore;

pub async fn setup_test_db() -> SqlitePool {
    // one connection: every new in-memory connection is a fresh database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn test_config() -> Config {
    Config {
        port: 3000,
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        api_url: "http://127.0.0.1:3000".to_string(),
        mutation_timeout_secs: 15,
        seed_demo: false,
    }
}

pub fn test_app(pool: SqlitePool) -> (Router, broadcast::Receiver<String>) {
    test_app_with_config(pool, test_config())
}

pub fn test_app_with_config(
    pool: SqlitePool,
    config: Config,
) -> (Router, broadcast::Receiver<String>) {
    let (sse_tx, sse_rx) = broadcast::channel(100);
    let config = Arc::new(config);
    let state = AppState::new(Some(pool), sse_tx, Arc::clone(&config));
    (create_router(state, &config), sse_rx)
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

/// How the mock answers one `move_card` call.
pub enum Reply {
    Message(String),
    Error(String),
    /// Hold the answer until the paired sender fires.
    Gated(oneshot::Receiver<MutationResponse>),
    Hang,
}

/// Store double: records mutation calls, answers them from a script and
/// serves `server_cards` from the list endpoint.
pub struct MockStore<S> {
    pub server_cards: Mutex<Vec<Card<S>>>,
    pub calls: Mutex<Vec<(CardId, S)>>,
    replies: Mutex<VecDeque<Reply>>,
    pub list_calls: Mutex<usize>,
    list_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl<S: PipelineStage> MockStore<S> {
    pub fn new(server_cards: Vec<Card<S>>) -> Self {
        Self {
            server_cards: Mutex::new(server_cards),
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            list_calls: Mutex::new(0),
            list_gate: Mutex::new(None),
        }
    }

    pub fn reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<(CardId, S)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_server_cards(&self, cards: Vec<Card<S>>) {
        *self.server_cards.lock().unwrap() = cards;
    }

    /// The next list call takes its snapshot right away but only answers once
    /// the returned sender fires.
    pub fn gate_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.list_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub async fn wait_for_list_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while *self.list_calls.lock().unwrap() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("list calls never arrived");
    }

    /// Yields until at least `n` mutation calls have reached the store.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls.lock().unwrap().len() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("mutation calls never arrived");
    }
}

#[async_trait]
impl<S: PipelineStage> PipelineStore<S> for MockStore<S> {
    async fn list_cards(&self) -> Result<Vec<Card<S>>, PipelineError> {
        *self.list_calls.lock().unwrap() += 1;
        let snapshot = self.server_cards.lock().unwrap().clone();

        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(snapshot)
    }

    async fn move_card(
        &self,
        card_id: &CardId,
        new_stage: S,
    ) -> Result<MutationResponse, PipelineError> {
        self.calls.lock().unwrap().push((card_id.clone(), new_stage));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Message(String::new()));

        match reply {
            Reply::Message(message) => {
                let mut server = self.server_cards.lock().unwrap();
                if let Some(card) = server.iter_mut().find(|c| &c.id == card_id) {
                    card.stage = new_stage;
                    card.details.score = new_stage.score_weight();
                }
                Ok(MutationResponse::message(message))
            }
            Reply::Error(error) => Ok(MutationResponse::error(error)),
            Reply::Gated(rx) => rx
                .await
                .map_err(|_| PipelineError::Internal("gate dropped".into())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(MutationResponse::message("too late"))
            }
        }
    }
}
