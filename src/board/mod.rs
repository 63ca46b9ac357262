//! Client-side state container for a kanban pipeline.
//!
//! The board keeps a local copy of the pipeline's cards, applies drag-initiated
//! stage changes optimistically and reconciles each one with the store. Commits
//! may overlap: every drop captures its own rollback record, and a failed commit
//! only ever patches the card it moved.

pub mod commit;
pub mod drag;
pub mod view;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::domain::{Card, CardId, MutationResponse, PipelineError, PipelineStage};
use crate::services::{moved_message, PipelineStore};

pub use commit::{CommitLedger, PendingCommit};
pub use drag::{resolve_drop_target, DragState, IgnoreReason};
pub use view::{BoardView, ColumnView};

const MAX_REFRESH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct BoardOptions {
    /// A mutation that has not resolved within this window counts as failed.
    pub mutation_timeout: Duration,
    /// Reload the authoritative list in the background after a confirmed move.
    pub refresh_after_commit: bool,
    pub event_capacity: usize,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            mutation_timeout: Duration::from_secs(15),
            refresh_after_commit: true,
            event_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardEvent<S> {
    Toast(Toast),
    RolledBack { card_id: CardId, stage: S },
    Refreshed { card_count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome<S> {
    Ignored(IgnoreReason),
    Pending(PendingCommit<S>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome<S> {
    Confirmed { card_id: CardId, stage: S, message: String },
    RolledBack { card_id: CardId, stage: Option<S>, error: String },
}

#[derive(Debug)]
struct BoardState<S> {
    cards: Vec<Card<S>>,
    drag: DragState,
    ledger: CommitLedger<S>,
    /// Bumped on every confirmed commit. A snapshot fetched across a bump is stale.
    confirmed: u64,
}

impl<S: PipelineStage> BoardState<S> {
    fn card(&self, id: &CardId) -> Option<&Card<S>> {
        self.cards.iter().find(|card| &card.id == id)
    }

    fn card_mut(&mut self, id: &CardId) -> Option<&mut Card<S>> {
        self.cards.iter_mut().find(|card| &card.id == id)
    }
}

pub struct PipelineBoard<S, T> {
    state: Arc<RwLock<BoardState<S>>>,
    store: Arc<T>,
    events: broadcast::Sender<BoardEvent<S>>,
    options: BoardOptions,
}

impl<S, T> Clone for PipelineBoard<S, T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            events: self.events.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S, T> PipelineBoard<S, T>
where
    S: PipelineStage,
    T: PipelineStore<S> + 'static,
{
    pub fn new(store: Arc<T>, initial_cards: Vec<Card<S>>, options: BoardOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));

        Self {
            state: Arc::new(RwLock::new(BoardState {
                cards: initial_cards,
                drag: DragState::Idle,
                ledger: CommitLedger::default(),
                confirmed: 0,
            })),
            store,
            events,
            options,
        }
    }

    /// Loads the initial cards through the list endpoint.
    pub async fn mount(store: Arc<T>, options: BoardOptions) -> Result<Self, PipelineError> {
        let cards = store.list_cards().await?;
        tracing::debug!(pipeline = %S::PIPELINE, cards = cards.len(), "Board mounted");
        Ok(Self::new(store, cards, options))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent<S>> {
        self.events.subscribe()
    }

    pub async fn cards(&self) -> Vec<Card<S>> {
        self.state.read().await.cards.clone()
    }

    pub async fn card(&self, id: &CardId) -> Option<Card<S>> {
        self.state.read().await.card(id).cloned()
    }

    pub async fn active_card(&self) -> Option<Card<S>> {
        let state = self.state.read().await;
        state
            .drag
            .dragged_card()
            .and_then(|id| state.card(id))
            .cloned()
    }

    pub async fn in_flight(&self) -> usize {
        self.state.read().await.ledger.in_flight()
    }

    pub async fn view(&self) -> BoardView<S> {
        let state = self.state.read().await;
        let overlay = state
            .drag
            .dragged_card()
            .and_then(|id| state.card(id))
            .cloned();
        BoardView::partition(&state.cards, overlay)
    }

    /// Marks `card_id` as being dragged. Returns false for unknown cards.
    pub async fn on_drag_start(&self, card_id: &CardId) -> bool {
        let mut state = self.state.write().await;
        if state.card(card_id).is_none() {
            tracing::debug!(card_id = %card_id, "Drag start for unknown card ignored");
            state.drag = DragState::Idle;
            return false;
        }

        if state.drag.dragged_card() != Some(card_id) {
            tracing::debug!(card_id = %card_id, "Drag started");
            state.drag = DragState::Dragging(card_id.clone());
        }
        true
    }

    /// Pointer released outside any drop target.
    pub async fn on_drag_cancel(&self) {
        self.state.write().await.drag = DragState::Idle;
    }

    /// Ends the drag gesture and applies the move locally.
    ///
    /// Nothing is sent to the store here; a `Pending` outcome must be handed to
    /// [`PipelineBoard::commit`].
    pub async fn drop_card(&self, card_id: &CardId, drop_target_id: Option<&str>) -> DropOutcome<S> {
        let mut state = self.state.write().await;
        state.drag = DragState::Idle;

        let Some(current) = state.card(card_id).map(|card| card.stage) else {
            return DropOutcome::Ignored(IgnoreReason::UnknownCard);
        };

        let Some(target) = drop_target_id.and_then(|id| resolve_drop_target(&state.cards, id)) else {
            tracing::debug!(card_id = %card_id, "Drop without a valid target");
            return DropOutcome::Ignored(IgnoreReason::NoTarget);
        };

        if target == current {
            return DropOutcome::Ignored(IgnoreReason::SameStage);
        }

        if let Some(card) = state.card_mut(card_id) {
            card.stage = target;
        }
        let pending = state.ledger.open(card_id.clone(), current, target);

        tracing::debug!(
            card_id = %card_id,
            from_stage = %current,
            to_stage = %target,
            seq = pending.seq,
            "Optimistic stage change applied"
        );

        DropOutcome::Pending(pending)
    }

    /// Sends a pending move to the store and reconciles local state with the answer.
    pub async fn commit(&self, pending: PendingCommit<S>) -> CommitOutcome<S> {
        let timeout = self.options.mutation_timeout;
        let result = match tokio::time::timeout(
            timeout,
            self.store.move_card(&pending.card_id, pending.target_stage),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(timeout.as_secs())),
        };

        let error = match result {
            Ok(MutationResponse::Message { message }) => {
                return self.confirm(pending, message).await;
            }
            Ok(MutationResponse::Error { error }) => error,
            Err(err) => {
                tracing::debug!(card_id = %pending.card_id, error = %err, "Mutation did not complete");
                err.public_message()
            }
        };

        self.roll_back(pending, error).await
    }

    /// Full drag-end handler: drop locally, then commit in a background task.
    pub async fn on_drag_end(
        &self,
        card_id: &CardId,
        drop_target_id: Option<&str>,
    ) -> Option<JoinHandle<CommitOutcome<S>>> {
        match self.drop_card(card_id, drop_target_id).await {
            DropOutcome::Ignored(_) => None,
            DropOutcome::Pending(pending) => {
                let board = self.clone();
                Some(tokio::spawn(async move { board.commit(pending).await }))
            }
        }
    }

    /// Replaces the local cards with the store's snapshot.
    ///
    /// Cards with a commit still in flight keep their optimistic stage. A
    /// snapshot that was fetched while another commit confirmed is refetched.
    pub async fn refresh(&self) -> Result<usize, PipelineError> {
        let mut attempt = 0;
        let (mut cards, mut state) = loop {
            attempt += 1;
            let confirmed = self.state.read().await.confirmed;
            let cards = self.store.list_cards().await?;

            let state = self.state.write().await;
            if state.confirmed == confirmed || attempt >= MAX_REFRESH_ATTEMPTS {
                break (cards, state);
            }
            tracing::debug!(attempt, "Snapshot went stale during fetch, refetching");
        };

        for (id, stage) in state.ledger.optimistic_stages() {
            if let Some(card) = cards.iter_mut().find(|card| &card.id == id) {
                card.stage = stage;
            }
        }
        state.cards = cards;

        let drag_lost = state
            .drag
            .dragged_card()
            .is_some_and(|id| state.card(id).is_none());
        if drag_lost {
            state.drag = DragState::Idle;
        }

        let card_count = state.cards.len();
        drop(state);

        let _ = self.events.send(BoardEvent::Refreshed { card_count });
        Ok(card_count)
    }

    async fn confirm(&self, pending: PendingCommit<S>, message: String) -> CommitOutcome<S> {
        {
            let mut state = self.state.write().await;
            state.ledger.confirm(&pending);
            state.confirmed += 1;
        }

        tracing::info!(
            card_id = %pending.card_id,
            stage = %pending.target_stage,
            "Stage change confirmed"
        );

        let message = if message.is_empty() {
            moved_message(S::PIPELINE.noun(), pending.target_stage.title())
        } else {
            message
        };

        self.toast(ToastKind::Success, message.clone());

        if self.options.refresh_after_commit {
            let board = self.clone();
            tokio::spawn(async move {
                if let Err(e) = board.refresh().await {
                    tracing::warn!("Background refresh after commit failed: {}", e);
                }
            });
        }

        CommitOutcome::Confirmed {
            card_id: pending.card_id,
            stage: pending.target_stage,
            message,
        }
    }

    async fn roll_back(&self, pending: PendingCommit<S>, error: String) -> CommitOutcome<S> {
        let restored = {
            let mut state = self.state.write().await;
            let restore = state.ledger.fail(&pending);
            match (restore, state.card_mut(&pending.card_id)) {
                (Some(stage), Some(card)) if card.stage == pending.target_stage => {
                    card.stage = stage;
                    Some(stage)
                }
                _ => None,
            }
        };

        tracing::warn!(
            card_id = %pending.card_id,
            stage = %pending.target_stage,
            error = error.as_str(),
            "Stage change rejected"
        );

        self.toast(ToastKind::Error, error.clone());
        if let Some(stage) = restored {
            let _ = self.events.send(BoardEvent::RolledBack {
                card_id: pending.card_id.clone(),
                stage,
            });
        }

        CommitOutcome::RolledBack {
            card_id: pending.card_id,
            stage: restored,
            error,
        }
    }

    fn toast(&self, kind: ToastKind, message: String) {
        // No subscribers just means nobody is rendering toasts.
        let _ = self.events.send(BoardEvent::Toast(Toast { kind, message }));
    }
}
