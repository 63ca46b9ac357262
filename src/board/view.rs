use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{columns, Card, PipelineStage};

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView<S> {
    pub stage: S,
    pub title: &'static str,
    pub cards: Vec<Card<S>>,
}

/// What a UI layer renders: cards split into columns plus the floating drag preview.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView<S> {
    pub columns: Vec<ColumnView<S>>,
    pub overlay: Option<Card<S>>,
}

impl<S: PipelineStage> BoardView<S> {
    /// Partitions `cards` by stage in column order. Order inside a column is array order.
    pub fn partition(cards: &[Card<S>], overlay: Option<Card<S>>) -> Self {
        let columns = columns::<S>()
            .into_iter()
            .map(|column| ColumnView {
                stage: column.stage,
                title: column.title,
                cards: cards
                    .iter()
                    .filter(|card| card.stage == column.stage)
                    .cloned()
                    .collect(),
            })
            .collect();

        Self { columns, overlay }
    }

    pub fn column(&self, stage: S) -> Option<&ColumnView<S>> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|column| column.cards.len()).sum()
    }

    /// True when every card of `cards` shows up in exactly one column and nothing else does.
    pub fn is_partition_of(&self, cards: &[Card<S>]) -> bool {
        let mut seen = HashSet::new();
        for column in &self.columns {
            for card in &column.cards {
                if card.stage != column.stage || !seen.insert(&card.id) {
                    return false;
                }
            }
        }

        seen.len() == cards.len() && cards.iter().all(|card| seen.contains(&card.id))
    }
}
