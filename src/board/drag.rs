use crate::domain::{Card, CardId, PipelineStage};

/// Per-gesture drag state. A session exists only between drag-start and drag-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(CardId),
}

impl DragState {
    pub fn dragged_card(&self) -> Option<&CardId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(id) => Some(id),
        }
    }
}

/// Why a drop produced no transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownCard,
    NoTarget,
    SameStage,
}

/// Resolves the element id under the pointer to a target stage.
///
/// Column ids win over card ids; a card id resolves to that card's current stage.
pub fn resolve_drop_target<S: PipelineStage>(cards: &[Card<S>], target_id: &str) -> Option<S> {
    if let Ok(stage) = target_id.parse::<S>() {
        return Some(stage);
    }

    cards
        .iter()
        .find(|card| card.id.as_str() == target_id)
        .map(|card| card.stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeadStage;

    fn cards() -> Vec<Card<LeadStage>> {
        vec![
            Card::new("1", LeadStage::New, "Northwind"),
            Card::new("2", LeadStage::Qualified, "Harbor"),
        ]
    }

    #[test]
    fn test_column_id_resolves_to_stage() {
        assert_eq!(
            resolve_drop_target(&cards(), "contacted"),
            Some(LeadStage::Contacted)
        );
    }

    #[test]
    fn test_card_id_resolves_to_its_stage() {
        assert_eq!(
            resolve_drop_target(&cards(), "2"),
            Some(LeadStage::Qualified)
        );
    }

    #[test]
    fn test_unknown_target() {
        assert_eq!(resolve_drop_target(&cards(), "trash"), None);
    }

    #[test]
    fn test_column_wins_over_card_with_same_id() {
        let cards = vec![
            Card::new("new", LeadStage::Converted, "Odd id"),
            Card::new("1", LeadStage::Qualified, "Harbor"),
        ];
        assert_eq!(resolve_drop_target(&cards, "new"), Some(LeadStage::New));
    }
}
