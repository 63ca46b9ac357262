use std::collections::HashMap;

use crate::domain::{CardId, PipelineStage};

/// Rollback record captured when an optimistic update is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit<S> {
    pub seq: u64,
    pub card_id: CardId,
    pub previous_stage: S,
    pub target_stage: S,
}

#[derive(Debug, Clone)]
struct LedgerEntry<S> {
    seq: u64,
    previous_stage: S,
    target_stage: S,
}

/// In-flight commits, grouped per card in the order they were issued.
#[derive(Debug)]
pub struct CommitLedger<S> {
    next_seq: u64,
    entries: HashMap<CardId, Vec<LedgerEntry<S>>>,
}

impl<S> Default for CommitLedger<S> {
    fn default() -> Self {
        Self {
            next_seq: 1,
            entries: HashMap::new(),
        }
    }
}

impl<S: PipelineStage> CommitLedger<S> {
    pub fn open(&mut self, card_id: CardId, previous_stage: S, target_stage: S) -> PendingCommit<S> {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries
            .entry(card_id.clone())
            .or_default()
            .push(LedgerEntry {
                seq,
                previous_stage,
                target_stage,
            });

        PendingCommit {
            seq,
            card_id,
            previous_stage,
            target_stage,
        }
    }

    pub fn confirm(&mut self, commit: &PendingCommit<S>) {
        self.remove(commit);
    }

    /// Drops a failed commit and returns the stage its card should snap back to.
    ///
    /// When a later commit for the same card is still in flight the card is left
    /// alone and that commit inherits this one's rollback stage instead.
    pub fn fail(&mut self, commit: &PendingCommit<S>) -> Option<S> {
        let entries = self.entries.get_mut(&commit.card_id)?;
        let index = entries.iter().position(|e| e.seq == commit.seq)?;
        let failed = entries.remove(index);

        let restore = match entries.get_mut(index) {
            Some(later) => {
                later.previous_stage = failed.previous_stage;
                None
            }
            None => Some(failed.previous_stage),
        };

        if entries.is_empty() {
            self.entries.remove(&commit.card_id);
        }

        restore
    }

    /// Latest optimistic stage for every card with a commit in flight.
    pub fn optimistic_stages(&self) -> impl Iterator<Item = (&CardId, S)> + '_ {
        self.entries
            .iter()
            .filter_map(|(id, entries)| entries.last().map(|e| (id, e.target_stage)))
    }

    pub fn in_flight(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    fn remove(&mut self, commit: &PendingCommit<S>) {
        if let Some(entries) = self.entries.get_mut(&commit.card_id) {
            entries.retain(|e| e.seq != commit.seq);
            if entries.is_empty() {
                self.entries.remove(&commit.card_id);
            }
        }
    }
}
