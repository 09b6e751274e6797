//! Status ledger
//!
//! Pool workers return nothing to the dispatcher; every status change is
//! recorded here instead. A global sequence number orders events across
//! workers, which is what the phase barrier is checked against.

use super::work::{Phase, WorkItem, WorkStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// One recorded status change.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEvent {
    /// Global sequence number (strictly increasing across workers)
    pub sequence: u64,
    /// Phase of the item
    pub phase: Phase,
    /// Status entered
    pub status: WorkStatus,
    /// Wall-clock time
    pub at: DateTime<Utc>,
}

/// Concurrent per-item history of status changes.
#[derive(Debug, Default)]
pub struct StatusLedger {
    history: DashMap<String, Vec<LedgerEvent>>,
    sequence: AtomicU64,
}

impl StatusLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the item's current status.
    pub fn record(&self, item: &WorkItem) {
        let event = LedgerEvent {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            phase: item.phase(),
            status: item.status(),
            at: Utc::now(),
        };
        self.history.entry(item.label()).or_default().push(event);
    }

    /// Number of items seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Check if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Status history of one item, oldest first.
    #[must_use]
    pub fn history(&self, label: &str) -> Vec<LedgerEvent> {
        self.history
            .get(label)
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Latest status of one item.
    #[must_use]
    pub fn latest(&self, label: &str) -> Option<WorkStatus> {
        self.history
            .get(label)
            .and_then(|events| events.last().map(|e| e.status))
    }

    /// Final status counts for a phase, keyed by status name.
    #[must_use]
    pub fn status_counts(&self, phase: Phase) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.history {
            if let Some(last) = entry.value().last() {
                if last.phase == phase {
                    *counts.entry(last.status.to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Labels of items in `phase` whose last status is `Failed`.
    #[must_use]
    pub fn failures(&self, phase: Phase) -> Vec<String> {
        let mut failed: Vec<String> = self
            .history
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .last()
                    .is_some_and(|e| e.phase == phase && e.status == WorkStatus::Failed)
            })
            .map(|entry| entry.key().clone())
            .collect();
        failed.sort();
        failed
    }

    /// Sequence number of the last terminal event of a phase.
    #[must_use]
    pub fn last_terminal_sequence(&self, phase: Phase) -> Option<u64> {
        self.events(phase)
            .filter(|e| e.status.is_terminal())
            .map(|e| e.sequence)
            .max()
    }

    /// Sequence number of the first event of a phase with the given status.
    #[must_use]
    pub fn first_sequence_of(&self, phase: Phase, status: WorkStatus) -> Option<u64> {
        self.events(phase)
            .filter(|e| e.status == status)
            .map(|e| e.sequence)
            .min()
    }

    /// Whether every item of a phase has reached a terminal status.
    #[must_use]
    pub fn all_terminal(&self, phase: Phase) -> bool {
        self.history.iter().all(|entry| {
            entry
                .value()
                .last()
                .map_or(true, |e| e.phase != phase || e.status.is_terminal())
        })
    }

    fn events(&self, phase: Phase) -> impl Iterator<Item = LedgerEvent> + '_ {
        self.history.iter().flat_map(move |entry| {
            entry
                .value()
                .iter()
                .filter(|e| e.phase == phase)
                .cloned()
                .collect::<Vec<_>>()
        })
    }
}
