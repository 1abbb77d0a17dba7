//! Per-user reading history.
//!
//! The ledger holds at most one entry per content item. Updating an item rewrites
//! its entry where it already sits, so ledger order is the order of first visit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{find_item, ContentItem};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub content_item_id: String,
    pub absolute_position: usize,
    pub timestamp: DateTime<Utc>,
    pub progress_percentage: u8,
}

impl HistoryEntry {
    pub fn is_finished(&self) -> bool {
        self.progress_percentage >= 100
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry`, or replace the existing entry for the same item in place.
    pub fn upsert(&mut self, entry: HistoryEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.content_item_id == entry.content_item_id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, content_item_id: &str) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.content_item_id == content_item_id)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<HistoryEntry>> for HistoryLedger {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        let mut ledger = HistoryLedger::new();
        for entry in entries {
            ledger.upsert(entry);
        }
        ledger
    }
}

/// Started but unfinished items from `catalog`, most recently read first.
pub fn continue_reading<'a>(
    ledger: &HistoryLedger,
    catalog: &'a [ContentItem],
) -> Vec<(&'a ContentItem, HistoryEntry)> {
    let mut in_progress: Vec<(&ContentItem, HistoryEntry)> = ledger
        .entries()
        .iter()
        .filter(|entry| !entry.is_finished())
        .filter_map(|entry| {
            find_item(catalog, &entry.content_item_id).map(|item| (item, entry.clone()))
        })
        .collect();

    in_progress.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    in_progress
}
