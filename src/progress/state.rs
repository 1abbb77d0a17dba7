use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PositionInput;

use super::ledger::HistoryEntry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReadingStatus {
    Unvisited,
    Visited,
}

impl Default for ReadingStatus {
    fn default() -> Self {
        ReadingStatus::Unvisited
    }
}

/// Where a reader currently is inside one content item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPosition {
    pub status: ReadingStatus,
    pub content_item_id: String,
    pub absolute_position: usize,
    pub position: Option<PositionInput>,
    pub progress_percentage: u8,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReadingPosition {
    pub fn unvisited(content_item_id: impl Into<String>) -> Self {
        Self {
            content_item_id: content_item_id.into(),
            ..Self::default()
        }
    }

    pub fn from_entry(entry: &HistoryEntry, position: PositionInput) -> Self {
        Self {
            status: ReadingStatus::Visited,
            content_item_id: entry.content_item_id.clone(),
            absolute_position: entry.absolute_position,
            position: Some(position),
            progress_percentage: entry.progress_percentage,
            updated_at: Some(entry.timestamp),
        }
    }

    pub fn is_visited(&self) -> bool {
        self.status == ReadingStatus::Visited
    }

    pub fn visit(
        &mut self,
        absolute_position: usize,
        position: PositionInput,
        progress_percentage: u8,
        now: DateTime<Utc>,
    ) {
        self.status = ReadingStatus::Visited;
        self.absolute_position = absolute_position;
        self.position = Some(position);
        self.progress_percentage = progress_percentage;
        self.updated_at = Some(now);
    }
}
