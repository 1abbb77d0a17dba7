use std::sync::Arc;

use log::{error, warn};

use crate::catalog::{ContentItem, PositionInput};
use crate::error::Result;
use crate::session::User;
use crate::settings::PositionPolicy;

use super::ledger::HistoryEntry;
use super::position::{compute_progress_percentage, locate, resolve_position};
use super::recorder::{ProgressKey, ProgressRecorder, ProgressUpdate};
use super::state::ReadingPosition;

/// Reading state for one open content item.
///
/// Every move updates the in-memory position right away and hands the new position
/// to the shared [`ProgressRecorder`], which persists it once navigation settles.
/// Closing (or dropping) the tracker writes any pending position immediately.
pub struct ProgressTracker {
    item: Arc<ContentItem>,
    user_id: Option<String>,
    state: ReadingPosition,
    recorder: ProgressRecorder,
    policy: PositionPolicy,
    closed: bool,
}

impl ProgressTracker {
    /// Open `item` for `user`, resuming from their ledger entry when there is one.
    pub fn open(
        item: Arc<ContentItem>,
        user: Option<&User>,
        recorder: ProgressRecorder,
        policy: PositionPolicy,
    ) -> Result<Self> {
        item.validate()?;

        let restored = user
            .and_then(|user| user.history.get(&item.id))
            .and_then(|entry| match locate(&item, entry.absolute_position) {
                Ok(position) => Some(ReadingPosition::from_entry(entry, position)),
                Err(err) => {
                    warn!("Ignoring stored position for {}: {err}", item.id);
                    None
                }
            });

        Ok(Self {
            state: restored.unwrap_or_else(|| ReadingPosition::unvisited(item.id.clone())),
            user_id: user.map(|user| user.id.clone()),
            item,
            recorder,
            policy,
            closed: false,
        })
    }

    pub fn item(&self) -> &ContentItem {
        &self.item
    }

    pub fn snapshot(&self) -> ReadingPosition {
        self.state.clone()
    }

    pub async fn jump_to(&mut self, input: PositionInput) -> Result<ReadingPosition> {
        let absolute = resolve_position(&self.item, input, self.policy)?;
        let position = locate(&self.item, absolute)?;
        Ok(self.move_to(absolute, position).await)
    }

    /// Move to the next unit; stays on the last unit once there. The first move
    /// into an unvisited item lands on unit 0.
    pub async fn advance(&mut self) -> Result<ReadingPosition> {
        let last = self.item.total_units().saturating_sub(1);
        let next = if self.state.is_visited() {
            (self.state.absolute_position + 1).min(last)
        } else {
            0
        };
        let position = locate(&self.item, next)?;
        Ok(self.move_to(next, position).await)
    }

    /// Move to the previous unit, stopping at unit 0.
    pub async fn back(&mut self) -> Result<ReadingPosition> {
        let previous = self.state.absolute_position.saturating_sub(1);
        let position = locate(&self.item, previous)?;
        Ok(self.move_to(previous, position).await)
    }

    async fn move_to(&mut self, absolute: usize, position: PositionInput) -> ReadingPosition {
        let total_units = self.item.total_units();
        self.state.visit(
            absolute,
            position,
            compute_progress_percentage(absolute, total_units),
            self.recorder.clock().now(),
        );

        self.recorder
            .schedule(
                self.user_id.as_deref(),
                ProgressUpdate {
                    content_item_id: self.item.id.clone(),
                    absolute_position: absolute,
                    total_units,
                },
            )
            .await;

        self.state.clone()
    }

    fn key(&self) -> Option<ProgressKey> {
        self.user_id
            .as_ref()
            .map(|user_id| ProgressKey::new(user_id.clone(), self.item.id.clone()))
    }

    /// Persist the pending position now.
    pub async fn flush(&self) -> anyhow::Result<Option<HistoryEntry>> {
        match self.key() {
            Some(key) => self.recorder.flush(&key).await,
            None => Ok(None),
        }
    }

    pub async fn close(mut self) -> anyhow::Result<Option<HistoryEntry>> {
        self.closed = true;
        self.flush().await
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Some(key) = self.key() else {
            return;
        };
        // Outside a runtime there is nothing to flush onto; the pending timer (if
        // any) was spawned on a runtime that is gone as well.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let recorder = self.recorder.clone();
        handle.spawn(async move {
            if let Err(err) = recorder.flush(&key).await {
                error!(
                    "Failed to flush progress for {}/{} on close: {err:?}",
                    key.user_id, key.content_item_id
                );
            }
        });
    }
}
