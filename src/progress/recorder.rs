use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::session::SessionProvider;
use crate::settings::ReaderSettings;

use super::ledger::HistoryEntry;
use super::position::compute_progress_percentage;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A position change waiting to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub content_item_id: String,
    pub absolute_position: usize,
    pub total_units: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub user_id: String,
    pub content_item_id: String,
}

impl ProgressKey {
    pub fn new(user_id: impl Into<String>, content_item_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            content_item_id: content_item_id.into(),
        }
    }
}

/// Upsert a ledger entry for `update` into the current user's history.
///
/// Returns `None` without touching storage when nobody is signed in or a different
/// user is signed in than the one the update belongs to.
pub async fn record_progress(
    session: &dyn SessionProvider,
    clock: &dyn Clock,
    user_id: &str,
    update: &ProgressUpdate,
) -> Result<Option<HistoryEntry>> {
    let Some(mut user) = session.current_user().await? else {
        log::debug!(
            "No signed-in user; progress on {} not recorded",
            update.content_item_id
        );
        return Ok(None);
    };
    if user.id != user_id {
        log::debug!("User {user_id} is no longer signed in; progress not recorded");
        return Ok(None);
    }

    let entry = HistoryEntry {
        content_item_id: update.content_item_id.clone(),
        absolute_position: update.absolute_position,
        timestamp: clock.now(),
        progress_percentage: compute_progress_percentage(
            update.absolute_position,
            update.total_units,
        ),
    };

    user.history.upsert(entry.clone());
    session.persist_history(&user.id, &user.history).await?;

    Ok(Some(entry))
}

struct PendingWrite {
    update: ProgressUpdate,
    generation: u64,
    cancel: CancellationToken,
}

/// Debounced writer shared by every open reader.
///
/// Each (user, item) key holds at most one pending write. Scheduling again cancels
/// the pending write's timer and restarts the quiet window, so only the last
/// position inside the window reaches storage.
#[derive(Clone)]
pub struct ProgressRecorder {
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    delay: Duration,
    pending: Arc<Mutex<HashMap<ProgressKey, PendingWrite>>>,
    // Held while a pending write is taken out of `pending` and persisted, so
    // writes land in the order they were taken and a flush waits for any write
    // already in flight.
    write_lock: Arc<Mutex<()>>,
    generation: Arc<AtomicU64>,
}

impl ProgressRecorder {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
        settings: &ReaderSettings,
    ) -> Self {
        Self {
            session,
            clock,
            delay: settings.debounce(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            write_lock: Arc::new(Mutex::new(())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Queue `update` for `user_id`, replacing any write still waiting for the same
    /// item. Without a user this does nothing.
    pub async fn schedule(&self, user_id: Option<&str>, update: ProgressUpdate) {
        let Some(user_id) = user_id else {
            log::debug!(
                "No signed-in user; skipping progress for {}",
                update.content_item_id
            );
            return;
        };

        let key = ProgressKey::new(user_id, update.content_item_id.clone());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.remove(&key) {
            previous.cancel.cancel();
        }

        log::debug!(
            "Progress for {}/{} scheduled at unit {} in {:?}",
            key.user_id,
            key.content_item_id,
            update.absolute_position,
            self.delay
        );

        // The map lock is held until the entry is inserted, so the timer task
        // cannot look for it too early.
        tokio::spawn(self.clone().fire_after_delay(key.clone(), generation, cancel.clone()));

        pending.insert(
            key,
            PendingWrite {
                update,
                generation,
                cancel,
            },
        );
    }

    async fn fire_after_delay(self, key: ProgressKey, generation: u64, cancel: CancellationToken) {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.cancelled() => return,
        }

        let _write_guard = self.write_lock.lock().await;
        let update = {
            let mut pending = self.pending.lock().await;
            let is_current = pending
                .get(&key)
                .is_some_and(|write| write.generation == generation);
            if is_current {
                pending.remove(&key).map(|write| write.update)
            } else {
                None
            }
        };

        if let Some(update) = update {
            if let Err(err) = self.write(&key, &update).await {
                log_error!(
                    "Failed to persist progress for {}/{}: {err:?}",
                    key.user_id,
                    key.content_item_id
                );
            }
        }
    }

    /// Callers hold `write_lock`.
    async fn write(
        &self,
        key: &ProgressKey,
        update: &ProgressUpdate,
    ) -> Result<Option<HistoryEntry>> {
        let entry = record_progress(
            self.session.as_ref(),
            self.clock.as_ref(),
            &key.user_id,
            update,
        )
        .await?;

        if let Some(entry) = &entry {
            log_info!(
                "Recorded {}% ({}) of {} for {}",
                entry.progress_percentage,
                entry.absolute_position,
                entry.content_item_id,
                key.user_id
            );
        }
        Ok(entry)
    }

    /// Write the pending update for `key` now instead of waiting for its timer.
    ///
    /// Also waits for a write of `key` that a timer already started, so the ledger
    /// is current once this returns.
    pub async fn flush(&self, key: &ProgressKey) -> Result<Option<HistoryEntry>> {
        let _write_guard = self.write_lock.lock().await;
        let pending = self.pending.lock().await.remove(key);
        match pending {
            Some(write) => {
                write.cancel.cancel();
                self.write(key, &write.update).await
            }
            None => Ok(None),
        }
    }

    /// Write every pending update now. Failures are logged and do not stop the
    /// remaining writes; returns how many entries were written.
    pub async fn flush_all(&self) -> usize {
        let _write_guard = self.write_lock.lock().await;
        let drained: Vec<(ProgressKey, PendingWrite)> =
            self.pending.lock().await.drain().collect();

        let mut flushed = 0;
        for (key, write) in drained {
            write.cancel.cancel();
            match self.write(&key, &write.update).await {
                Ok(Some(_)) => flushed += 1,
                Ok(None) => {}
                Err(err) => log_error!(
                    "Failed to flush progress for {}/{}: {err:?}",
                    key.user_id,
                    key.content_item_id
                ),
            }
        }
        flushed
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::progress::HistoryLedger;
    use crate::session::User;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;

    /// In-memory session that records every history write.
    #[derive(Default)]
    pub(crate) struct RecordingSession {
        pub user: StdMutex<Option<User>>,
        pub writes: StdMutex<Vec<HistoryLedger>>,
        pub persist_delay: Duration,
    }

    impl RecordingSession {
        pub fn signed_in(user_id: &str) -> Self {
            Self {
                user: StdMutex::new(Some(User::new(user_id))),
                writes: StdMutex::new(Vec::new()),
                persist_delay: Duration::ZERO,
            }
        }

        pub fn with_persist_delay(mut self, delay: Duration) -> Self {
            self.persist_delay = delay;
            self
        }

        pub fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }

        pub fn last_write(&self) -> Option<HistoryLedger> {
            self.writes.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl SessionProvider for RecordingSession {
        async fn current_user(&self) -> Result<Option<User>> {
            Ok(self.user.lock().unwrap().clone())
        }

        async fn persist_history(&self, user_id: &str, history: &HistoryLedger) -> Result<()> {
            if !self.persist_delay.is_zero() {
                tokio::time::sleep(self.persist_delay).await;
            }
            let mut user = self.user.lock().unwrap();
            if let Some(user) = user.as_mut().filter(|u| u.id == user_id) {
                user.history = history.clone();
                self.writes.lock().unwrap().push(history.clone());
            }
            Ok(())
        }
    }

    pub(crate) struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    pub(crate) fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn settings() -> ReaderSettings {
        ReaderSettings {
            debounce_ms: 500,
            ..ReaderSettings::default()
        }
    }

    fn update(item: &str, position: usize) -> ProgressUpdate {
        ProgressUpdate {
            content_item_id: item.into(),
            absolute_position: position,
            total_units: 11,
        }
    }

    fn recorder(session: &Arc<RecordingSession>) -> ProgressRecorder {
        ProgressRecorder::new(session.clone(), fixed_clock(), &settings())
    }

    #[tokio::test]
    async fn record_progress_upserts_entry() {
        let session = RecordingSession::signed_in("reader");
        let clock = fixed_clock();

        let entry = record_progress(&session, clock.as_ref(), "reader", &update("a", 5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.progress_percentage, 50);
        assert_eq!(entry.timestamp, clock.0);

        record_progress(&session, clock.as_ref(), "reader", &update("b", 0))
            .await
            .unwrap();
        record_progress(&session, clock.as_ref(), "reader", &update("a", 10))
            .await
            .unwrap();

        let ledger = session.last_write().unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0].content_item_id, "a");
        assert_eq!(ledger.entries()[0].progress_percentage, 100);
    }

    #[tokio::test]
    async fn record_progress_without_user_is_a_no_op() {
        let session = RecordingSession::default();
        let result = record_progress(&session, fixed_clock().as_ref(), "reader", &update("a", 1))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(session.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_collapse_into_one_write() {
        let session = Arc::new(RecordingSession::signed_in("reader"));
        let recorder = recorder(&session);

        recorder.schedule(Some("reader"), update("a", 1)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        recorder.schedule(Some("reader"), update("a", 2)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        recorder.schedule(Some("reader"), update("a", 3)).await;

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(session.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.write_count(), 1);
        let ledger = session.last_write().unwrap();
        assert_eq!(ledger.get("a").unwrap().absolute_position, 3);
        assert_eq!(recorder.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_debounce_independently() {
        let session = Arc::new(RecordingSession::signed_in("reader"));
        let recorder = recorder(&session);

        recorder.schedule(Some("reader"), update("a", 1)).await;
        recorder.schedule(Some("reader"), update("b", 4)).await;
        assert_eq!(recorder.pending_count().await, 2);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(session.write_count(), 2);
        let ledger = session.last_write().unwrap();
        assert_eq!(ledger.get("a").unwrap().absolute_position, 1);
        assert_eq!(ledger.get("b").unwrap().absolute_position, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately_and_cancels_timer() {
        let session = Arc::new(RecordingSession::signed_in("reader"));
        let recorder = recorder(&session);

        recorder.schedule(Some("reader"), update("a", 7)).await;
        let entry = recorder
            .flush(&ProgressKey::new("reader", "a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.absolute_position, 7);
        assert_eq!(session.write_count(), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(session.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_all_drains_every_key() {
        let session = Arc::new(RecordingSession::signed_in("reader"));
        let recorder = recorder(&session);

        recorder.schedule(Some("reader"), update("a", 1)).await;
        recorder.schedule(Some("reader"), update("b", 2)).await;
        assert_eq!(recorder.flush_all().await, 2);
        assert_eq!(recorder.pending_count().await, 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(session.write_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_without_user_does_nothing() {
        let session = Arc::new(RecordingSession::signed_in("reader"));
        let recorder = recorder(&session);

        recorder.schedule(None, update("a", 1)).await;
        assert_eq!(recorder.pending_count().await, 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(session.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_waits_for_a_write_already_in_flight() {
        let session = Arc::new(
            RecordingSession::signed_in("reader").with_persist_delay(Duration::from_millis(200)),
        );
        let recorder = recorder(&session);

        recorder.schedule(Some("reader"), update("a", 6)).await;
        // The timer has fired and its write is still running.
        tokio::time::sleep(Duration::from_millis(550)).await;
        assert_eq!(recorder.pending_count().await, 0);
        assert_eq!(session.write_count(), 0);

        let flushed = recorder.flush(&ProgressKey::new("reader", "a")).await.unwrap();
        assert!(flushed.is_none());
        assert_eq!(session.write_count(), 1);
        let ledger = session.last_write().unwrap();
        assert_eq!(ledger.get("a").unwrap().absolute_position, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_timer_does_not_overwrite_newer_position() {
        let session = Arc::new(
            RecordingSession::signed_in("reader").with_persist_delay(Duration::from_millis(200)),
        );
        let recorder = recorder(&session);

        recorder.schedule(Some("reader"), update("a", 1)).await;
        tokio::time::sleep(Duration::from_millis(550)).await;
        // First write is in flight; a newer position arrives and is flushed.
        recorder.schedule(Some("reader"), update("a", 9)).await;
        recorder.flush(&ProgressKey::new("reader", "a")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(session.write_count(), 2);
        let ledger = session.last_write().unwrap();
        assert_eq!(ledger.get("a").unwrap().absolute_position, 9);
    }
}
