pub mod catalog;
pub mod db;
pub mod error;
pub mod persona;
pub mod progress;
pub mod session;
pub mod settings;
mod utils;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

pub use catalog::{ContentItem, PositionInput};
pub use error::ReaderError;
pub use utils::logging::init_logging;

use catalog::validate_catalog;
use db::Database;
use persona::{rank_by_persona, CompletedPersona, PersonaAnswers};
use progress::{
    continue_reading, HistoryEntry, ProgressKey, ProgressRecorder, ProgressTracker, SystemClock,
};
use session::{SessionProvider, User, UserSessionStore};
use settings::SettingsStore;

/// Everything a reader front end needs, opened from one data directory.
pub struct AppState {
    pub db: Database,
    pub session: UserSessionStore,
    pub settings: SettingsStore,
    pub recorder: ProgressRecorder,
}

impl AppState {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("readfolio.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        Ok(Self::with_parts(db, settings))
    }

    pub fn with_parts(db: Database, settings: SettingsStore) -> Self {
        let session = UserSessionStore::new(db.clone());
        let recorder = ProgressRecorder::new(
            Arc::new(session.clone()),
            Arc::new(SystemClock),
            &settings.reader(),
        );

        Self {
            db,
            session,
            settings,
            recorder,
        }
    }

    /// Open a reader on `item` for whoever is signed in.
    ///
    /// A position still pending for the same item (from a reader that was just
    /// dropped) is written first so the new reader resumes from it.
    pub async fn open_reader(&self, item: Arc<ContentItem>) -> Result<ProgressTracker> {
        if let Some(user) = self.session.current_user().await? {
            self.recorder
                .flush(&ProgressKey::new(user.id, item.id.clone()))
                .await?;
        }
        let user = self.session.current_user().await?;
        let tracker = ProgressTracker::open(
            item,
            user.as_ref(),
            self.recorder.clone(),
            self.settings.reader().position_policy,
        )?;
        Ok(tracker)
    }

    /// Classify and store a finished questionnaire.
    pub async fn complete_onboarding(&self, answers: PersonaAnswers) -> Result<CompletedPersona> {
        let persona = answers.finalize(Utc::now())?;
        self.session.save_persona(&persona).await?;
        info!("Onboarding complete: {}", persona.label());
        Ok(persona)
    }

    /// The catalog ordered for the stored persona, or unchanged without one.
    pub async fn for_you(&self, catalog: &[ContentItem]) -> Result<Vec<ContentItem>> {
        validate_catalog(catalog)?;
        match self.session.load_persona().await? {
            Some(persona) => Ok(rank_by_persona(catalog, persona.answers())),
            None => Ok(catalog.to_vec()),
        }
    }

    pub async fn continue_reading(
        &self,
        catalog: &[ContentItem],
    ) -> Result<Vec<(ContentItem, HistoryEntry)>> {
        let Some(user) = self.session.current_user().await? else {
            return Ok(Vec::new());
        };
        Ok(continue_reading(&user.history, catalog)
            .into_iter()
            .map(|(item, entry)| (item.clone(), entry))
            .collect())
    }

    pub async fn sign_in(&self, user_id: &str) -> Result<User> {
        self.session.sign_in(user_id).await
    }

    /// Write pending progress before the session ends.
    pub async fn sign_out(&self) -> Result<()> {
        self.recorder.flush_all().await;
        self.session.sign_out().await
    }

    /// Flush every pending write. Call before the process exits.
    pub async fn shutdown(&self) -> usize {
        let flushed = self.recorder.flush_all().await;
        info!("Flushed {flushed} pending progress writes on shutdown");
        flushed
    }
}
