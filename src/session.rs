//! Signed-in user and persona storage on top of the local key-value store.
//!
//! The current user lives under `"user"` and the finished onboarding result under
//! `"userPersona"`, both JSON encoded. Signing out parks the user under
//! `"user:<id>"` so their history is there again on the next sign-in.

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{db::Database, persona::CompletedPersona, progress::HistoryLedger};

pub const USER_KEY: &str = "user";
pub const PERSONA_KEY: &str = "userPersona";

fn parked_user_key(user_id: &str) -> String {
    format!("{USER_KEY}:{user_id}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub history: HistoryLedger,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: HistoryLedger::new(),
        }
    }
}

/// Source of the signed-in user and sink for their reading history.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `None` when nobody is signed in.
    async fn current_user(&self) -> Result<Option<User>>;

    /// Replace the stored history of `user_id`. Writes for a user that is no longer
    /// signed in are dropped.
    async fn persist_history(&self, user_id: &str, history: &HistoryLedger) -> Result<()>;
}

#[derive(Clone)]
pub struct UserSessionStore {
    db: Database,
}

impl UserSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Make `user_id` the current user, restoring a parked history when one exists.
    pub async fn sign_in(&self, user_id: &str) -> Result<User> {
        if let Some(current) = self.db.kv_get_json::<User>(USER_KEY).await? {
            if current.id == user_id {
                return Ok(current);
            }
            self.park(&current).await?;
        }

        let parked_key = parked_user_key(user_id);
        let user = match self.db.kv_get_json::<User>(&parked_key).await? {
            Some(parked) => {
                self.db.kv_remove(&parked_key).await?;
                parked
            }
            None => User::new(user_id),
        };

        self.db.kv_put_json(USER_KEY, &user).await?;
        info!("User {} signed in ({} history entries)", user.id, user.history.len());
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<()> {
        if let Some(current) = self.db.kv_get_json::<User>(USER_KEY).await? {
            self.park(&current).await?;
            info!("User {} signed out", current.id);
        }
        self.db.kv_remove(USER_KEY).await?;
        Ok(())
    }

    async fn park(&self, user: &User) -> Result<()> {
        self.db.kv_put_json(&parked_user_key(&user.id), user).await
    }

    /// Forget the current user's history and persona. The only path that removes
    /// ledger entries.
    pub async fn clear_user_data(&self) -> Result<()> {
        if let Some(current) = self.db.kv_get_json::<User>(USER_KEY).await? {
            self.db.kv_remove(&parked_user_key(&current.id)).await?;
            self.db.kv_put_json(USER_KEY, &User::new(current.id)).await?;
        }
        self.db.kv_remove(PERSONA_KEY).await?;
        Ok(())
    }

    pub async fn save_persona(&self, persona: &CompletedPersona) -> Result<()> {
        self.db.kv_put_json(PERSONA_KEY, persona).await
    }

    pub async fn load_persona(&self) -> Result<Option<CompletedPersona>> {
        Ok(self
            .db
            .kv_get_json::<CompletedPersona>(PERSONA_KEY)
            .await?
            .map(CompletedPersona::reclassified))
    }

    pub async fn clear_persona(&self) -> Result<()> {
        self.db.kv_remove(PERSONA_KEY).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for UserSessionStore {
    async fn current_user(&self) -> Result<Option<User>> {
        self.db.kv_get_json(USER_KEY).await
    }

    async fn persist_history(&self, user_id: &str, history: &HistoryLedger) -> Result<()> {
        let Some(mut user) = self.db.kv_get_json::<User>(USER_KEY).await? else {
            warn!("Dropping history write for {user_id}: nobody is signed in");
            return Ok(());
        };
        if user.id != user_id {
            warn!("Dropping history write for {user_id}: {} is signed in", user.id);
            return Ok(());
        }

        user.history = history.clone();
        self.db.kv_put_json(USER_KEY, &user).await
    }
}
