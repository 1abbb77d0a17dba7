use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, Row};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::{helpers::parse_datetime, Database};

/// A raw row of the persisted key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

fn row_to_entry(row: &Row) -> Result<KvEntry> {
    let updated_at: String = row.get("updated_at")?;
    Ok(KvEntry {
        key: row.get("key")?,
        value: row.get("value")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn kv_get(&self, key: &str) -> Result<Option<KvEntry>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value, updated_at
                 FROM kv_store
                 WHERE key = ?1",
            )?;
            let mut rows = stmt.query(params![key])?;
            let entry = match rows.next()? {
                Some(row) => Some(row_to_entry(row)?),
                None => None,
            };
            Ok(entry)
        })
        .await
    }

    pub async fn kv_put(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write key {key}"))?;
            Ok(())
        })
        .await
    }

    /// Returns whether a value was stored under `key`.
    pub async fn kv_remove(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .with_context(|| format!("failed to remove key {key}"))?;
            Ok(removed > 0)
        })
        .await
    }

    pub async fn kv_keys(&self) -> Result<Vec<String>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key ASC")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })
        .await
    }

    /// Read and decode a JSON value. Undecodable values are logged and treated as
    /// absent so a corrupt entry cannot wedge the reader.
    pub async fn kv_get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(entry) = self.kv_get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("Ignoring undecodable value under key {key}: {err}");
                Ok(None)
            }
        }
    }

    pub async fn kv_put_json<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let serialized = serde_json::to_string(value)
            .with_context(|| format!("failed to encode value for key {key}"))?;
        self.kv_put(key, serialized).await
    }
}
