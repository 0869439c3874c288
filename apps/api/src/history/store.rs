//! Redis-backed `PostStore`.
//!
//! Each entry is a JSON string under `postgen:history:<id>`; the sorted set
//! `postgen:history` orders ids by creation time (milliseconds).

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::{HistoryEntry, PostStore};

const INDEX_KEY: &str = "postgen:history";

fn entry_key(id: Uuid) -> String {
    format!("{INDEX_KEY}:{id}")
}

#[derive(Clone)]
pub struct RedisPostStore {
    client: redis::Client,
}

impl RedisPostStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

/// `SET key value XX`: writes only when the key is still present.
fn update_cmd(id: Uuid, json: String) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(entry_key(id)).arg(json).arg("XX");
    cmd
}

fn decode(json: &str) -> Result<HistoryEntry, AppError> {
    serde_json::from_str(json)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt history entry: {e}")))
}

/// Decodes an MGET result. Missing values (index ahead of a delete) and
/// corrupt values are skipped so one bad entry cannot hide the rest.
fn decode_listed(values: Vec<Option<String>>) -> Vec<HistoryEntry> {
    values
        .into_iter()
        .flatten()
        .filter_map(|json| match decode(&json) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping history entry: {e}");
                None
            }
        })
        .collect()
}

#[async_trait]
impl PostStore for RedisPostStore {
    async fn put(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let json = serde_json::to_string(entry)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize entry: {e}")))?;
        let mut conn = self.connection().await?;

        let _: () = redis::pipe()
            .atomic()
            .set(entry_key(entry.id), json)
            .ignore()
            .zadd(
                INDEX_KEY,
                entry.id.to_string(),
                entry.created_at.timestamp_millis(),
            )
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("Stored history entry {}", entry.id);
        Ok(())
    }

    async fn update(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let json = serde_json::to_string(entry)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize entry: {e}")))?;
        let mut conn = self.connection().await?;

        let written: Option<String> = update_cmd(entry.id, json).query_async(&mut conn).await?;
        if written.is_none() {
            return Err(AppError::NotFound(format!(
                "History entry {} not found",
                entry.id
            )));
        }

        debug!("Updated history entry {}", entry.id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>, AppError> {
        let mut conn = self.connection().await?;
        let json: Option<String> = conn.get(entry_key(id)).await?;
        json.as_deref().map(decode).transpose()
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, AppError> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.zrevrange(INDEX_KEY, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| format!("{INDEX_KEY}:{id}")).collect();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        Ok(decode_listed(values))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut conn = self.connection().await?;
        let (deleted, _): (i64, i64) = redis::pipe()
            .atomic()
            .del(entry_key(id))
            .zrem(INDEX_KEY, id.to_string())
            .query_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}
