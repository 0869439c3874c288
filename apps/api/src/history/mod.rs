//! Post history — the persistence collaborator for generated posts.
//!
//! The generation pipeline never touches this module. Handlers store a
//! finished `GenerationResult` here together with the request metadata, and
//! later list, edit, schedule or delete it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{null_as_default, AppError};
use crate::generation::pipeline::GenerationResult;

pub mod handlers;
pub mod store;

pub use store::RedisPostStore;

/// A saved generation, optionally scheduled for publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub topic: String,
    pub tone: String,
    pub networks: Vec<String>,
    pub results: GenerationResult,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// What the caller supplies when saving; id and timestamp are assigned here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub networks: Vec<String>,
    pub results: GenerationResult,
}

impl HistoryEntry {
    pub fn new(new: NewHistoryEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: new.topic,
            tone: new.tone,
            networks: new.networks,
            results: new.results,
            created_at,
            scheduled_for: None,
        }
    }

    /// Replaces one network's text. Hashtags are kept; `char_count` follows the new text.
    pub fn update_text(&mut self, network: &str, text: String) -> Result<(), AppError> {
        let post = self.results.remove(network).ok_or_else(|| {
            AppError::NotFound(format!("Network {network} not found in entry {}", self.id))
        })?;
        self.results.insert(network.to_string(), post.with_text(text));
        Ok(())
    }

    /// Calendar day match, in UTC.
    pub fn is_scheduled_on(&self, day: NaiveDate) -> bool {
        self.scheduled_for
            .is_some_and(|at| at.date_naive() == day)
    }
}

/// Key-value storage for history entries.
///
/// Carried in `AppState` as `Arc<dyn PostStore>`.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts or replaces an entry.
    async fn put(&self, entry: &HistoryEntry) -> Result<(), AppError>;
    /// Overwrites an entry only while it still exists; a deleted entry stays
    /// deleted and yields `AppError::NotFound`.
    async fn update(&self, entry: &HistoryEntry) -> Result<(), AppError>;
    async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>, AppError>;
    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<HistoryEntry>, AppError>;
    /// Returns whether an entry was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
