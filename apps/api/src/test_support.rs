//! Test doubles shared by module tests: a scripted backend and an in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::generation::networks::NetworkProfileTable;
use crate::generation::pipeline::GenerationPipeline;
use crate::history::{HistoryEntry, PostStore};
use crate::llm_client::{LlmError, TextBackend};
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "s3cret";

const DEFAULT_REPLY: &str = r#"{"text":"Post generado","hashtags":["general"]}"#;

/// Backend that answers by network. The network is recognised from the
/// upper-cased name the prompt carries; unscripted networks get a default reply.
#[derive(Default)]
pub struct StubBackend {
    replies: HashMap<&'static str, Option<&'static str>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl StubBackend {
    pub fn reply(mut self, network: &'static str, reply: &'static str) -> Self {
        self.replies.insert(network, Some(reply));
        self
    }

    pub fn fail(mut self, network: &'static str) -> Self {
        self.replies.insert(network, None);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn max_tokens_seen(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl TextBackend for StubBackend {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_tokens));

        let scripted = self
            .replies
            .iter()
            .find(|(network, _)| prompt.contains(&format!("para {network} ")))
            .map(|(_, reply)| *reply);

        match scripted {
            Some(Some(reply)) => Ok(reply.to_string()),
            Some(None) => Err(LlmError::Api {
                status: 500,
                message: "stubbed backend failure".to_string(),
            }),
            None => Ok(DEFAULT_REPLY.to_string()),
        }
    }
}

/// In-memory `PostStore`; newest entries first.
#[derive(Default)]
pub struct MemoryPostStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn put(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|e| e.id != entry.id);
        entries.push(entry.clone());
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(())
    }

    async fn update(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        let slot = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| AppError::NotFound(format!("History entry {} not found", entry.id)))?;
        *slot = entry.clone();
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>, AppError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() != before)
    }
}

pub fn test_config() -> Config {
    Config {
        anthropic_api_key: "test-key".to_string(),
        app_password: TEST_PASSWORD.to_string(),
        redis_url: "redis://127.0.0.1/".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        llm_timeout_secs: 5,
        network_profiles_path: None,
    }
}

pub fn test_state(backend: Arc<StubBackend>, store: Arc<MemoryPostStore>) -> AppState {
    AppState {
        pipeline: GenerationPipeline::new(backend, Arc::new(NetworkProfileTable::default())),
        store,
        config: test_config(),
    }
}
