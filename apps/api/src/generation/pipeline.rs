//! Generation pipeline — one request in, one post per known network out.
//!
//! Flow per network, in request order: profile lookup → prompt build →
//! backend call → reply parse → insert into the result map.
//!
//! Unknown networks are skipped without an entry or an error. A reply that is
//! not the expected JSON still yields a post (the raw reply as text). A failed
//! backend call fails the whole request and discards completed networks.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{null_as_default, AppError};
use crate::generation::networks::{NetworkProfile, NetworkProfileTable};
use crate::generation::parser::parse_reply;
use crate::generation::prompts::build_prompt;
use crate::llm_client::TextBackend;

/// Output budget for a single post.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Read-only input to `generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub networks: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_hashtags: bool,
    #[serde(default, deserialize_with = "null_as_default", rename = "includeCTA")]
    pub include_cta: bool,
}

impl GenerationRequest {
    /// Rejects requests the pipeline cannot act on. Runs before any backend call.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.topic.trim().is_empty() {
            return Err(AppError::Validation("topic cannot be empty".to_string()));
        }
        if self.networks.is_empty() {
            return Err(AppError::Validation(
                "at least one network is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// One generated post. `hashtags` are bare (no `#`); `char_count` covers `text` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub text: String,
    pub hashtags: Vec<String>,
    pub char_count: usize,
}

impl GeneratedPost {
    pub fn new(text: String, hashtags: Vec<String>) -> Self {
        let char_count = text.chars().count();
        Self {
            text,
            hashtags,
            char_count,
        }
    }

    /// Replaces the body, keeping `char_count` in step.
    pub fn with_text(self, text: String) -> Self {
        Self::new(text, self.hashtags)
    }

    /// Post as it is copied or rendered: body, a blank line, then `#`-prefixed tags.
    pub fn display_text(&self) -> String {
        if self.hashtags.is_empty() {
            return self.text.clone();
        }
        let tags = self
            .hashtags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}\n\n{tags}", self.text)
    }
}

/// Network identifier → post. Only networks that were known and attempted have a key.
pub type GenerationResult = BTreeMap<String, GeneratedPost>;

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Stateless between calls; cloning shares the backend and profile table.
#[derive(Clone)]
pub struct GenerationPipeline {
    backend: Arc<dyn TextBackend>,
    profiles: Arc<NetworkProfileTable>,
}

impl GenerationPipeline {
    pub fn new(backend: Arc<dyn TextBackend>, profiles: Arc<NetworkProfileTable>) -> Self {
        Self { backend, profiles }
    }

    pub fn profiles(&self) -> &NetworkProfileTable {
        &self.profiles
    }

    /// Generates one post per known network in `request.networks`.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, AppError> {
        request.validate()?;

        info!(
            "Generating posts: topic={:?}, networks={}",
            request.topic.trim(),
            request.networks.len()
        );

        let mut results = GenerationResult::new();

        for identifier in &request.networks {
            if results.contains_key(identifier) {
                continue;
            }

            let Some(profile) = self.profiles.lookup(identifier) else {
                warn!("Skipping unknown network {identifier:?}");
                continue;
            };

            let post = self.generate_for_network(request, profile).await?;
            results.insert(identifier.clone(), post);
        }

        info!("Generated {} posts", results.len());
        Ok(results)
    }

    async fn generate_for_network(
        &self,
        request: &GenerationRequest,
        profile: &NetworkProfile,
    ) -> Result<GeneratedPost, AppError> {
        let prompt = build_prompt(request, profile);
        debug!(
            "Prompt for {}: {} chars",
            profile.identifier,
            prompt.chars().count()
        );

        let raw = self.backend.complete(&prompt, MAX_OUTPUT_TOKENS).await?;
        debug!("Reply for {}: {} chars", profile.identifier, raw.chars().count());

        let parsed = parse_reply(&raw);
        if !parsed.is_structured() {
            warn!(
                "Reply for {} was not structured JSON, using raw text",
                profile.identifier
            );
        }

        Ok(parsed.into_post(request.include_hashtags))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
