//! Network profiles — per-network character budget and style brief.
//!
//! The table is plain data. The pipeline only asks it `lookup(identifier)`;
//! adding a network means adding a profile here (or in the JSON file named by
//! `NETWORK_PROFILES_PATH`), never touching the pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Generation constraints for one target network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub identifier: String,
    /// Advisory budget communicated to the model. Never enforced by truncation.
    pub max_chars: u32,
    pub style_brief: String,
}

/// (identifier, max_chars, style_brief) for the built-in networks.
const DEFAULT_PROFILES: &[(&str, u32, &str)] = &[
    (
        "instagram",
        2200,
        "visual, emocional, con emojis estratégicos, 3-5 párrafos cortos, termina con una pregunta para generar engagement",
    ),
    (
        "linkedin",
        3000,
        "profesional pero humano, sin emojis excesivos, estructura clara con gancho en la primera línea, reflexión o aprendizaje, llamado a la acción al final",
    ),
    (
        "twitter",
        280,
        "directo, conciso, impactante, un solo mensaje poderoso",
    ),
];

/// Read-only mapping from network identifier to its profile.
/// Shared across concurrent requests; never mutated after startup.
#[derive(Debug, Clone)]
pub struct NetworkProfileTable {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl Default for NetworkProfileTable {
    fn default() -> Self {
        let profiles = DEFAULT_PROFILES
            .iter()
            .map(|&(identifier, max_chars, style_brief)| {
                (
                    identifier.to_string(),
                    NetworkProfile {
                        identifier: identifier.to_string(),
                        max_chars,
                        style_brief: style_brief.to_string(),
                    },
                )
            })
            .collect();
        Self { profiles }
    }
}

impl NetworkProfileTable {
    /// Exact, case-sensitive lookup. `None` means the network is unsupported.
    pub fn lookup(&self, identifier: &str) -> Option<&NetworkProfile> {
        self.profiles.get(identifier)
    }

    /// Adds a profile, replacing any existing one with the same identifier.
    pub fn with_profile(mut self, profile: NetworkProfile) -> Self {
        self.profiles.insert(profile.identifier.clone(), profile);
        self
    }

    /// Extends the table from a JSON array of profiles.
    pub fn extend_from_json(self, json: &str) -> Result<Self, serde_json::Error> {
        let extra: Vec<NetworkProfile> = serde_json::from_str(json)?;
        Ok(extra.into_iter().fold(self, Self::with_profile))
    }

    /// Extends the table from a JSON file holding an array of profiles.
    pub async fn extend_from_file(self, path: &Path) -> anyhow::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read network profiles from {}", path.display()))?;
        self.extend_from_json(&json)
            .with_context(|| format!("Invalid network profiles in {}", path.display()))
    }

    pub fn known_identifiers(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Profiles ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }
}
