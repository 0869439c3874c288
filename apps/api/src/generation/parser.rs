//! Reply parsing — turns a raw backend reply into a `ParsedReply`.
//!
//! Parsing never fails: anything that is not the expected JSON object becomes
//! `ParsedReply::Unstructured` carrying the raw reply verbatim.

use serde::Deserialize;

use crate::generation::pipeline::GeneratedPost;

/// Outcome of parsing one backend reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    Structured { text: String, hashtags: Vec<String> },
    Unstructured { raw_text: String },
}

#[derive(Debug, Deserialize)]
struct StructuredReply {
    text: String,
    #[serde(default)]
    hashtags: Option<Vec<String>>,
}

impl ParsedReply {
    pub fn is_structured(&self) -> bool {
        matches!(self, ParsedReply::Structured { .. })
    }

    /// Normalises either variant into the post shape callers see.
    /// Hashtags are dropped when the request did not ask for them.
    pub fn into_post(self, include_hashtags: bool) -> GeneratedPost {
        match self {
            ParsedReply::Structured { text, hashtags } => {
                let hashtags = if include_hashtags { hashtags } else { Vec::new() };
                GeneratedPost::new(text, hashtags)
            }
            ParsedReply::Unstructured { raw_text } => GeneratedPost::new(raw_text, Vec::new()),
        }
    }
}

/// Parses a raw reply. Code fences are tolerated; the fallback keeps the
/// original, unstripped reply.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<StructuredReply>(cleaned) {
        Ok(reply) => ParsedReply::Structured {
            text: reply.text,
            hashtags: reply
                .hashtags
                .unwrap_or_default()
                .iter()
                .filter_map(|tag| normalize_hashtag(tag))
                .collect(),
        },
        Err(_) => ParsedReply::Unstructured {
            raw_text: raw.to_string(),
        },
    }
}

/// Strips leading ```/```json and trailing ``` markers plus surrounding
/// whitespace, repeating until nothing changes. Idempotent.
pub fn strip_code_fences(reply: &str) -> &str {
    let mut current = reply.trim();
    loop {
        let next = strip_fence_once(current);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

fn strip_fence_once(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = strip_language_tag(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn strip_language_tag(rest: &str) -> &str {
    match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    }
}

/// Bare tag: no `#` prefix, no surrounding whitespace. Empty tags are dropped.
fn normalize_hashtag(tag: &str) -> Option<String> {
    let bare = tag.trim().trim_start_matches('#').trim();
    (!bare.is_empty()).then(|| bare.to_string())
}
