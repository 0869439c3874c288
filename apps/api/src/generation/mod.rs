// Post generation: network profiles, prompt templating, reply parsing and
// the per-network pipeline. All backend calls go through `llm_client::TextBackend`.

pub mod handlers;
pub mod networks;
pub mod parser;
pub mod pipeline;
pub mod prompts;
