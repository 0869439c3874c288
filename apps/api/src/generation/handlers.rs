//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::{AppError, AppJson};
use crate::generation::networks::NetworkProfile;
use crate::generation::pipeline::{GenerationRequest, GenerationResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub results: GenerationResult,
}

/// POST /api/generate
///
/// Generates one post per requested, known network. Unknown networks are
/// absent from `results`; a backend failure fails the whole request.
pub async fn handle_generate(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerationRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let results = state.pipeline.generate(&request).await?;
    Ok(Json(GenerateResponse { results }))
}

/// GET /api/networks
pub async fn handle_list_networks(State(state): State<AppState>) -> Json<Vec<NetworkProfile>> {
    Json(state.pipeline.profiles().iter().cloned().collect())
}
