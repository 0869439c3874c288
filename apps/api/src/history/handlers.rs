//! Axum route handlers for the History API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::history::{HistoryEntry, NewHistoryEntry};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Only entries scheduled on this UTC day.
    pub scheduled_on: Option<NaiveDate>,
    /// Only entries without a schedule.
    #[serde(default)]
    pub unscheduled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTextRequest {
    pub text: String,
}

async fn load(state: &AppState, id: Uuid) -> Result<HistoryEntry, AppError> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("History entry {id} not found")))
}

/// POST /api/history
pub async fn handle_create(
    State(state): State<AppState>,
    AppJson(request): AppJson<NewHistoryEntry>,
) -> Result<(StatusCode, Json<HistoryEntry>), AppError> {
    if request.topic.trim().is_empty() {
        return Err(AppError::Validation("topic cannot be empty".to_string()));
    }

    let entry = HistoryEntry::new(request, Utc::now());
    state.store.put(&entry).await?;
    info!("Saved history entry {} ({} posts)", entry.id, entry.results.len());

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/history
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let entries = state
        .store
        .list()
        .await?
        .into_iter()
        .filter(|e| !query.unscheduled || e.scheduled_for.is_none())
        .filter(|e| query.scheduled_on.map_or(true, |day| e.is_scheduled_on(day)))
        .collect();
    Ok(Json(entries))
}

/// GET /api/history/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryEntry>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// DELETE /api/history/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(id).await? {
        return Err(AppError::NotFound(format!("History entry {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/history/:id/schedule
///
/// `scheduledFor: null` moves the entry back to unscheduled.
pub async fn handle_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<ScheduleRequest>,
) -> Result<Json<HistoryEntry>, AppError> {
    let mut entry = load(&state, id).await?;
    entry.scheduled_for = request.scheduled_for;
    state.store.update(&entry).await?;
    Ok(Json(entry))
}

/// GET /api/history/:id/networks/:network
///
/// Plain-text post ready to paste: body followed by `#`-prefixed hashtags.
pub async fn handle_copy_text(
    State(state): State<AppState>,
    Path((id, network)): Path<(Uuid, String)>,
) -> Result<String, AppError> {
    let entry = load(&state, id).await?;
    entry
        .results
        .get(&network)
        .map(|post| post.display_text())
        .ok_or_else(|| AppError::NotFound(format!("Network {network} not found in entry {id}")))
}

/// PATCH /api/history/:id/networks/:network
pub async fn handle_update_text(
    State(state): State<AppState>,
    Path((id, network)): Path<(Uuid, String)>,
    AppJson(request): AppJson<UpdateTextRequest>,
) -> Result<Json<HistoryEntry>, AppError> {
    let mut entry = load(&state, id).await?;
    entry.update_text(&network, request.text)?;
    state.store.update(&entry).await?;
    Ok(Json(entry))
}
