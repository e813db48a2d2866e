//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{ParticipantDto, ParticipantListDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Currently joined participants
pub async fn list_participants(State(state): State<Arc<AppState>>) -> Json<ParticipantListDto> {
    let connections = state.repository.count_connections().await;
    let participants = state
        .repository
        .participants()
        .await
        .iter()
        .map(ParticipantDto::from)
        .collect();

    Json(ParticipantListDto {
        connections,
        participants,
    })
}
