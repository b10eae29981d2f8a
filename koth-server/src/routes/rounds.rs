//! Round result endpoints

use axum::{extract::State, Json};
use serde_json::json;
use std::sync::Arc;

use super::{host, ApiResult};
use crate::state::ServerState;

/// The king beat the challenger
pub async fn king_won(State(state): State<Arc<ServerState>>) -> ApiResult {
    let host = host(&state)?;
    let moved = host.move_challenger_to_end();

    if moved.is_some() {
        state.notify_subscribers();
    }
    Ok(Json(json!({
        "success": true,
        "changed": moved.is_some(),
        "moved_to_end": moved.map(|p| p.name),
        "king_win_streak": host.king_win_streak()
    })))
}

/// The challenger beat the king
pub async fn king_lost(State(state): State<Arc<ServerState>>) -> ApiResult {
    let host = host(&state)?;
    let before = host.king();
    host.move_king_to_end();
    let king = host.king();
    let changed = king != before;

    if changed {
        state.notify_subscribers();
    }
    Ok(Json(json!({
        "success": true,
        "changed": changed,
        "king": king.map(|p| p.name)
    })))
}
