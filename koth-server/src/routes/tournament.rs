//! Tournament state endpoints
//!
//! Queue moves, timer settings and restarts. Mutations answer with the
//! updated view.

use axum::{extract::State, http::StatusCode, Json};
use koth_core::{Position, TournamentView};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{api_error, host, ApiResult};
use crate::state::ServerState;

/// Get the current king, queue and timers
pub async fn get_tournament(State(state): State<Arc<ServerState>>) -> Json<TournamentView> {
    Json(state.tournament.view())
}

/// Plain-text summary, as sent to subscribers
pub async fn get_tournament_data(State(state): State<Arc<ServerState>>) -> String {
    state.tournament.tournament_data()
}

/// Move request: name the player by id, or by the slot they occupy
#[derive(Deserialize)]
pub struct MoveRequest {
    pub player: Option<Uuid>,
    pub from: Option<Position>,
    pub to: Position,
}

pub async fn move_player(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<MoveRequest>,
) -> ApiResult {
    let host = host(&state)?;

    match (req.player, req.from) {
        (Some(id), _) => {
            let player = state
                .find_player(id)
                .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown player {}", id)))?;
            host.move_player(&player, req.to);
        }
        (None, Some(from)) => host.move_player_at(from, req.to),
        (None, None) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Must provide \"player\" or \"from\"",
            ))
        }
    }

    state.notify_subscribers();
    Ok(Json(json!({
        "success": true,
        "tournament": state.tournament.view()
    })))
}

/// Timer settings in seconds; values below 1 turn a timer off
#[derive(Deserialize)]
pub struct TimersRequest {
    pub game: Option<i32>,
    pub round: Option<i32>,
}

pub async fn set_timers(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<TimersRequest>,
) -> ApiResult {
    let host = host(&state)?;

    if let Some(seconds) = req.game {
        host.set_game_timer_setting(seconds);
    }
    if let Some(seconds) = req.round {
        host.set_round_timer_setting(seconds);
    }

    Ok(Json(json!({
        "success": true,
        "game_timer_remaining": host.remaining_game_time(),
        "round_timer_remaining": host.remaining_round_time()
    })))
}

#[derive(Deserialize, Default)]
pub struct RestartRequest {
    pub king: Option<Uuid>,
}

/// Start over with the same players and cleared records
pub async fn restart(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<RestartRequest>,
) -> ApiResult {
    let host = host(&state)?;

    let king = match req.king {
        Some(id) => Some(
            state
                .find_player(id)
                .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown player {}", id)))?,
        ),
        None => None,
    };
    host.restart_tournament(king, &state.everyone());

    state.notify_subscribers();
    Ok(Json(json!({
        "success": true,
        "tournament": state.tournament.view()
    })))
}
