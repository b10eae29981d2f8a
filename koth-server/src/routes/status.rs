//! Status endpoint

use axum::{extract::State, Json};
use koth_core::Role;
use serde::Serialize;
use std::sync::Arc;

use crate::state::ServerState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tournament_id: u64,
    pub role: Role,
    pub players: usize,
}

pub async fn status_handler(State(state): State<Arc<ServerState>>) -> Json<StatusResponse> {
    let tournament = &state.tournament;
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tournament_id: tournament.id(),
        role: tournament.role(),
        players: tournament.queue_len() + usize::from(tournament.king().is_some()),
    })
}
