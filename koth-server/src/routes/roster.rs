//! Roster and standings endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use koth_core::{Player, Standing, StandingsOrder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::ServerState;

#[derive(Deserialize)]
pub struct RosterRequest {
    pub players: Vec<Player>,
}

/// Reconcile against the full roster: newcomers join, absentees leave
pub async fn update_roster(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<RosterRequest>,
) -> Json<Value> {
    state.tournament.update_player_list(&req.players);
    state.notify_subscribers();
    Json(json!({
        "success": true,
        "tournament": state.tournament.view()
    }))
}

/// Append newcomers to the bottom of the queue
pub async fn add_players(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<RosterRequest>,
) -> Json<Value> {
    state.tournament.add_new_players_to_bottom(&req.players);
    state.notify_subscribers();
    Json(json!({
        "success": true,
        "tournament": state.tournament.view()
    }))
}

#[derive(Deserialize)]
pub struct StandingsParams {
    pub order: Option<StandingsOrder>,
}

pub async fn get_standings(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<StandingsParams>,
) -> Json<Vec<Standing>> {
    Json(state.tournament.standings(params.order.unwrap_or_default()))
}
