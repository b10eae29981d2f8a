//! HTTP route handlers

pub mod rounds;
pub mod roster;
pub mod status;
pub mod subscribers;
pub mod tournament;

use axum::{http::StatusCode, Json};
use koth_core::HostTournament;
use serde_json::{json, Value};

use crate::state::ServerState;

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult = Result<Json<Value>, ApiError>;

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Mutations are only allowed on the host
pub fn host(state: &ServerState) -> Result<&HostTournament, ApiError> {
    state
        .tournament
        .as_host()
        .ok_or_else(|| api_error(StatusCode::CONFLICT, "Only the host can change the tournament"))
}
