//! Subscriber management
//!
//! Newly added subscribers get the current status right away.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::ServerState;

pub async fn get_subscribers(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let subscriptions = state.subscriptions();
    Json(json!({
        "subscribers": subscriptions.subscribers(),
        "possible_subscribers": subscriptions.possible_subscribers()
    }))
}

#[derive(Deserialize)]
pub struct SubscribersRequest {
    pub subscribers: Vec<String>,
    pub possible_subscribers: Option<Vec<String>>,
}

pub async fn set_subscribers(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<SubscribersRequest>,
) -> Json<Value> {
    let mut subscriptions = state.subscriptions_mut();

    let added = subscriptions.set_subscribers(req.subscribers);
    if let Some(possible) = req.possible_subscribers {
        subscriptions.set_possible_subscribers(possible);
    }
    for address in &added {
        subscriptions.update_subscriber(state.mailer.as_ref(), &state.tournament, address);
    }

    Json(json!({
        "success": true,
        "added": added
    }))
}

/// Send the current status to every subscriber
pub async fn notify_all(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let delivered = state.notify_subscribers();
    Json(json!({
        "success": true,
        "delivered": delivered
    }))
}
