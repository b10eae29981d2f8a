//! Integration tests for koth-server API

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use koth_core::{Mailer, NotifyError, Player, Role, Tournament};
use koth_server::{create_router, ServerConfig, ServerState};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, _subject: &str, _body: &str, to: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

fn players() -> Vec<Player> {
    ["Ann", "Bob", "Cat"].into_iter().map(Player::random).collect()
}

fn host_state(players: &[Player]) -> Arc<ServerState> {
    Arc::new(ServerState::new(Arc::new(Tournament::new(1, Role::Host, players))))
}

fn test_app(state: Arc<ServerState>) -> axum::Router {
    create_router(&ServerConfig::default(), state)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_status_endpoint() {
    let (status, json) = get(test_app(host_state(&players())), "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["role"], "host");
    assert_eq!(json["players"], 3);
}

#[tokio::test]
async fn test_tournament_view() {
    let p = players();
    let (status, json) = get(test_app(host_state(&p)), "/api/tournament").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["king"]["name"], "Ann");
    assert_eq!(json["king"]["position"], "king");
    assert_eq!(json["queue"][1]["name"], "Cat");
    assert_eq!(json["queue"][1]["position"]["queue"], 1);
    assert!(json["game_timer_remaining"].is_null());
}

#[tokio::test]
async fn test_round_results() {
    let state = host_state(&players());

    let (status, json) = post(test_app(state.clone()), "/api/round/king-won", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["moved_to_end"], "Bob");
    assert_eq!(json["king_win_streak"], 1);

    let (_, json) = post(test_app(state.clone()), "/api/round/king-lost", json!({})).await;
    assert_eq!(json["changed"], true);
    assert_eq!(json["king"], "Cat");

    let names: Vec<String> = state.tournament.players().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Bob", "Ann"]);
}

#[tokio::test]
async fn test_move_by_id_and_by_slot() {
    let p = players();
    let state = host_state(&p);

    let (status, _) = post(
        test_app(state.clone()),
        "/api/tournament/move",
        json!({ "player": p[2].id, "to": "king" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.tournament.king(), Some(p[2].clone()));

    let (status, json) = post(
        test_app(state.clone()),
        "/api/tournament/move",
        json!({ "from": { "queue": 0 }, "to": { "queue": 5 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tournament"]["queue"][1]["name"], "Ann");
}

#[tokio::test]
async fn test_move_errors() {
    let state = host_state(&players());

    let (status, json) = post(
        test_app(state.clone()),
        "/api/tournament/move",
        json!({ "player": uuid::Uuid::new_v4(), "to": "king" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Unknown player"));

    let (status, _) = post(test_app(state), "/api/tournament/move", json!({ "to": "king" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_participant_rejects_host_operations() {
    let tournament = Arc::new(Tournament::new(1, Role::Participant, &players()));
    let state = Arc::new(ServerState::new(tournament));

    let (status, json) = post(test_app(state.clone()), "/api/round/king-won", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].is_string());

    let (status, _) = get(test_app(state), "/api/tournament").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_timers_and_restart() {
    let p = players();
    let state = host_state(&p);
    state.tournament.as_host().unwrap().move_challenger_to_end();

    let (_, json) = post(
        test_app(state.clone()),
        "/api/tournament/timers",
        json!({ "game": 600, "round": 0 }),
    )
    .await;
    assert!(json["game_timer_remaining"].as_u64().unwrap() > 590);
    assert!(json["round_timer_remaining"].is_null());

    let (status, json) = post(
        test_app(state.clone()),
        "/api/tournament/restart",
        json!({ "king": p[1].id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tournament"]["king"]["name"], "Bob");
    assert!(json["tournament"]["king"]["wins"].is_null());
    assert_eq!(json["tournament"]["king_win_streak"], 0);
}

#[tokio::test]
async fn test_roster_reconciliation() {
    let p = players();
    let state = host_state(&p);
    let dan = Player::random("Dan");

    let (_, json) = post(
        test_app(state.clone()),
        "/api/roster",
        json!({ "players": [p[1], p[2], dan] }),
    )
    .await;
    assert_eq!(json["tournament"]["king"]["name"], "Bob");
    assert_eq!(json["tournament"]["queue"].as_array().unwrap().len(), 2);

    let (_, json) = post(
        test_app(state.clone()),
        "/api/roster/add",
        json!({ "players": [dan, p[0]] }),
    )
    .await;
    let queue = json["tournament"]["queue"].as_array().unwrap();
    assert_eq!(queue.len(), 3);
    assert_eq!(queue[2]["name"], "Ann");
}

#[tokio::test]
async fn test_standings_and_data() {
    let state = host_state(&players());
    let host = state.tournament.as_host().unwrap();
    host.move_king_to_end();
    host.move_king_to_end();

    let (status, json) = get(test_app(state.clone()), "/api/standings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["name"], "Cat");
    assert_eq!(json[1]["name"], "Bob");
    assert_eq!(json[2]["name"], "Ann");

    let (_, json) = get(test_app(state.clone()), "/api/standings?order=name").await;
    assert_eq!(json[0]["name"], "Ann");

    let response = test_app(state)
        .oneshot(Request::builder().uri("/api/tournament/data").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("Current King: Cat"));
}

#[tokio::test]
async fn test_subscribers_get_updates() {
    let mailer = Arc::new(RecordingMailer::default());
    let tournament = Arc::new(Tournament::new(1, Role::Host, &players()));
    let state = Arc::new(ServerState::new(tournament).with_mailer(mailer.clone()));

    let (_, json) = post(
        test_app(state.clone()),
        "/api/subscribers",
        json!({ "subscribers": ["a@hill.test"], "possible_subscribers": ["a@hill.test", "b@hill.test"] }),
    )
    .await;
    assert_eq!(json["added"], json!(["a@hill.test"]));
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);

    post(test_app(state.clone()), "/api/round/king-won", json!({})).await;
    assert_eq!(mailer.sent.lock().unwrap().len(), 2);

    let (_, json) = get(test_app(state.clone()), "/api/subscribers").await;
    assert_eq!(json["possible_subscribers"].as_array().unwrap().len(), 2);

    let (_, json) = post(test_app(state), "/api/subscribers/notify", json!({})).await;
    assert_eq!(json["delivered"], 1);
}
