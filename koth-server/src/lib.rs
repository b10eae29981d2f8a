//! KOTH Server - HTTP control surface for a host tournament
//!
//! This crate provides the web backend:
//! - REST API for queue moves, round results, timers and restarts
//! - Roster reconciliation and standings
//! - Subscriber management and status notifications
//! - Static file serving for a dashboard

mod routes;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub use state::{LogMailer, ServerState};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8003,
            static_dir: "koth/dashboard".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<String>) -> Self {
        self.static_dir = static_dir.into();
        self
    }
}

/// Create the router with all routes
pub fn create_router(config: &ServerConfig, state: Arc<ServerState>) -> Router {
    let static_service = ServeDir::new(&config.static_dir);

    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Tournament state
        .route("/api/tournament", get(routes::tournament::get_tournament))
        .route("/api/tournament/data", get(routes::tournament::get_tournament_data))
        .route("/api/tournament/move", post(routes::tournament::move_player))
        .route("/api/tournament/timers", post(routes::tournament::set_timers))
        .route("/api/tournament/restart", post(routes::tournament::restart))
        // Round results
        .route("/api/round/king-won", post(routes::rounds::king_won))
        .route("/api/round/king-lost", post(routes::rounds::king_lost))
        // Roster
        .route("/api/roster", post(routes::roster::update_roster))
        .route("/api/roster/add", post(routes::roster::add_players))
        .route("/api/standings", get(routes::roster::get_standings))
        // Subscribers
        .route(
            "/api/subscribers",
            get(routes::subscribers::get_subscribers).post(routes::subscribers::set_subscribers),
        )
        .route("/api/subscribers/notify", post(routes::subscribers::notify_all))
        // Shared state
        .with_state(state)
        .layer(CorsLayer::permissive())
        // Static file serving (must be last)
        .fallback_service(static_service)
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig, state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let tournament_id = state.tournament.id();
    let router = create_router(&config, state);

    tracing::info!("KOTH Server starting on http://0.0.0.0:{}", config.port);
    tracing::info!("Tournament {} under control; static files from: {}", tournament_id, config.static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
