//! Example to run the KOTH server standalone over an in-process hub
//!
//! Run with: cargo run -p koth-server --example run_server

use std::sync::{Arc, Mutex};

use koth_core::{Player, TournamentRegistry};
use koth_server::{run_server, ServerConfig, ServerState};
use koth_session::{LocalHub, Session, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let hub = LocalHub::new("Example Hill");
    let registry = Arc::new(Mutex::new(TournamentRegistry::new()));
    let host = hub.host(Player::random("Alice"));
    for name in ["Bob", "Carol", "Dave"] {
        hub.join(Player::random(name));
    }

    let session = Session::start(registry, host, &SessionConfig::new(1).with_round_timer(120))?;
    let state = Arc::new(ServerState::new(session.tournament().clone()));
    let config = ServerConfig::default();

    println!("Starting KOTH server on port {}", config.port);
    println!("Open http://localhost:{}/api/tournament", config.port);

    run_server(config, state).await
}
