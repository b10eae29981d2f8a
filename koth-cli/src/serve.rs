//! Serve command - host a tournament behind the HTTP API
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure_server(), start_session(), start_server()
//! - Level 3: (delegated to koth-session and koth-server)
//! - Level 4: configuration validation

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Args;

use koth_core::{Player, TournamentRegistry};
use koth_server::{run_server, ServerConfig, ServerState};
use koth_session::{LocalHub, Session, SessionConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ServeArgs {
    /// Port number to listen on
    #[arg(long, default_value = "8003")]
    pub port: u16,

    /// Directory containing static files for the dashboard
    #[arg(long, default_value = "koth/dashboard")]
    pub static_dir: PathBuf,

    /// Tournament name shown to participants
    #[arg(long, default_value = "King of the Hill")]
    pub name: String,

    /// Player names in join order; the first is crowned
    #[arg(long = "player", required = true)]
    pub players: Vec<String>,

    /// Game timer in seconds (0 = off)
    #[arg(long, default_value = "0")]
    pub game_timer: i32,

    /// Round timer in seconds (0 = off)
    #[arg(long, default_value = "0")]
    pub round_timer: i32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run serve command
///
/// 1. Configure server
/// 2. Open the hub and start the host session
/// 3. Serve the API (blocking)
pub fn run(args: ServeArgs) -> Result<()> {
    let config = configure_server(&args)?;
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let (_hub, session) = start_session(&args)?;
        let state = Arc::new(ServerState::new(session.tournament().clone()));

        tracing::info!("Hosting '{}' on port {}", args.name, config.port);
        run_server(config, state).await
    })
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Configure server from command arguments
fn configure_server(args: &ServeArgs) -> Result<ServerConfig> {
    validate_static_dir(&args.static_dir)?;

    Ok(ServerConfig::default()
        .with_port(args.port)
        .with_static_dir(args.static_dir.to_string_lossy()))
}

/// Host session over a local hub holding the requested players
fn start_session(args: &ServeArgs) -> Result<(LocalHub, Session)> {
    let mut players = args.players.iter().map(Player::random);
    let Some(host_player) = players.next() else {
        anyhow::bail!("At least one player is required");
    };

    let hub = LocalHub::new(&args.name);
    let host = hub.host(host_player);
    for player in players {
        hub.join(player);
    }

    let config = SessionConfig::new(1)
        .with_game_timer(args.game_timer)
        .with_round_timer(args.round_timer);
    let registry = Arc::new(Mutex::new(TournamentRegistry::new()));
    let session = Session::start(registry, host, &config)?;

    Ok((hub, session))
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Validate that static directory exists
fn validate_static_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::warn!(
            "Static directory does not exist: {}. Server will start but may not serve files.",
            path.display()
        );
    } else if !path.is_dir() {
        anyhow::bail!(
            "Static path exists but is not a directory: {}",
            path.display()
        );
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(players: &[&str]) -> ServeArgs {
        ServeArgs {
            port: 8003,
            static_dir: PathBuf::from("test_static"),
            name: "Test Hill".to_string(),
            players: players.iter().map(|p| p.to_string()).collect(),
            game_timer: 0,
            round_timer: 45,
        }
    }

    #[test]
    fn test_configure_server() {
        let config = configure_server(&args(&["Ann"])).unwrap();
        assert_eq!(config.port, 8003);
        assert_eq!(config.static_dir, "test_static");
    }

    #[test]
    fn test_validate_static_dir_nonexistent() {
        // Should not error, just warn
        assert!(validate_static_dir(Path::new("/nonexistent/path")).is_ok());
    }

    #[tokio::test]
    async fn test_start_session_crowns_first_player() {
        let (hub, session) = start_session(&args(&["Ann", "Bob", "Cat"])).unwrap();
        let tournament = session.tournament();

        assert_eq!(tournament.king().map(|p| p.name), Some("Ann".to_string()));
        assert_eq!(hub.roster().len(), 3);
        assert_eq!(tournament.round_timer_setting(), Some(45));
        hub.close();
    }

    #[tokio::test]
    async fn test_start_session_needs_players() {
        assert!(start_session(&args(&[])).is_err());
    }
}
