//! Session lifecycle
//!
//! ## Architecture
//!
//! - Level 1: Session::start() - orchestration
//! - Level 2: open_tournament(), handshake(), spawn_receiver()
//! - Level 3: run_receive_loop() - blocking dispatch of transport messages

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use koth_core::sync::lock;
use koth_core::{
    Handled, IncomingCommandHandler, Received, Role, Tournament, TournamentRegistry, Transport,
    TransportError,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;

/// Registry shared by every session on one device
pub type SharedRegistry = Arc<Mutex<TournamentRegistry>>;

/// Pause before receiving again after a transport error
const RECEIVE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Why a receive loop stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    /// The transport closed underneath the loop
    Closed,
    /// The session sent the termination message
    Terminated,
}

/// A tournament attached to a running transport
pub struct Session {
    tournament: Arc<Tournament>,
    transport: Arc<dyn Transport>,
    receiver: JoinHandle<LoopExit>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

impl Session {
    /// Start a session over `transport`.
    ///
    /// 1. Pick the role from the transport and fetch the instance
    /// 2. Attach the transport for outgoing messages
    /// 3. Join handshake: the host applies its timers and broadcasts,
    ///    a participant asks for the current state
    /// 4. Spawn the receive loop on a blocking task
    ///
    /// Must be called inside a tokio runtime. Dropping the session does not
    /// stop the loop; it ends when the transport closes or terminates.
    pub fn start(
        registry: SharedRegistry,
        transport: Arc<dyn Transport>,
        config: &SessionConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().context("sessions must start inside a tokio runtime")?;

        let tournament = open_tournament(&registry, transport.as_ref(), config)?;
        tournament.outgoing().attach(transport.clone());
        handshake(&tournament, config);

        let receiver = spawn_receiver(&runtime, registry, transport.clone(), tournament.clone());

        Ok(Self {
            tournament,
            transport,
            receiver,
        })
    }

    pub fn tournament(&self) -> &Arc<Tournament> {
        &self.tournament
    }

    pub fn role(&self) -> Role {
        self.tournament.role()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn is_finished(&self) -> bool {
        self.receiver.is_finished()
    }

    /// Wait for the receive loop to stop
    pub async fn wait(self) -> Result<LoopExit> {
        self.receiver.await.context("receive loop panicked")
    }
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn open_tournament(
    registry: &SharedRegistry,
    transport: &dyn Transport,
    config: &SessionConfig,
) -> Result<Arc<Tournament>> {
    let role = if transport.is_client() {
        Role::Participant
    } else {
        Role::Host
    };
    let roster = transport
        .player_roster()
        .context("failed to fetch the player roster")?;

    let tournament = lock(registry).get_or_create(config.tournament_id, role, &roster);
    if tournament.role() != role {
        anyhow::bail!(
            "tournament {} already runs here as {:?}",
            config.tournament_id,
            tournament.role()
        );
    }
    if config.local_player.is_some() {
        tournament.set_local_player(config.local_player);
    }

    tracing::info!(
        "Joined '{}' (tournament {}) as {:?} with {} players",
        transport.tournament_name(),
        config.tournament_id,
        role,
        roster.len()
    );
    Ok(tournament)
}

fn handshake(tournament: &Tournament, config: &SessionConfig) {
    match tournament {
        Tournament::Host(host) => {
            host.set_game_timer_setting(config.game_timer_secs);
            host.set_round_timer_setting(config.round_timer_secs);
        }
        Tournament::Participant(participant) => {
            if config.request_state_on_join {
                participant.request_game_state();
            }
        }
    }
}

fn spawn_receiver(
    runtime: &Handle,
    registry: SharedRegistry,
    transport: Arc<dyn Transport>,
    tournament: Arc<Tournament>,
) -> JoinHandle<LoopExit> {
    runtime.spawn_blocking(move || {
        let id = tournament.id();
        let handler = IncomingCommandHandler::new(tournament);
        let exit = run_receive_loop(transport.as_ref(), &handler);

        handler.tournament().outgoing().detach();
        if exit == LoopExit::Terminated {
            lock(&registry).remove(id);
            tracing::info!("Tournament {} removed from registry", id);
        }
        exit
    })
}

// ============================================================================
// LEVEL 3 - RECEIVE LOOP
// ============================================================================

/// Feed every message from `transport` to `handler` until the transport
/// closes or the session is terminated. Blocks the calling thread.
pub fn run_receive_loop(transport: &dyn Transport, handler: &IncomingCommandHandler) -> LoopExit {
    let id = handler.tournament().id();
    tracing::info!("Receive loop started for tournament {}", id);

    let exit = loop {
        match transport.receive() {
            Ok(Received::Message(text)) => {
                tracing::debug!("Received message ({} bytes)", text.len());
                if handler.handle_message(&text) == Handled::Terminated {
                    break LoopExit::Terminated;
                }
            }
            Ok(Received::Closed) | Err(TransportError::Closed) => break LoopExit::Closed,
            Err(e) => {
                tracing::warn!("Receive failed: {}", e);
                std::thread::sleep(RECEIVE_RETRY_DELAY);
            }
        }
    };

    tracing::info!("Receive loop for tournament {} stopped: {:?}", id, exit);
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use koth_core::protocol::TERMINATION_MESSAGE;
    use koth_core::Player;
    use std::collections::VecDeque;

    /// Replays scripted receive results, then reports closed
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<Received, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<Received, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }

        fn receive(&self) -> Result<Received, TransportError> {
            lock(&self.script).pop_front().unwrap_or(Ok(Received::Closed))
        }

        fn is_client(&self) -> bool {
            true
        }

        fn player_roster(&self) -> Result<Vec<Player>, TransportError> {
            Ok(Vec::new())
        }

        fn tournament_name(&self) -> String {
            "scripted".to_string()
        }
    }

    fn handler() -> IncomingCommandHandler {
        IncomingCommandHandler::new(Arc::new(Tournament::new(3, Role::Participant, &[])))
    }

    #[test]
    fn test_loop_stops_on_close() {
        let transport = ScriptedTransport::new(vec![
            Ok(Received::Message("noise".into())),
            Ok(Received::Closed),
            Ok(Received::Message(TERMINATION_MESSAGE.into())),
        ]);
        assert_eq!(run_receive_loop(&transport, &handler()), LoopExit::Closed);
    }

    #[test]
    fn test_loop_survives_receive_errors() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Receive("glitch".into())),
            Ok(Received::Message(TERMINATION_MESSAGE.into())),
        ]);
        assert_eq!(run_receive_loop(&transport, &handler()), LoopExit::Terminated);
    }

    #[test]
    fn test_closed_error_ends_loop() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Closed)]);
        assert_eq!(run_receive_loop(&transport, &handler()), LoopExit::Closed);
    }

    #[test]
    fn test_start_requires_runtime() {
        let registry: SharedRegistry = Arc::new(Mutex::new(TournamentRegistry::new()));
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::new(Vec::new()));
        let result = Session::start(registry, transport, &SessionConfig::default());
        assert!(result.is_err());
    }
}
