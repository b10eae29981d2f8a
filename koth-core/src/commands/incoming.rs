//! Incoming command handler
//!
//! Decoders are tried in turn: game state, then roster, then the termination
//! sentinel. Anything else is dropped.

use std::sync::Arc;

use crate::protocol::{
    is_termination_message, GameStateMessage, MessageError, MessageType, RosterMessage,
    RosterMessageType,
};
use crate::tournament::Tournament;

/// What a message did to the tournament
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handled {
    /// A participant applied a host snapshot
    GameState,
    /// The host answered a state request
    StateRequested,
    PlayersRegistered,
    PlayerListUpdated,
    Terminated,
    /// Unrecognized, malformed, or not meant for this role
    Ignored,
}

pub struct IncomingCommandHandler {
    tournament: Arc<Tournament>,
}

impl IncomingCommandHandler {
    pub fn new(tournament: Arc<Tournament>) -> Self {
        Self { tournament }
    }

    pub fn tournament(&self) -> &Arc<Tournament> {
        &self.tournament
    }

    /// Handle one raw message from the transport
    pub fn handle_message(&self, data: &str) -> Handled {
        match GameStateMessage::from_xml(data) {
            Ok(message) => return self.apply_game_state(&message),
            Err(e) => {
                if let Some(handled) = dropped(e) {
                    return handled;
                }
            }
        }

        match RosterMessage::from_xml(data) {
            Ok(message) => return self.apply_roster(&message),
            Err(e) => {
                if let Some(handled) = dropped(e) {
                    return handled;
                }
            }
        }

        if is_termination_message(data) {
            self.tournament.end_tournament();
            return Handled::Terminated;
        }

        tracing::debug!("Dropping unrecognized message ({} bytes)", data.len());
        Handled::Ignored
    }

    fn apply_game_state(&self, message: &GameStateMessage) -> Handled {
        match (message.message_type, self.tournament.as_ref()) {
            (MessageType::GameState, Tournament::Participant(participant)) => {
                participant.apply_snapshot(message);
                Handled::GameState
            }
            (MessageType::RequestGameState, Tournament::Host(host)) => {
                tracing::debug!("Game state requested");
                host.send_game_state();
                Handled::StateRequested
            }
            (message_type, _) => {
                tracing::debug!(
                    "Ignoring {} on a {:?} tournament",
                    message_type,
                    self.tournament.role()
                );
                Handled::Ignored
            }
        }
    }

    fn apply_roster(&self, message: &RosterMessage) -> Handled {
        match message.message_type {
            RosterMessageType::PlayerRegister => {
                self.tournament.add_new_players_to_bottom(&message.players);
                Handled::PlayersRegistered
            }
            RosterMessageType::PlayerList => {
                self.tournament.update_player_list(&message.players);
                Handled::PlayerListUpdated
            }
        }
    }
}

/// Wrong-type errors fall through to the next decoder; anything else means
/// the message was for us but unusable.
fn dropped(error: MessageError) -> Option<Handled> {
    if error.is_wrong_message_type() {
        return None;
    }
    tracing::warn!("Dropping message: {}", error);
    Some(Handled::Ignored)
}
