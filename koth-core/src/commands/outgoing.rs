//! Outgoing command handler
//!
//! Sends are fire-and-forget. A dropped snapshot is repaired by the next one,
//! since the host broadcasts after every mutation.

use std::sync::{Arc, RwLock};

use crate::protocol::GameStateMessage;
use crate::sync::{read, write};
use crate::tournament::TournamentCore;
use crate::transport::Transport;

#[derive(Default)]
pub struct OutgoingCommandHandler {
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl OutgoingCommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route future messages through `transport`
    pub fn attach(&self, transport: Arc<dyn Transport>) {
        *write(&self.transport) = Some(transport);
    }

    pub fn detach(&self) {
        *write(&self.transport) = None;
    }

    pub fn is_attached(&self) -> bool {
        read(&self.transport).is_some()
    }

    /// Send the tournament's current snapshot
    pub fn send_game_state(&self, tournament: &TournamentCore) {
        self.dispatch(&tournament.snapshot_message());
    }

    /// Ask the host for its current snapshot
    pub fn request_game_state(&self) {
        tracing::debug!("Requesting game state");
        self.dispatch(&GameStateMessage::request());
    }

    fn dispatch(&self, message: &GameStateMessage) {
        let Some(transport) = read(&self.transport).clone() else {
            tracing::debug!("No transport attached; {} not sent", message.message_type);
            return;
        };

        let xml = match message.to_xml() {
            Ok(xml) => xml,
            Err(e) => {
                tracing::warn!("Failed to encode {}: {}", message.message_type, e);
                return;
            }
        };

        if let Err(e) = transport.send(&xml) {
            tracing::warn!("Failed to send {}: {}", message.message_type, e);
        }
    }
}
