//! In-memory transport hub
//!
//! One host endpoint and any number of participant endpoints inside a single
//! process. Host sends fan out to every participant; participant sends go to
//! the host. Roster changes are announced with roster messages, the way a
//! session transport would.

use std::sync::{Arc, Mutex};

use koth_core::protocol::TERMINATION_MESSAGE;
use koth_core::sync::lock;
use koth_core::{Player, Received, RosterMessage, Transport, TransportError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

#[derive(Default)]
struct Links {
    host: Option<UnboundedSender<String>>,
    participants: Vec<UnboundedSender<String>>,
}

impl Links {
    fn to_host(&self, text: &str) -> Result<(), TransportError> {
        let host = self.host.as_ref().ok_or(TransportError::Closed)?;
        host.send(text.to_string()).map_err(|_| TransportError::Closed)
    }

    /// Departed participants are pruned as their channels are found closed
    fn to_participants(&mut self, text: &str) {
        self.participants.retain(|tx| tx.send(text.to_string()).is_ok());
    }

    fn to_everyone(&mut self, text: &str) {
        if let Err(e) = self.to_host(text) {
            tracing::debug!("Host not reachable: {}", e);
        }
        self.to_participants(text);
    }
}

struct Hub {
    name: String,
    roster: Mutex<Vec<Player>>,
    links: Mutex<Links>,
}

/// Shared handle to an in-process session
#[derive(Clone)]
pub struct LocalHub {
    hub: Arc<Hub>,
}

impl LocalHub {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            hub: Arc::new(Hub {
                name: name.into(),
                roster: Mutex::new(Vec::new()),
                links: Mutex::new(Links::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.hub.name
    }

    pub fn roster(&self) -> Vec<Player> {
        lock(&self.hub.roster).clone()
    }

    /// Open the host endpoint; the host player heads the roster.
    /// Opening it again closes the previous host endpoint.
    pub fn host(&self, player: Player) -> Arc<LocalEndpoint> {
        {
            let mut roster = lock(&self.hub.roster);
            if !roster.contains(&player) {
                roster.insert(0, player);
            }
        }
        let (tx, rx) = unbounded_channel();
        lock(&self.hub.links).host = Some(tx);
        Arc::new(LocalEndpoint::new(self.hub.clone(), false, rx))
    }

    /// Add a player and open a participant endpoint for them. Everyone
    /// already connected is told about the newcomer first.
    pub fn join(&self, player: Player) -> Arc<LocalEndpoint> {
        let is_new = {
            let mut roster = lock(&self.hub.roster);
            let is_new = !roster.contains(&player);
            if is_new {
                roster.push(player.clone());
            }
            is_new
        };

        let mut links = lock(&self.hub.links);
        if is_new {
            tracing::info!("{} joined {}", player.name, self.hub.name);
            if let Some(text) = encode(&RosterMessage::register(vec![player])) {
                links.to_everyone(&text);
            }
        }
        let (tx, rx) = unbounded_channel();
        links.participants.push(tx);
        Arc::new(LocalEndpoint::new(self.hub.clone(), true, rx))
    }

    /// Drop a player from the roster and announce the new list.
    /// Returns false if the player was not in the roster.
    pub fn leave(&self, player_id: Uuid) -> bool {
        let removed = {
            let mut roster = lock(&self.hub.roster);
            let before = roster.len();
            roster.retain(|p| p.id != player_id);
            roster.len() != before
        };
        if removed {
            self.broadcast_roster();
        }
        removed
    }

    /// Send the full roster to every endpoint
    pub fn broadcast_roster(&self) {
        let message = RosterMessage::list(self.roster());
        if let Some(text) = encode(&message) {
            lock(&self.hub.links).to_everyone(&text);
        }
    }

    /// Tell every endpoint the session is over
    pub fn terminate(&self) {
        tracing::info!("Terminating {}", self.hub.name);
        lock(&self.hub.links).to_everyone(TERMINATION_MESSAGE);
    }

    /// Close every channel; pending messages are still delivered, then
    /// receivers see the transport as closed.
    pub fn close(&self) {
        let mut links = lock(&self.hub.links);
        links.host = None;
        links.participants.clear();
    }
}

fn encode(message: &RosterMessage) -> Option<String> {
    match message.to_xml() {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("Failed to encode roster message: {}", e);
            None
        }
    }
}

/// One side of a [`LocalHub`] session
pub struct LocalEndpoint {
    hub: Arc<Hub>,
    client: bool,
    inbox: Mutex<UnboundedReceiver<String>>,
}

impl LocalEndpoint {
    fn new(hub: Arc<Hub>, client: bool, inbox: UnboundedReceiver<String>) -> Self {
        Self {
            hub,
            client,
            inbox: Mutex::new(inbox),
        }
    }

    /// Take a pending message without blocking
    pub fn try_receive(&self) -> Option<String> {
        lock(&self.inbox).try_recv().ok()
    }
}

impl Transport for LocalEndpoint {
    fn send(&self, text: &str) -> Result<(), TransportError> {
        let mut links = lock(&self.hub.links);
        if self.client {
            links.to_host(text)
        } else {
            links.to_participants(text);
            Ok(())
        }
    }

    /// Must not be called from async code; sessions call it from a
    /// blocking task.
    fn receive(&self) -> Result<Received, TransportError> {
        match lock(&self.inbox).blocking_recv() {
            Some(text) => Ok(Received::Message(text)),
            None => Ok(Received::Closed),
        }
    }

    fn is_client(&self) -> bool {
        self.client
    }

    fn player_roster(&self) -> Result<Vec<Player>, TransportError> {
        Ok(lock(&self.hub.roster).clone())
    }

    fn tournament_name(&self) -> String {
        self.hub.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koth_core::RosterMessageType;

    #[test]
    fn test_host_fans_out_to_participants() {
        let hub = LocalHub::new("hill");
        let host = hub.host(Player::random("Host"));
        let a = hub.join(Player::random("A"));
        let b = hub.join(Player::random("B"));
        while host.try_receive().is_some() {}
        while a.try_receive().is_some() {}

        host.send("hello").unwrap();
        assert_eq!(a.try_receive().as_deref(), Some("hello"));
        assert_eq!(b.try_receive().as_deref(), Some("hello"));

        b.send("to host").unwrap();
        assert_eq!(host.try_receive().as_deref(), Some("to host"));
        assert_eq!(a.try_receive(), None);
    }

    #[test]
    fn test_join_announces_newcomer() {
        let hub = LocalHub::new("hill");
        let host = hub.host(Player::random("Host"));
        let newcomer = Player::random("A");
        let endpoint = hub.join(newcomer.clone());

        let text = host.try_receive().unwrap();
        let message = RosterMessage::from_xml(&text).unwrap();
        assert_eq!(message.message_type, RosterMessageType::PlayerRegister);
        assert_eq!(message.players, vec![newcomer]);
        assert_eq!(endpoint.player_roster().unwrap().len(), 2);
        assert!(endpoint.is_client());
        assert!(!host.is_client());
    }

    #[test]
    fn test_leave_broadcasts_list() {
        let hub = LocalHub::new("hill");
        let host_player = Player::random("Host");
        let host = hub.host(host_player.clone());
        let a = Player::random("A");
        hub.join(a.clone());
        host.try_receive();

        assert!(hub.leave(a.id));
        assert!(!hub.leave(a.id));
        let message = RosterMessage::from_xml(&host.try_receive().unwrap()).unwrap();
        assert_eq!(message.message_type, RosterMessageType::PlayerList);
        assert_eq!(message.players, vec![host_player]);
    }

    #[test]
    fn test_close_ends_receive() {
        let hub = LocalHub::new("hill");
        let host = hub.host(Player::random("Host"));
        let a = hub.join(Player::random("A"));
        hub.terminate();
        hub.close();

        assert_eq!(a.receive().unwrap(), Received::Message(TERMINATION_MESSAGE.to_string()));
        assert_eq!(a.receive().unwrap(), Received::Closed);
        assert!(matches!(a.send("late"), Err(TransportError::Closed)));
        host.send("nobody listening").unwrap();
    }
}
