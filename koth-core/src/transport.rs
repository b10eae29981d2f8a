//! Session transport contract
//!
//! The transport delivers opaque message strings between the host and the
//! participants and answers roster queries. Delivery is best-effort.

use crate::player::Player;

/// Result of a blocking receive
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Received {
    Message(String),
    /// The session socket has closed; no further messages will arrive
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Receive(String),
    #[error("roster query failed: {0}")]
    Roster(String),
}

pub trait Transport: Send + Sync {
    /// Send a message to the other side (host: all participants)
    fn send(&self, text: &str) -> Result<(), TransportError>;

    /// Block until a message arrives or the transport closes
    fn receive(&self) -> Result<Received, TransportError>;

    /// True on a participant, false on the host
    fn is_client(&self) -> bool;

    /// Authoritative roster snapshot, in join order
    fn player_roster(&self) -> Result<Vec<Player>, TransportError>;

    fn tournament_name(&self) -> String;
}
