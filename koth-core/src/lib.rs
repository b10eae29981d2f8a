//! KOTH Core - King of the Hill tournament state and sync protocol
//!
//! This crate provides the host-authoritative tournament logic:
//! - Player identity and per-player win/loss records
//! - Tournament state (host policy, participant mirror)
//! - XML wire codec for game-state snapshots and roster updates
//! - Incoming/outgoing command handlers
//! - Tournament registry keyed by tournament id

pub mod player;
pub mod timer;
pub mod tournament;
pub mod protocol;
pub mod transport;
pub mod commands;
pub mod registry;
pub mod notify;

pub mod sync;

// Re-exports for convenient access
pub use player::{Player, PlayerExtra};
pub use timer::Timer;
pub use tournament::{
    HostTournament, ParticipantTournament, Position, Role, Standing, StandingsOrder, Tournament,
    TournamentCore, TournamentObserver, TournamentView,
};
pub use protocol::{GameStateMessage, MessageError, MessageType, RosterMessage, RosterMessageType};
pub use transport::{Received, Transport, TransportError};
pub use commands::{Handled, IncomingCommandHandler, OutgoingCommandHandler};
pub use registry::TournamentRegistry;
pub use notify::{Mailer, NotifyError, SubscriptionList};
