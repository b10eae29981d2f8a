//! Command handlers
//!
//! Incoming decodes what the transport delivers and applies it to a
//! tournament; outgoing serializes state and requests for the transport.

mod incoming;
mod outgoing;

pub use incoming::{Handled, IncomingCommandHandler};
pub use outgoing::OutgoingCommandHandler;
