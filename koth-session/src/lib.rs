//! KOTH Session - wiring a tournament to a live transport
//!
//! This crate provides:
//! - Session startup: role selection, registry lookup, join handshake
//! - The blocking receive loop, run on a tokio blocking task
//! - An in-memory hub transport for local play and tests

mod config;
mod local;
mod session;

pub use config::SessionConfig;
pub use local::{LocalEndpoint, LocalHub};
pub use session::{run_receive_loop, LoopExit, Session, SharedRegistry};
