//! Subscriber notifications
//!
//! Subscribers receive the tournament text dump whenever something
//! matchup-related changes. Delivery goes through a [`Mailer`]; failures are
//! logged and never reach the caller.

use crate::tournament::TournamentCore;

pub const NOTIFICATION_SUBJECT: &str = "Tournament Status";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("address {address} rejected: {reason}")]
    Rejected { address: String, reason: String },
    #[error("mail service unavailable: {0}")]
    Unavailable(String),
}

/// Delivers one message to one address
pub trait Mailer: Send + Sync {
    fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), NotifyError>;
}

/// Active and candidate subscribers of one tournament
#[derive(Clone, Debug, Default)]
pub struct SubscriptionList {
    subscribers: Vec<String>,
    possible_subscribers: Vec<String>,
}

impl SubscriptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribers(&self) -> &[String] {
        &self.subscribers
    }

    pub fn possible_subscribers(&self) -> &[String] {
        &self.possible_subscribers
    }

    /// Replace the active list. Returns the addresses that were not
    /// subscribed before; they should get an immediate update.
    pub fn set_subscribers(&mut self, subscribers: Vec<String>) -> Vec<String> {
        let added = subscribers
            .iter()
            .filter(|address| !self.subscribers.contains(*address))
            .cloned()
            .collect();
        self.subscribers = subscribers;
        added
    }

    pub fn set_possible_subscribers(&mut self, subscribers: Vec<String>) {
        self.possible_subscribers = subscribers;
    }

    /// Send the current state to one address
    pub fn update_subscriber(&self, mailer: &dyn Mailer, tournament: &TournamentCore, address: &str) {
        deliver(mailer, &tournament.tournament_data(), address);
    }

    /// Send the current state to every active subscriber.
    /// Returns how many deliveries succeeded.
    pub fn send_out_notifications(&self, mailer: &dyn Mailer, tournament: &TournamentCore) -> usize {
        let body = tournament.tournament_data();
        self.subscribers
            .iter()
            .filter(|address| deliver(mailer, &body, address))
            .count()
    }
}

fn deliver(mailer: &dyn Mailer, body: &str, address: &str) -> bool {
    match mailer.send(NOTIFICATION_SUBJECT, body, address) {
        Ok(()) => {
            tracing::debug!("Sent tournament status to {}", address);
            true
        }
        Err(e) => {
            tracing::warn!("Failed to notify {}: {}", address, e);
            false
        }
    }
}
