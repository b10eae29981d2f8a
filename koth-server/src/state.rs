//! Server state management
//!
//! The tournament under control plus its subscriber list.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use koth_core::sync::{read, write};
use koth_core::{Mailer, NotifyError, Player, SubscriptionList, Tournament};
use uuid::Uuid;

/// Mailer that writes messages to the log instead of delivering them
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), NotifyError> {
        tracing::info!("Mail to {} [{}]:\n{}", to, subject, body);
        Ok(())
    }
}

/// Server-wide shared state
pub struct ServerState {
    pub tournament: Arc<Tournament>,
    pub subscriptions: RwLock<SubscriptionList>,
    pub mailer: Arc<dyn Mailer>,
}

impl ServerState {
    pub fn new(tournament: Arc<Tournament>) -> Self {
        Self {
            tournament,
            subscriptions: RwLock::new(SubscriptionList::new()),
            mailer: Arc::new(LogMailer),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Look a player up among the king and the queue
    pub fn find_player(&self, id: Uuid) -> Option<Player> {
        self.tournament
            .king()
            .into_iter()
            .chain(self.tournament.players())
            .find(|p| p.id == id)
    }

    /// King first, then the queue in order
    pub fn everyone(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.tournament.king().into_iter().collect();
        players.extend(self.tournament.players());
        players
    }

    pub fn subscriptions(&self) -> RwLockReadGuard<'_, SubscriptionList> {
        read(&self.subscriptions)
    }

    pub fn subscriptions_mut(&self) -> RwLockWriteGuard<'_, SubscriptionList> {
        write(&self.subscriptions)
    }

    /// Send the current standings text to every subscriber
    pub fn notify_subscribers(&self) -> usize {
        self.subscriptions()
            .send_out_notifications(self.mailer.as_ref(), &self.tournament)
    }
}
