//! Tournament state
//!
//! [`TournamentCore`] holds the fields both roles share. [`HostTournament`]
//! owns every mutation policy and broadcasts after each change;
//! [`ParticipantTournament`] only mirrors snapshots it receives.
//!
//! ## Locking
//!
//! Each field sits behind its own lock. Operations that touch several fields
//! always acquire them in the order queue, king, known players, extras,
//! timers, and release everything before notifying observers or sending.

mod host;
mod participant;
mod view;

use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::OutgoingCommandHandler;
use crate::player::{Player, PlayerExtra};
use crate::protocol::GameStateMessage;
use crate::sync::{lock, read, write};
use crate::timer::Timer;

pub use host::HostTournament;
pub use participant::ParticipantTournament;
pub use view::{PlayerView, Standing, StandingsOrder, TournamentView};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which side of the session this instance runs on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Participant,
}

/// A slot in the tournament: the king, or a 0-based queue index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    King,
    Queue(usize),
}

/// Callbacks for presentation layers
pub trait TournamentObserver: Send + Sync {
    fn state_changed(&self, _tournament_id: u64) {}
    fn king_changed(&self, _tournament_id: u64, _king: &Player) {}
    fn tournament_ended(&self, _tournament_id: u64) {}
}

// ============================================================================
// SHARED STATE
// ============================================================================

pub struct TournamentCore {
    id: u64,
    /// Challengers in order; never contains the king
    queue: Mutex<Vec<Player>>,
    king: RwLock<Option<Player>>,
    extras: RwLock<FxHashMap<Uuid, PlayerExtra>>,
    game_timer: RwLock<Timer>,
    round_timer: RwLock<Timer>,
    king_win_streak: AtomicU32,
    local_player: RwLock<Option<Uuid>>,
    observers: RwLock<Vec<Arc<dyn TournamentObserver>>>,
    outgoing: OutgoingCommandHandler,
}

impl TournamentCore {
    fn new(id: u64) -> Self {
        Self {
            id,
            queue: Mutex::new(Vec::new()),
            king: RwLock::new(None),
            extras: RwLock::new(FxHashMap::default()),
            game_timer: RwLock::new(Timer::unset()),
            round_timer: RwLock::new(Timer::unset()),
            king_win_streak: AtomicU32::new(0),
            local_player: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
            outgoing: OutgoingCommandHandler::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn king(&self) -> Option<Player> {
        read(&self.king).clone()
    }

    /// Copy of the queue, challenger first
    pub fn players(&self) -> Vec<Player> {
        lock(&self.queue).clone()
    }

    pub fn queue_len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// The player at queue position 0
    pub fn challenger(&self) -> Option<Player> {
        lock(&self.queue).first().cloned()
    }

    /// Where a player currently sits, if anywhere
    pub fn position_of(&self, player: &Player) -> Option<Position> {
        let queue = lock(&self.queue);
        if read(&self.king).as_ref() == Some(player) {
            return Some(Position::King);
        }
        queue.iter().position(|p| p == player).map(Position::Queue)
    }

    /// Record for a player, created unset on first request
    pub fn player_extra(&self, player: &Player) -> PlayerExtra {
        *write(&self.extras)
            .entry(player.id)
            .or_insert_with(|| PlayerExtra::new(player.id))
    }

    pub fn player_extras(&self) -> FxHashMap<Uuid, PlayerExtra> {
        read(&self.extras).clone()
    }

    /// Consecutive round wins of the current king this reign
    pub fn king_win_streak(&self) -> u32 {
        self.king_win_streak.load(Ordering::SeqCst)
    }

    // ========================================================================
    // TIMERS
    // ========================================================================

    pub fn game_timer_setting(&self) -> Option<u32> {
        read(&self.game_timer).setting()
    }

    pub fn round_timer_setting(&self) -> Option<u32> {
        read(&self.round_timer).setting()
    }

    pub fn elapsed_game_time(&self) -> u64 {
        read(&self.game_timer).elapsed_secs()
    }

    pub fn elapsed_round_time(&self) -> u64 {
        read(&self.round_timer).elapsed_secs()
    }

    /// Seconds left in the game; `None` when the timer is not set
    pub fn remaining_game_time(&self) -> Option<u32> {
        read(&self.game_timer).remaining()
    }

    /// Seconds left in the round; `None` when the timer is not set
    pub fn remaining_round_time(&self) -> Option<u32> {
        read(&self.round_timer).remaining()
    }

    pub fn start_game(&self) {
        write(&self.game_timer).restart();
    }

    pub fn start_round(&self) {
        write(&self.round_timer).restart();
    }

    pub fn set_remaining_game_time(&self, remaining: Option<u32>) {
        write(&self.game_timer).set_remaining(remaining);
    }

    pub fn set_remaining_round_time(&self, remaining: Option<u32>) {
        write(&self.round_timer).set_remaining(remaining);
    }

    // ========================================================================
    // SESSION PLUMBING
    // ========================================================================

    pub fn set_local_player(&self, player: Option<Uuid>) {
        *write(&self.local_player) = player;
    }

    pub fn local_player(&self) -> Option<Uuid> {
        *read(&self.local_player)
    }

    pub fn add_observer(&self, observer: Arc<dyn TournamentObserver>) {
        write(&self.observers).push(observer);
    }

    pub fn outgoing(&self) -> &OutgoingCommandHandler {
        &self.outgoing
    }

    /// Build a snapshot of the current state for the wire
    pub fn snapshot_message(&self) -> GameStateMessage {
        let queue = lock(&self.queue);
        let king = read(&self.king);
        let extras = read(&self.extras);

        GameStateMessage::snapshot(
            king.as_ref().map(|k| k.id),
            self.king_win_streak(),
            queue.iter().map(|p| p.id).collect(),
            &extras,
            self.remaining_game_time(),
            self.remaining_round_time(),
        )
    }

    /// Tell observers the tournament is over
    pub fn end_tournament(&self) {
        tracing::info!("Tournament {} ended", self.id);
        for observer in self.observer_list() {
            observer.tournament_ended(self.id);
        }
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    fn observer_list(&self) -> Vec<Arc<dyn TournamentObserver>> {
        read(&self.observers).clone()
    }

    pub(crate) fn notify_changed(&self, new_king: Option<&Player>) {
        for observer in self.observer_list() {
            observer.state_changed(self.id);
            if let Some(king) = new_king {
                observer.king_changed(self.id, king);
            }
        }
    }

    pub(crate) fn record_result(&self, winner: &Player, loser: &Player) {
        let mut extras = write(&self.extras);
        extras
            .entry(winner.id)
            .or_insert_with(|| PlayerExtra::new(winner.id))
            .add_win();
        extras
            .entry(loser.id)
            .or_insert_with(|| PlayerExtra::new(loser.id))
            .add_loss();
    }

    pub(crate) fn set_king_win_streak(&self, streak: u32) {
        self.king_win_streak.store(streak, Ordering::SeqCst);
    }

    pub(crate) fn increment_king_win_streak(&self) {
        self.king_win_streak.fetch_add(1, Ordering::SeqCst);
    }
}

/// Drop duplicates and the king, keeping first occurrences in order
fn queue_without(players: &[Player], king: Option<&Player>) -> Vec<Player> {
    let mut queue: Vec<Player> = Vec::with_capacity(players.len());
    for player in players {
        if Some(player) != king && !queue.contains(player) {
            queue.push(player.clone());
        }
    }
    queue
}

// ============================================================================
// ROLE DISPATCH
// ============================================================================

/// A tournament instance of either role
pub enum Tournament {
    Host(HostTournament),
    Participant(ParticipantTournament),
}

impl Tournament {
    /// Host: the first roster entry is crowned. Participant: the roster
    /// becomes the local mirror until the first snapshot arrives.
    pub fn new(id: u64, role: Role, roster: &[Player]) -> Self {
        match role {
            Role::Host => {
                let king = roster.first().cloned();
                let rest = roster.get(1..).unwrap_or_default();
                Tournament::Host(HostTournament::new(id, king, rest))
            }
            Role::Participant => Tournament::Participant(ParticipantTournament::new(id, roster)),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Tournament::Host(_) => Role::Host,
            Tournament::Participant(_) => Role::Participant,
        }
    }

    pub fn core(&self) -> &TournamentCore {
        match self {
            Tournament::Host(host) => host.core(),
            Tournament::Participant(participant) => participant.core(),
        }
    }

    pub fn as_host(&self) -> Option<&HostTournament> {
        match self {
            Tournament::Host(host) => Some(host),
            Tournament::Participant(_) => None,
        }
    }

    pub fn as_participant(&self) -> Option<&ParticipantTournament> {
        match self {
            Tournament::Host(_) => None,
            Tournament::Participant(participant) => Some(participant),
        }
    }

    /// Reconcile against the authoritative roster
    pub fn update_player_list(&self, players: &[Player]) {
        match self {
            Tournament::Host(host) => host.update_player_list(players),
            Tournament::Participant(participant) => participant.update_player_list(players),
        }
    }

    /// Admit newcomers (host only; participants wait for a snapshot)
    pub fn add_new_players_to_bottom(&self, players: &[Player]) {
        match self {
            Tournament::Host(host) => host.add_new_players_to_bottom(players),
            Tournament::Participant(participant) => participant.add_new_players_to_bottom(players),
        }
    }
}

impl Deref for Tournament {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        self.core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: usize) -> Vec<Player> {
        (1..=n).map(|i| Player::random(format!("Player {}", i))).collect()
    }

    #[test]
    fn test_host_crowns_first_roster_entry() {
        let players = roster(3);
        let tournament = Tournament::new(1, Role::Host, &players);
        assert_eq!(tournament.role(), Role::Host);
        assert_eq!(tournament.king(), Some(players[0].clone()));
        assert_eq!(tournament.players(), players[1..].to_vec());
    }

    #[test]
    fn test_participant_mirrors_roster_without_king() {
        let players = roster(3);
        let tournament = Tournament::new(1, Role::Participant, &players);
        assert_eq!(tournament.role(), Role::Participant);
        assert_eq!(tournament.king(), None);
        assert_eq!(tournament.players(), players);
    }

    #[test]
    fn test_player_extra_created_lazily() {
        let players = roster(2);
        let tournament = Tournament::new(1, Role::Host, &players);
        assert!(tournament.player_extras().is_empty());
        let extra = tournament.player_extra(&players[1]);
        assert_eq!(extra.player_id, players[1].id);
        assert_eq!(extra.wins(), None);
        assert_eq!(tournament.player_extras().len(), 1);
    }

    #[test]
    fn test_position_of() {
        let players = roster(3);
        let tournament = Tournament::new(1, Role::Host, &players);
        assert_eq!(tournament.position_of(&players[0]), Some(Position::King));
        assert_eq!(tournament.position_of(&players[2]), Some(Position::Queue(1)));
        assert_eq!(tournament.position_of(&Player::random("stranger")), None);
    }

    #[test]
    fn test_queue_without_drops_duplicates_and_king() {
        let players = roster(3);
        let input = vec![
            players[1].clone(),
            players[0].clone(),
            players[1].clone(),
            players[2].clone(),
        ];
        let queue = queue_without(&input, Some(&players[0]));
        assert_eq!(queue, vec![players[1].clone(), players[2].clone()]);
    }
}
