//! Participant-side tournament mirror
//!
//! A participant makes no decisions of its own. King, queue order, records,
//! streak and timers all come from host snapshots; the roster only tells it
//! which players exist.

use std::ops::Deref;
use std::sync::RwLock;

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::player::Player;
use crate::protocol::GameStateMessage;
use crate::sync::{lock, read, write};

use super::{queue_without, TournamentCore};

pub struct ParticipantTournament {
    core: TournamentCore,
    /// Every player this side has heard of, for resolving snapshot ids
    known: RwLock<FxHashMap<Uuid, Player>>,
}

impl Deref for ParticipantTournament {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

impl ParticipantTournament {
    pub(crate) fn new(id: u64, roster: &[Player]) -> Self {
        let participant = Self {
            core: TournamentCore::new(id),
            known: RwLock::new(FxHashMap::default()),
        };
        participant.update_player_list(roster);
        participant
    }

    pub fn core(&self) -> &TournamentCore {
        &self.core
    }

    /// Replace the local queue with the roster minus the current king
    pub fn update_player_list(&self, players: &[Player]) {
        {
            let mut queue = lock(&self.core.queue);
            let king = read(&self.core.king);
            self.remember(players);
            *queue = queue_without(players, king.as_ref());
        }
        self.core.notify_changed(None);
    }

    /// Participants never admit players; the host's next snapshot will.
    /// The newcomers are only remembered so that snapshot can resolve them.
    pub fn add_new_players_to_bottom(&self, players: &[Player]) {
        self.remember(players);
    }

    /// Overwrite local state from a host snapshot: records, king, queue,
    /// then timers. Ids this side has never heard of are skipped until a
    /// roster update introduces them.
    pub fn apply_snapshot(&self, message: &GameStateMessage) {
        let crowned = {
            let mut queue = lock(&self.core.queue);
            let mut king = write(&self.core.king);
            let known = read(&self.known);

            *write(&self.core.extras) = message.extras.clone();

            let resolve = |id: &Uuid| -> Option<Player> {
                king.as_ref()
                    .filter(|k| k.id == *id)
                    .or_else(|| queue.iter().find(|p| p.id == *id))
                    .or_else(|| known.get(id))
                    .cloned()
            };

            let new_king = message.king.as_ref().and_then(|id| {
                let resolved = resolve(id);
                if resolved.is_none() {
                    tracing::warn!("Snapshot names unknown king {}", id);
                }
                resolved
            });
            let resolved: Vec<Player> = message
                .players
                .iter()
                .filter_map(|id| {
                    let player = resolve(id);
                    if player.is_none() {
                        tracing::debug!("Skipping unknown queued player {}", id);
                    }
                    player
                })
                .collect();
            let new_queue = queue_without(&resolved, new_king.as_ref());

            let crowned = (*king != new_king).then(|| new_king.clone()).flatten();
            *king = new_king;
            *queue = new_queue;
            crowned
        };

        self.core.set_king_win_streak(message.king_wins);
        self.core.set_remaining_game_time(message.game_timer_remaining);
        self.core.set_remaining_round_time(message.round_timer_remaining);
        self.core.notify_changed(crowned.as_ref());
    }

    /// Ask the host for a fresh snapshot
    pub fn request_game_state(&self) {
        self.core.outgoing.request_game_state();
    }

    fn remember(&self, players: &[Player]) {
        let mut known = write(&self.known);
        for player in players {
            known.insert(player.id, player.clone());
        }
    }
}
