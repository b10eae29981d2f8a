//! Host-side tournament logic
//!
//! Every public mutation ends by notifying observers and broadcasting a full
//! snapshot, so participants converge on the host's latest state.

use std::ops::Deref;

use crate::player::Player;
use crate::sync::{lock, write};

use super::{queue_without, Position, TournamentCore};

pub struct HostTournament {
    core: TournamentCore,
}

impl Deref for HostTournament {
    type Target = TournamentCore;

    fn deref(&self) -> &TournamentCore {
        &self.core
    }
}

impl HostTournament {
    /// Crown `king` and queue the rest; the king is dropped from `players`
    pub(crate) fn new(id: u64, king: Option<Player>, players: &[Player]) -> Self {
        let core = TournamentCore::new(id);
        *lock(&core.queue) = queue_without(players, king.as_ref());
        *write(&core.king) = king;
        Self { core }
    }

    pub fn core(&self) -> &TournamentCore {
        &self.core
    }

    // ========================================================================
    // QUEUE MOVES
    // ========================================================================

    /// Move a player (the king included) to another slot.
    ///
    /// Moving the king first promotes the challenger so the crown is never
    /// vacant. Queue destinations use remove-then-insert semantics; indices
    /// past the end append. Unknown players are ignored.
    pub fn move_player(&self, player: &Player, destination: Position) {
        let crowned = {
            let mut queue = lock(&self.core.queue);
            let mut king = write(&self.core.king);
            let previous_king = king.clone();

            let is_king = king.as_ref() == Some(player);
            if !is_king && !queue.contains(player) {
                tracing::debug!("Ignoring move of unknown player {}", player.id);
                return;
            }
            if is_king {
                if queue.is_empty() {
                    tracing::debug!("Ignoring move of king {} with an empty queue", player.id);
                    return;
                }
                *king = Some(queue.remove(0));
            }

            match destination {
                Position::King => {
                    if let Some(current) = king.take() {
                        queue.insert(0, current);
                    }
                    queue.retain(|p| p != player);
                    *king = Some(player.clone());
                }
                Position::Queue(index) if index < queue.len() => {
                    queue.retain(|p| p != player);
                    let index = index.min(queue.len());
                    queue.insert(index, player.clone());
                }
                Position::Queue(_) => {
                    queue.retain(|p| p != player);
                    queue.push(player.clone());
                }
            }

            let crowned = (*king != previous_king).then(|| king.clone()).flatten();
            if crowned.is_some() {
                self.core.set_king_win_streak(0);
            }
            crowned
        };

        self.finish_mutation(crowned.as_ref());
    }

    /// Move whoever sits at `from` to `to`
    pub fn move_player_at(&self, from: Position, to: Position) {
        let player = match from {
            Position::King => self.core.king(),
            Position::Queue(index) => lock(&self.core.queue).get(index).cloned(),
        };
        match player {
            Some(player) => self.move_player(&player, to),
            None => tracing::debug!("Ignoring move from empty slot {:?}", from),
        }
    }

    // ========================================================================
    // ROUND RESULTS
    // ========================================================================

    /// The challenger beat the king: the king goes to the back of the queue
    /// and the challenger takes the crown.
    ///
    /// Records and the streak change under the queue lock.
    pub fn move_king_to_end(&self) {
        let new_king = {
            let mut queue = lock(&self.core.queue);
            let mut king = write(&self.core.king);
            let Some(old_king) = king.clone() else {
                tracing::debug!("No king to demote");
                return;
            };
            if queue.is_empty() {
                tracing::debug!("No challenger to promote");
                return;
            }
            queue.push(old_king.clone());
            let new_king = queue.remove(0);
            *king = Some(new_king.clone());

            self.core.record_result(&new_king, &old_king);
            self.core.set_king_win_streak(1);
            new_king
        };

        self.core.start_round();
        self.finish_mutation(Some(&new_king));
    }

    /// The king beat the challenger: the challenger goes to the back.
    /// Returns the challenger that was moved.
    pub fn move_challenger_to_end(&self) -> Option<Player> {
        let challenger = {
            let mut queue = lock(&self.core.queue);
            let king = self.core.king()?;
            if queue.is_empty() {
                tracing::debug!("No challenger to move");
                return None;
            }
            let challenger = queue.remove(0);
            queue.push(challenger.clone());

            self.core.record_result(&king, &challenger);
            self.core.increment_king_win_streak();
            challenger
        };

        self.core.start_round();
        self.finish_mutation(None);
        Some(challenger)
    }

    // ========================================================================
    // ROSTER
    // ========================================================================

    /// Append players that are not yet in the tournament, keeping their
    /// order. With no king yet, the first newcomer is crowned.
    pub fn add_new_players_to_bottom(&self, players: &[Player]) {
        let crowned = {
            let mut queue = lock(&self.core.queue);
            let mut king = write(&self.core.king);
            let crowned = admit(&mut queue, &mut king, players);
            if crowned.is_some() {
                self.core.set_king_win_streak(0);
            }
            crowned
        };
        self.finish_mutation(crowned.as_ref());
    }

    /// Reconcile against the authoritative roster.
    ///
    /// Newcomers are admitted first; the removal scan then runs against the
    /// updated queue. A departed king is replaced by the challenger, leaving
    /// the crown empty if nobody is queued.
    pub fn update_player_list(&self, players: &[Player]) {
        let crowned = {
            let mut queue = lock(&self.core.queue);
            let mut king = write(&self.core.king);
            let mut crowned = admit(&mut queue, &mut king, players);

            queue.retain(|p| players.contains(p));

            let king_left = king.as_ref().is_some_and(|k| !players.contains(k));
            if king_left {
                *king = if queue.is_empty() {
                    None
                } else {
                    Some(queue.remove(0))
                };
                crowned = king.clone();
                if let Some(new_king) = &crowned {
                    tracing::info!("King left; {} takes the crown", new_king.name);
                }
            }
            if king_left || crowned.is_some() {
                self.core.set_king_win_streak(0);
            }
            crowned
        };

        self.finish_mutation(crowned.as_ref());
    }

    // ========================================================================
    // SETTINGS
    // ========================================================================

    /// Values below 1 turn the game timer off
    pub fn set_game_timer_setting(&self, seconds: i32) {
        write(&self.core.game_timer).configure(seconds);
        self.finish_mutation(None);
    }

    /// Values below 1 turn the round timer off
    pub fn set_round_timer_setting(&self, seconds: i32) {
        write(&self.core.round_timer).configure(seconds);
        self.finish_mutation(None);
    }

    /// Start over with a new king and queue; all records are cleared.
    /// Without an explicit king the first player is crowned.
    pub fn restart_tournament(&self, king: Option<Player>, players: &[Player]) {
        let crowned = {
            let mut queue = lock(&self.core.queue);
            let mut current = write(&self.core.king);
            let king = king.or_else(|| players.first().cloned());
            *queue = queue_without(players, king.as_ref());
            *current = king.clone();
            write(&self.core.extras).clear();
            self.core.set_king_win_streak(0);
            king
        };

        self.core.start_game();
        self.core.start_round();
        tracing::info!("Tournament {} restarted", self.core.id);
        self.finish_mutation(crowned.as_ref());
    }

    /// Push the current state to participants
    pub fn send_game_state(&self) {
        self.core.outgoing.send_game_state(&self.core);
    }

    fn finish_mutation(&self, crowned: Option<&Player>) {
        self.core.notify_changed(crowned);
        self.send_game_state();
    }
}

/// Admit newcomers; returns the player crowned if the throne was empty
fn admit(queue: &mut Vec<Player>, king: &mut Option<Player>, players: &[Player]) -> Option<Player> {
    let mut crowned = None;
    for player in players {
        if king.as_ref() == Some(player) || queue.contains(player) {
            continue;
        }
        if king.is_none() {
            *king = Some(player.clone());
            crowned = Some(player.clone());
        } else {
            queue.push(player.clone());
        }
    }
    crowned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(n: usize) -> (HostTournament, Vec<Player>) {
        let players: Vec<Player> = (1..=n).map(|i| Player::random(format!("P{}", i))).collect();
        let host = HostTournament::new(7, players.first().cloned(), &players[1..]);
        (host, players)
    }

    #[test]
    fn test_move_queue_player_forward() {
        let (host, p) = host(4);
        host.move_player(&p[3], Position::Queue(0));
        assert_eq!(host.players(), vec![p[3].clone(), p[1].clone(), p[2].clone()]);
    }

    #[test]
    fn test_move_queue_player_backward() {
        let (host, p) = host(4);
        host.move_player(&p[1], Position::Queue(1));
        assert_eq!(host.players(), vec![p[2].clone(), p[1].clone(), p[3].clone()]);
    }

    #[test]
    fn test_move_past_end_appends() {
        let (host, p) = host(4);
        host.move_player(&p[1], Position::Queue(99));
        assert_eq!(host.players(), vec![p[2].clone(), p[3].clone(), p[1].clone()]);
    }

    #[test]
    fn test_move_to_own_slot_is_unchanged() {
        let (host, p) = host(4);
        host.move_player(&p[2], Position::Queue(1));
        assert_eq!(host.players(), p[1..].to_vec());
        host.move_player(&p[0], Position::King);
        assert_eq!(host.king(), Some(p[0].clone()));
        assert_eq!(host.players(), p[1..].to_vec());
    }

    #[test]
    fn test_move_unknown_player_is_noop() {
        let (host, p) = host(3);
        host.move_player(&Player::random("ghost"), Position::King);
        assert_eq!(host.king(), Some(p[0].clone()));
        assert_eq!(host.players(), p[1..].to_vec());
    }

    #[test]
    fn test_move_lone_king_is_noop() {
        let (host, p) = host(1);
        host.move_player(&p[0], Position::Queue(0));
        assert_eq!(host.king(), Some(p[0].clone()));
        assert!(host.players().is_empty());
    }

    #[test]
    fn test_king_swap_resets_streak() {
        let (host, p) = host(3);
        host.move_challenger_to_end();
        assert_eq!(host.king_win_streak(), 1);
        host.move_player(&p[2], Position::King);
        assert_eq!(host.king(), Some(p[2].clone()));
        assert_eq!(host.king_win_streak(), 0);
    }

    #[test]
    fn test_round_results_with_empty_queue_are_noops() {
        let (host, p) = host(1);
        host.move_king_to_end();
        assert_eq!(host.move_challenger_to_end(), None);
        assert_eq!(host.king(), Some(p[0].clone()));
        assert_eq!(host.player_extra(&p[0]).wins(), None);
    }

    #[test]
    fn test_first_admitted_player_is_crowned() {
        let host = HostTournament::new(1, None, &[]);
        let a = Player::random("A");
        let b = Player::random("B");
        host.add_new_players_to_bottom(&[a.clone(), b.clone()]);
        assert_eq!(host.king(), Some(a));
        assert_eq!(host.players(), vec![b]);
    }

    #[test]
    fn test_update_player_list_removes_absent_queue_members() {
        let (host, p) = host(4);
        let newcomer = Player::random("P5");
        host.update_player_list(&[p[0].clone(), p[2].clone(), newcomer.clone()]);
        assert_eq!(host.king(), Some(p[0].clone()));
        assert_eq!(host.players(), vec![p[2].clone(), newcomer]);
    }

    #[test]
    fn test_update_player_list_can_empty_the_throne() {
        let (host, p) = host(2);
        host.update_player_list(&[]);
        assert_eq!(host.king(), None);
        assert!(host.players().is_empty());
        host.update_player_list(&[p[1].clone()]);
        assert_eq!(host.king(), Some(p[1].clone()));
    }

    #[test]
    fn test_restart_clears_records() {
        let (host, p) = host(3);
        host.move_king_to_end();
        host.move_challenger_to_end();
        host.restart_tournament(Some(p[2].clone()), &p);
        assert_eq!(host.king(), Some(p[2].clone()));
        assert_eq!(host.players(), vec![p[0].clone(), p[1].clone()]);
        assert!(host.player_extras().is_empty());
        assert_eq!(host.king_win_streak(), 0);
    }

    #[test]
    fn test_concurrent_round_results_keep_streak_consistent() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        for _ in 0..500 {
            let (host, p) = host(3);
            let host = Arc::new(host);
            for _ in 0..5 {
                host.move_challenger_to_end();
            }
            assert_eq!(host.king_win_streak(), 5);

            let barrier = Arc::new(Barrier::new(2));
            let demote = {
                let (host, barrier) = (host.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    host.move_king_to_end();
                })
            };
            let defend = {
                let (host, barrier) = (host.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    host.move_challenger_to_end();
                })
            };
            demote.join().unwrap();
            defend.join().unwrap();

            // Either order crowns a player whose every win came this reign
            let king = host.king().unwrap();
            assert_ne!(king, p[0]);
            let king_wins = host.player_extra(&king).wins().unwrap_or(0);
            assert_eq!(host.king_win_streak(), king_wins);
        }
    }

    #[test]
    fn test_timer_settings() {
        let (host, _) = host(2);
        host.set_round_timer_setting(120);
        assert_eq!(host.round_timer_setting(), Some(120));
        host.set_round_timer_setting(0);
        assert_eq!(host.remaining_round_time(), None);
        host.set_game_timer_setting(-3);
        assert_eq!(host.remaining_game_time(), None);
    }
}
