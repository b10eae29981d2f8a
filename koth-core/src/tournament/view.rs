//! Read-only views: serializable state, standings, and the text dump used by
//! notifications

use std::cmp::Ordering;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Position, TournamentCore};
use crate::player::{Player, PlayerExtra};
use crate::sync::{lock, read};

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub position: Position,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
}

/// Point-in-time copy of a tournament
#[derive(Clone, Debug, Serialize)]
pub struct TournamentView {
    pub tournament_id: u64,
    pub king: Option<PlayerView>,
    pub queue: Vec<PlayerView>,
    pub king_win_streak: u32,
    pub game_timer_remaining: Option<u32>,
    pub round_timer_remaining: Option<u32>,
}

/// One row of the standings table
pub type Standing = PlayerView;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingsOrder {
    /// Most wins first, fewer losses breaking ties
    #[default]
    Wins,
    /// Most losses first
    Losses,
    Name,
}

impl TournamentCore {
    pub fn view(&self) -> TournamentView {
        let (king, queue) = self.rows();
        TournamentView {
            tournament_id: self.id,
            king,
            queue,
            king_win_streak: self.king_win_streak(),
            game_timer_remaining: self.remaining_game_time(),
            round_timer_remaining: self.remaining_round_time(),
        }
    }

    /// Everyone in the tournament, sorted
    pub fn standings(&self, order: StandingsOrder) -> Vec<Standing> {
        let (king, queue) = self.rows();
        let mut rows: Vec<Standing> = king.into_iter().chain(queue).collect();
        rows.sort_by(|a, b| match order {
            StandingsOrder::Wins => desc(a.wins, b.wins)
                .then_with(|| a.losses.unwrap_or(0).cmp(&b.losses.unwrap_or(0)))
                .then_with(|| by_name(a, b)),
            StandingsOrder::Losses => desc(a.losses, b.losses).then_with(|| by_name(a, b)),
            StandingsOrder::Name => by_name(a, b),
        });
        rows
    }

    /// Plain-text summary of the king and queue with records
    pub fn tournament_data(&self) -> String {
        let (king, queue) = self.rows();
        let mut text = String::new();
        match &king {
            Some(king) => {
                let _ = write!(text, "Current King: {}", king.name);
                push_record(&mut text, king);
            }
            None => text.push_str("Current King: none"),
        }
        for player in &queue {
            let _ = write!(text, "\n\n{}", player.name);
            push_record(&mut text, player);
        }
        text
    }

    fn rows(&self) -> (Option<PlayerView>, Vec<PlayerView>) {
        let queue = lock(&self.queue);
        let king = read(&self.king);
        let extras = read(&self.extras);
        let row = |player: &Player, position: Position| {
            let extra = extras
                .get(&player.id)
                .copied()
                .unwrap_or_else(|| PlayerExtra::new(player.id));
            PlayerView {
                id: player.id,
                name: player.name.clone(),
                position,
                wins: extra.wins(),
                losses: extra.losses(),
            }
        };

        let king_row = king.as_ref().map(|k| row(k, Position::King));
        let queue_rows = queue
            .iter()
            .enumerate()
            .map(|(i, p)| row(p, Position::Queue(i)))
            .collect();
        (king_row, queue_rows)
    }
}

fn desc(a: Option<u32>, b: Option<u32>) -> Ordering {
    b.cmp(&a)
}

fn by_name(a: &PlayerView, b: &PlayerView) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

fn push_record(text: &mut String, player: &PlayerView) {
    let show = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    let _ = write!(
        text,
        "\n\tWins: {}\n\tLosses: {}",
        show(player.wins),
        show(player.losses)
    );
}

#[cfg(test)]
mod tests {
    use crate::player::Player;
    use crate::tournament::{Position, Role, StandingsOrder, Tournament};

    fn played_tournament() -> (Tournament, Vec<Player>) {
        let players = vec![
            Player::random("Ann"),
            Player::random("Bob"),
            Player::random("Cat"),
        ];
        let tournament = Tournament::new(3, Role::Host, &players);
        let host = tournament.as_host().unwrap();
        host.move_challenger_to_end(); // Ann beats Bob
        host.move_king_to_end(); // Cat beats Ann
        (tournament, players)
    }

    #[test]
    fn test_view_positions() {
        let (tournament, players) = played_tournament();
        let view = tournament.view();
        let king = view.king.unwrap();
        assert_eq!(king.id, players[2].id);
        assert_eq!(king.position, Position::King);
        assert_eq!(view.queue[0].position, Position::Queue(0));
        assert_eq!(view.king_win_streak, 1);
    }

    #[test]
    fn test_standings_by_wins() {
        let (tournament, _) = played_tournament();
        let names: Vec<String> = tournament
            .standings(StandingsOrder::Wins)
            .into_iter()
            .map(|s| s.name)
            .collect();
        // Ann 1-1, Cat 1-0, Bob 0-1
        assert_eq!(names, vec!["Cat", "Ann", "Bob"]);
    }

    #[test]
    fn test_standings_by_name() {
        let (tournament, _) = played_tournament();
        let names: Vec<String> = tournament
            .standings(StandingsOrder::Name)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Bob", "Cat"]);
    }

    #[test]
    fn test_tournament_data_text() {
        let players = vec![Player::random("Ann"), Player::random("Bob")];
        let tournament = Tournament::new(4, Role::Host, &players);
        assert_eq!(
            tournament.tournament_data(),
            "Current King: Ann\n\tWins: -\n\tLosses: -\n\nBob\n\tWins: -\n\tLosses: -"
        );
        tournament.as_host().unwrap().move_challenger_to_end();
        assert!(tournament
            .tournament_data()
            .starts_with("Current King: Ann\n\tWins: 1\n\tLosses: 0"));
    }
}
