//! Player identity and per-player records

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

// ============================================================================
// PLAYER
// ============================================================================

/// A tournament player as reported by the roster.
///
/// Equality and hashing use the stable id only, so a renamed player is still
/// the same player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
}

impl Player {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            portrait: None,
        }
    }

    /// Create a player with a fresh random id
    pub fn random(name: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4(), name)
    }

    pub fn with_portrait(mut self, portrait: impl Into<String>) -> Self {
        self.portrait = Some(portrait.into());
        self
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ============================================================================
// PLAYER EXTRA
// ============================================================================

/// Win/loss record for one player.
///
/// `None` means the player has never played a round, which is different
/// from a record of zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerExtra {
    pub player_id: Uuid,
    wins: Option<u32>,
    losses: Option<u32>,
}

impl PlayerExtra {
    /// Fresh record with both counters unset
    pub fn new(player_id: Uuid) -> Self {
        Self {
            player_id,
            wins: None,
            losses: None,
        }
    }

    /// Record with preset counters, as received over the wire
    pub fn with_record(player_id: Uuid, wins: Option<u32>, losses: Option<u32>) -> Self {
        Self {
            player_id,
            wins,
            losses,
        }
    }

    pub fn wins(&self) -> Option<u32> {
        self.wins
    }

    pub fn losses(&self) -> Option<u32> {
        self.losses
    }

    /// Total rounds played, if the player has played at all
    pub fn games(&self) -> Option<u32> {
        match (self.wins, self.losses) {
            (None, None) => None,
            (w, l) => Some(w.unwrap_or(0) + l.unwrap_or(0)),
        }
    }

    /// True once either counter has been set
    pub fn is_set(&self) -> bool {
        self.wins.is_some() || self.losses.is_some()
    }

    pub fn add_win(&mut self) {
        self.prepare_record();
        self.wins = self.wins.map(|w| w + 1);
    }

    pub fn add_loss(&mut self) {
        self.prepare_record();
        self.losses = self.losses.map(|l| l + 1);
    }

    /// Both counters start at zero the first time a result is recorded
    fn prepare_record(&mut self) {
        self.wins.get_or_insert(0);
        self.losses.get_or_insert(0);
    }

    /// Record as "3W 1L", or empty when never played
    pub fn record_text(&self) -> String {
        match (self.wins, self.losses) {
            (Some(w), Some(l)) => format!("{}W {}L", w, l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_equality_uses_id() {
        let id = Uuid::new_v4();
        let a = Player::new(id, "Alice");
        let b = Player::new(id, "Alice (renamed)");
        assert_eq!(a, b);
        assert_ne!(a, Player::random("Alice"));
    }

    #[test]
    fn test_extra_starts_unset() {
        let extra = PlayerExtra::new(Uuid::new_v4());
        assert_eq!(extra.wins(), None);
        assert_eq!(extra.losses(), None);
        assert_eq!(extra.games(), None);
        assert!(!extra.is_set());
        assert_eq!(extra.record_text(), "");
    }

    #[test]
    fn test_add_win_normalizes_losses() {
        let mut extra = PlayerExtra::new(Uuid::new_v4());
        extra.add_win();
        assert_eq!(extra.wins(), Some(1));
        assert_eq!(extra.losses(), Some(0));
        assert_eq!(extra.games(), Some(1));
    }

    #[test]
    fn test_add_loss_normalizes_wins() {
        let mut extra = PlayerExtra::new(Uuid::new_v4());
        extra.add_loss();
        extra.add_loss();
        assert_eq!(extra.wins(), Some(0));
        assert_eq!(extra.losses(), Some(2));
        assert_eq!(extra.record_text(), "0W 2L");
    }
}
