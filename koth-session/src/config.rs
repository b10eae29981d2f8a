//! Session configuration

use uuid::Uuid;

/// Settings applied when a session starts
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Registry key of the tournament
    pub tournament_id: u64,
    /// Game timer in seconds; values below 1 leave it off (host only)
    pub game_timer_secs: i32,
    /// Round timer in seconds; values below 1 leave it off (host only)
    pub round_timer_secs: i32,
    /// Participant asks the host for a snapshot right after joining
    pub request_state_on_join: bool,
    /// The player sitting at this device, if any
    pub local_player: Option<Uuid>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tournament_id: 0,
            game_timer_secs: 0,
            round_timer_secs: 0,
            request_state_on_join: true,
            local_player: None,
        }
    }
}

impl SessionConfig {
    pub fn new(tournament_id: u64) -> Self {
        Self {
            tournament_id,
            ..Default::default()
        }
    }

    pub fn with_game_timer(mut self, seconds: i32) -> Self {
        self.game_timer_secs = seconds;
        self
    }

    pub fn with_round_timer(mut self, seconds: i32) -> Self {
        self.round_timer_secs = seconds;
        self
    }

    pub fn with_request_state_on_join(mut self, request: bool) -> Self {
        self.request_state_on_join = request;
        self
    }

    pub fn with_local_player(mut self, player: Uuid) -> Self {
        self.local_player = Some(player);
        self
    }
}
