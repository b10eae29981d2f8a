//! Wire protocol
//!
//! Messages are small XML documents identified by their root tag. Decoders
//! report [`MessageError::WrongMessageType`] when the root tag belongs to some
//! other message, which lets the incoming handler try the next candidate.

mod game_state;
mod roster;
mod xml;

pub use game_state::{GameStateMessage, MessageType};
pub use roster::{RosterMessage, RosterMessageType};

/// Distinguished text sent by the session layer when the tournament is over
pub const TERMINATION_MESSAGE: &str = "UTOOL_PLUGIN_TERMINATE";

/// Wire value for a timer that is not configured
pub const TIMER_NOT_SET: i32 = -1;

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The document is not this kind of message; try another decoder
    #[error("not a {expected} message (root tag: {found:?})")]
    WrongMessageType {
        expected: &'static str,
        found: Option<String>,
    },
    /// Right envelope, but a required attribute is missing or unparseable
    #[error("malformed {kind} message: {reason}")]
    Malformed { kind: &'static str, reason: String },
    #[error("failed to encode {kind} message: {reason}")]
    Encode { kind: &'static str, reason: String },
}

impl MessageError {
    pub fn is_wrong_message_type(&self) -> bool {
        matches!(self, MessageError::WrongMessageType { .. })
    }
}

/// Check for the termination sentinel without parsing
pub fn is_termination_message(text: &str) -> bool {
    text.trim() == TERMINATION_MESSAGE
}

/// Timer value as sent on the wire
pub(crate) fn timer_to_wire(remaining: Option<u32>) -> i32 {
    remaining
        .map(|r| i32::try_from(r).unwrap_or(i32::MAX))
        .unwrap_or(TIMER_NOT_SET)
}

/// Negative wire values mean NOT_SET
pub(crate) fn timer_from_wire(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_predicate() {
        assert!(is_termination_message(TERMINATION_MESSAGE));
        assert!(is_termination_message("  UTOOL_PLUGIN_TERMINATE\n"));
        assert!(!is_termination_message("<utool_kingofthehill/>"));
    }

    #[test]
    fn test_timer_wire_values() {
        assert_eq!(timer_to_wire(None), TIMER_NOT_SET);
        assert_eq!(timer_to_wire(Some(0)), 0);
        assert_eq!(timer_from_wire(-1), None);
        assert_eq!(timer_from_wire(0), Some(0));
        assert_eq!(timer_from_wire(45), Some(45));
    }
}
