//! Game-state snapshot and game-state request messages
//!
//! ```text
//! <utool_kingofthehill type="GameState" gameTimerRemaining="120" roundTimerRemaining="-1">
//!   <king player_uuid="..." kingWins="2" player_wins="5" player_losses="1"/>
//!   <player player_uuid="..." player_position="0"/>
//!   <player player_uuid="..." player_position="1" player_wins="0" player_losses="3"/>
//! </utool_kingofthehill>
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use super::xml::{self, Attrs};
use super::{timer_from_wire, timer_to_wire, MessageError};
use crate::player::PlayerExtra;

const ROOT_TAG: &str = "utool_kingofthehill";
const MESSAGE_TYPE_ATTRIB: &str = "type";
const GAME_TIMER_REMAINING_ATTRIB: &str = "gameTimerRemaining";
const ROUND_TIMER_REMAINING_ATTRIB: &str = "roundTimerRemaining";
const KING_TAG: &str = "king";
const KING_WINS_ATTRIB: &str = "kingWins";
const PLAYER_TAG: &str = "player";
const PLAYER_UUID_ATTRIB: &str = "player_uuid";
const PLAYER_POSITION_ATTRIB: &str = "player_position";
const PLAYER_WINS_ATTRIB: &str = "player_wins";
const PLAYER_LOSSES_ATTRIB: &str = "player_losses";

const KIND: &str = "game state";

/// Message kinds sharing the envelope
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    /// Full snapshot from the host
    GameState,
    /// "Send me the current snapshot"
    RequestGameState,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::GameState => "GameState",
            MessageType::RequestGameState => "RequestGameState",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GameState" => Ok(MessageType::GameState),
            "RequestGameState" => Ok(MessageType::RequestGameState),
            other => Err(xml::malformed(KIND, format!("unknown message type {:?}", other))),
        }
    }
}

/// A decoded or to-be-encoded game-state message
#[derive(Clone, Debug, PartialEq)]
pub struct GameStateMessage {
    pub message_type: MessageType,
    pub king: Option<Uuid>,
    /// The king's win streak this reign
    pub king_wins: u32,
    /// Queue order, challenger first
    pub players: Vec<Uuid>,
    /// Records for players that have played; unset records are not sent
    pub extras: FxHashMap<Uuid, PlayerExtra>,
    pub game_timer_remaining: Option<u32>,
    pub round_timer_remaining: Option<u32>,
}

impl GameStateMessage {
    /// Build a snapshot. Only records for the king and queued players that
    /// have actually been set are carried.
    pub fn snapshot(
        king: Option<Uuid>,
        king_wins: u32,
        players: Vec<Uuid>,
        extras: &FxHashMap<Uuid, PlayerExtra>,
        game_timer_remaining: Option<u32>,
        round_timer_remaining: Option<u32>,
    ) -> Self {
        let carried = king
            .iter()
            .chain(players.iter())
            .filter_map(|id| extras.get(id))
            .filter(|extra| extra.is_set())
            .map(|extra| (extra.player_id, *extra))
            .collect();

        Self {
            message_type: MessageType::GameState,
            king,
            king_wins,
            players,
            extras: carried,
            game_timer_remaining,
            round_timer_remaining,
        }
    }

    /// An empty state request
    pub fn request() -> Self {
        Self {
            message_type: MessageType::RequestGameState,
            king: None,
            king_wins: 0,
            players: Vec::new(),
            extras: FxHashMap::default(),
            game_timer_remaining: None,
            round_timer_remaining: None,
        }
    }

    /// Quick check of the root tag without a full decode
    pub fn is_of_message_type(text: &str) -> bool {
        let mut reader = xml::reader(text);
        xml::open_root(&mut reader, ROOT_TAG, KIND).is_ok()
    }

    // ========================================================================
    // ENCODE
    // ========================================================================

    pub fn to_xml(&self) -> Result<String, MessageError> {
        xml::write_document(KIND, |writer| {
            let game = timer_to_wire(self.game_timer_remaining).to_string();
            let round = timer_to_wire(self.round_timer_remaining).to_string();

            let mut root = BytesStart::new(ROOT_TAG);
            root.push_attribute((MESSAGE_TYPE_ATTRIB, self.message_type.as_str()));
            root.push_attribute((GAME_TIMER_REMAINING_ATTRIB, game.as_str()));
            root.push_attribute((ROUND_TIMER_REMAINING_ATTRIB, round.as_str()));
            writer.write_event(Event::Start(root))?;

            if let Some(king) = self.king {
                let mut tag = BytesStart::new(KING_TAG);
                tag.push_attribute((PLAYER_UUID_ATTRIB, king.to_string().as_str()));
                tag.push_attribute((KING_WINS_ATTRIB, self.king_wins.to_string().as_str()));
                self.push_record(&mut tag, &king);
                writer.write_event(Event::Empty(tag))?;
            }

            for (position, player) in self.players.iter().enumerate() {
                let mut tag = BytesStart::new(PLAYER_TAG);
                tag.push_attribute((PLAYER_UUID_ATTRIB, player.to_string().as_str()));
                tag.push_attribute((PLAYER_POSITION_ATTRIB, position.to_string().as_str()));
                self.push_record(&mut tag, player);
                writer.write_event(Event::Empty(tag))?;
            }

            writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;
            Ok(())
        })
    }

    /// Unset counters are omitted rather than written as a sentinel
    fn push_record(&self, tag: &mut BytesStart<'_>, player: &Uuid) {
        let Some(extra) = self.extras.get(player) else {
            return;
        };
        if let Some(wins) = extra.wins() {
            tag.push_attribute((PLAYER_WINS_ATTRIB, wins.to_string().as_str()));
        }
        if let Some(losses) = extra.losses() {
            tag.push_attribute((PLAYER_LOSSES_ATTRIB, losses.to_string().as_str()));
        }
    }

    // ========================================================================
    // DECODE
    // ========================================================================

    /// Decode a message.
    ///
    /// The queue is rebuilt from the explicit position attributes once the
    /// whole document has been read, so document order does not matter.
    pub fn from_xml(text: &str) -> Result<Self, MessageError> {
        let mut reader = xml::reader(text);
        let root = xml::open_root(&mut reader, ROOT_TAG, KIND)?;
        let root_attrs = Attrs::read(&root, KIND)?;

        let message_type: MessageType = root_attrs.require(MESSAGE_TYPE_ATTRIB)?;
        let (game_timer_remaining, round_timer_remaining) = match message_type {
            MessageType::GameState => (
                timer_from_wire(root_attrs.require(GAME_TIMER_REMAINING_ATTRIB)?),
                timer_from_wire(root_attrs.require(ROUND_TIMER_REMAINING_ATTRIB)?),
            ),
            MessageType::RequestGameState => (None, None),
        };

        let mut message = Self {
            message_type,
            game_timer_remaining,
            round_timer_remaining,
            ..Self::request()
        };
        let mut positions: BTreeMap<usize, Uuid> = BTreeMap::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => {
                    if xml::is_element(&tag, KING_TAG) {
                        let attrs = Attrs::read(&tag, KIND)?;
                        let king: Uuid = attrs.require(PLAYER_UUID_ATTRIB)?;
                        message.king = Some(king);
                        message.king_wins = attrs.parse(KING_WINS_ATTRIB)?.unwrap_or(0);
                        message.read_record(&attrs, king)?;
                    } else if xml::is_element(&tag, PLAYER_TAG) {
                        let attrs = Attrs::read(&tag, KIND)?;
                        let player: Uuid = attrs.require(PLAYER_UUID_ATTRIB)?;
                        let position: usize = attrs.require(PLAYER_POSITION_ATTRIB)?;
                        positions.insert(position, player);
                        message.read_record(&attrs, player)?;
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(xml::malformed(KIND, e.to_string())),
            }
        }

        message.players = positions.into_values().collect();
        Ok(message)
    }

    fn read_record(&mut self, attrs: &Attrs, player: Uuid) -> Result<(), MessageError> {
        let wins = counter(attrs.parse(PLAYER_WINS_ATTRIB)?);
        let losses = counter(attrs.parse(PLAYER_LOSSES_ATTRIB)?);
        if wins.is_some() || losses.is_some() {
            self.extras
                .insert(player, PlayerExtra::with_record(player, wins, losses));
        }
        Ok(())
    }
}

/// Older peers write -1 for an unset counter
fn counter(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}
