//! Roster messages
//!
//! The roster belongs to the session layer; this is the codec the bundled
//! transports speak. `PlayerRegister` announces newcomers, `PlayerList`
//! carries the complete authoritative roster.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use uuid::Uuid;

use super::xml::{self, Attrs};
use super::MessageError;
use crate::player::Player;

const ROOT_TAG: &str = "utool_player_message";
const MESSAGE_TYPE_ATTRIB: &str = "type";
const PLAYER_TAG: &str = "player";
const UUID_ATTRIB: &str = "uuid";
const NAME_ATTRIB: &str = "name";
const PORTRAIT_ATTRIB: &str = "portrait";

const KIND: &str = "roster";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RosterMessageType {
    PlayerRegister,
    PlayerList,
}

impl RosterMessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            RosterMessageType::PlayerRegister => "PlayerRegister",
            RosterMessageType::PlayerList => "PlayerList",
        }
    }

    fn parse(raw: &str) -> Result<Self, MessageError> {
        match raw {
            "PlayerRegister" => Ok(RosterMessageType::PlayerRegister),
            "PlayerList" => Ok(RosterMessageType::PlayerList),
            other => Err(xml::malformed(KIND, format!("unknown message type {:?}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RosterMessage {
    pub message_type: RosterMessageType,
    pub players: Vec<Player>,
}

impl RosterMessage {
    pub fn register(players: Vec<Player>) -> Self {
        Self {
            message_type: RosterMessageType::PlayerRegister,
            players,
        }
    }

    pub fn list(players: Vec<Player>) -> Self {
        Self {
            message_type: RosterMessageType::PlayerList,
            players,
        }
    }

    pub fn to_xml(&self) -> Result<String, MessageError> {
        xml::write_document(KIND, |writer| {
            let mut root = BytesStart::new(ROOT_TAG);
            root.push_attribute((MESSAGE_TYPE_ATTRIB, self.message_type.as_str()));
            writer.write_event(Event::Start(root))?;

            for player in &self.players {
                let mut tag = BytesStart::new(PLAYER_TAG);
                tag.push_attribute((UUID_ATTRIB, player.id.to_string().as_str()));
                tag.push_attribute((NAME_ATTRIB, player.name.as_str()));
                if let Some(portrait) = &player.portrait {
                    tag.push_attribute((PORTRAIT_ATTRIB, portrait.as_str()));
                }
                writer.write_event(Event::Empty(tag))?;
            }

            writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;
            Ok(())
        })
    }

    /// Decode a roster message; players keep document order
    pub fn from_xml(text: &str) -> Result<Self, MessageError> {
        let mut reader = xml::reader(text);
        let root = xml::open_root(&mut reader, ROOT_TAG, KIND)?;
        let root_attrs = Attrs::read(&root, KIND)?;
        let raw_type: String = root_attrs.require(MESSAGE_TYPE_ATTRIB)?;
        let message_type = RosterMessageType::parse(&raw_type)?;

        let mut players = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) if xml::is_element(&tag, PLAYER_TAG) => {
                    let attrs = Attrs::read(&tag, KIND)?;
                    let id: Uuid = attrs.require(UUID_ATTRIB)?;
                    let name = attrs.get(NAME_ATTRIB).unwrap_or_default().to_string();
                    let mut player = Player::new(id, name);
                    player.portrait = attrs.get(PORTRAIT_ATTRIB).map(str::to_string);
                    players.push(player);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(xml::malformed(KIND, e.to_string())),
            }
        }

        Ok(Self {
            message_type,
            players,
        })
    }
}
