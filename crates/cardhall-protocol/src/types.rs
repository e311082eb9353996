//! Core protocol types: identities and the inbound/outbound messages.
//!
//! Both directions use the same `{ "type": ..., "payload": ... }` shape.
//! Outbound messages are plain serde derives. Inbound messages go through
//! [`ClientMessage::decode`], which keeps "not JSON", "unknown type" and
//! "bad payload" apart so each gets its own `ERROR` text.

use std::fmt;

use cardhall_cards::CardId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Codec, ProtocolError, RoomSnapshot};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity inside one room.
///
/// The id doubles as the reconnection token: a client that presents a
/// known id in `JOIN` takes over that seat again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The code players type to meet in the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// The two games a room can play, named on the wire by their vote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Trick-taking elimination game, six-card hands.
    #[serde(rename = "6")]
    Durak,
    /// Community-card poker, four-card hands.
    #[serde(rename = "4")]
    Omaha,
}

impl Variant {
    /// Parses a vote value. Anything other than `"4"` or `"6"` is `None`.
    pub fn from_vote(mode: &str) -> Option<Self> {
        match mode {
            "6" => Some(Self::Durak),
            "4" => Some(Self::Omaha),
            _ => None,
        }
    }

    pub fn as_vote(self) -> &'static str {
        match self {
            Self::Durak => "6",
            Self::Omaha => "4",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durak => f.write_str("durak"),
            Self::Omaha => f.write_str("omaha"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Payload of `JOIN`. Every field is optional on the wire; the room layer
/// decides what a missing code or name means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinRequest {
    pub name: Option<String>,
    #[serde(rename = "roomCode")]
    pub room_code: Option<String>,
    #[serde(rename = "playerId")]
    pub player_id: Option<PlayerId>,
}

/// A move inside a running game, carried by `GAME_ACTION`.
///
/// Internally tagged: `{"type": "PLAY_DEFENSE", "cardId": 7, "attackIndex": 0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameAction {
    PlayAttack {
        #[serde(rename = "cardId")]
        card_id: CardId,
    },
    PlayDefense {
        #[serde(rename = "cardId")]
        card_id: CardId,
        #[serde(rename = "attackIndex")]
        attack_index: usize,
    },
    Transfer {
        #[serde(rename = "cardId")]
        card_id: CardId,
    },
    EndAttack,
    TakeCards,
    Discard {
        #[serde(rename = "cardId")]
        card_id: CardId,
    },
}

/// Everything a client can send.
///
/// `Serialize` produces the canonical wire form (unit variants carry no
/// payload). Parsing goes through [`ClientMessage::decode`] instead of a
/// derived `Deserialize`, because clients also send `"payload": {}` for
/// payload-less messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Join(JoinRequest),
    VoteMode {
        mode: String,
    },
    StartGame,
    RestartGame,
    EmojiEvent {
        #[serde(rename = "emojiCode")]
        emoji_code: String,
    },
    GameAction(GameAction),
}

#[derive(Deserialize)]
struct VotePayload {
    mode: String,
}

#[derive(Deserialize)]
struct EmojiPayload {
    #[serde(rename = "emojiCode")]
    emoji_code: String,
}

impl ClientMessage {
    /// Decodes one inbound frame.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`]: not JSON at all.
    /// - [`ProtocolError::UnknownType`]: no string `type`, or an unknown one.
    /// - [`ProtocolError::InvalidMessage`]: the payload doesn't fit the type.
    pub fn decode(codec: &impl Codec, data: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = codec.decode(data)?;
        Self::from_value(value)
    }

    /// Interprets an already-parsed JSON value as a client message.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut map) = value else {
            return Err(ProtocolError::UnknownType("<not an object>".into()));
        };
        let kind = match map.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return Err(ProtocolError::UnknownType("<missing>".into())),
        };
        let payload = match map.remove("payload") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(payload) => payload,
        };

        let msg = match kind.as_str() {
            "JOIN" => Self::Join(payload_of(&kind, payload)?),
            "VOTE_MODE" => {
                let VotePayload { mode } = payload_of(&kind, payload)?;
                Self::VoteMode { mode }
            }
            "START_GAME" => Self::StartGame,
            "RESTART_GAME" => Self::RestartGame,
            "EMOJI_EVENT" => {
                let EmojiPayload { emoji_code } = payload_of(&kind, payload)?;
                Self::EmojiEvent { emoji_code }
            }
            "GAME_ACTION" => Self::GameAction(payload_of(&kind, payload)?),
            _ => return Err(ProtocolError::UnknownType(kind)),
        };
        Ok(msg)
    }
}

fn payload_of<T: DeserializeOwned>(kind: &str, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload)
        .map_err(|e| ProtocolError::InvalidMessage(format!("{kind}: {e}")))
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Everything the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent only to the joining connection, before the room broadcast.
    PlayerJoined {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "isHost")]
        is_host: bool,
        room: RoomSnapshot,
    },

    /// The recipient's own redacted view of the room.
    RoomUpdate(RoomSnapshot),

    /// A reaction relayed to every connected member.
    EmojiEvent {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "emojiCode")]
        emoji_code: String,
        /// Unix milliseconds.
        timestamp: u64,
    },

    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
