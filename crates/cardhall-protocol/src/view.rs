//! Room snapshots: the per-recipient view carried by `ROOM_UPDATE`.
//!
//! A snapshot is rendered separately for every connected player. Hands
//! are listed for everyone with a card count, but only the recipient's
//! own entry carries the actual cards.

use std::collections::BTreeMap;

use cardhall_cards::{Card, HandCategory, Suit};
use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomCode, Variant};

/// One player's view of a whole room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host_id: Option<PlayerId>,
    /// The recipient.
    pub player_id: PlayerId,
    /// Unix milliseconds.
    pub created_at: u64,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    pub votes: VoteCounts,
    pub player_count: usize,
    pub game_state: GameView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    /// `false` while the player is inside the reconnection grace window.
    pub connected: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub votes4: usize,
    pub votes6: usize,
}

/// The game part of a snapshot.
///
/// Untagged: an unstarted room is `{"started": false}`, a running game is
/// its variant's view (which carries `mode`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameView {
    Unstarted(UnstartedView),
    Durak(DurakView),
    Omaha(OmahaView),
}

impl GameView {
    pub fn unstarted() -> Self {
        Self::Unstarted(UnstartedView { started: false })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstartedView {
    pub started: bool,
}

/// A hand as seen by one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandView {
    pub player_id: PlayerId,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
}

impl HandView {
    /// Reveals `cards` only when `owner` is the `viewer`.
    pub fn redacted(owner: &PlayerId, cards: &[Card], viewer: &PlayerId) -> Self {
        Self {
            player_id: owner.clone(),
            count: cards.len(),
            cards: (owner == viewer).then(|| cards.to_vec()),
        }
    }
}

// ---------------------------------------------------------------------------
// Durak
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurakPhase {
    Attack,
    Defend,
    Complete,
}

/// One attack card on the table and the card that beat it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePair {
    pub attack: Card,
    pub defense: Option<Card>,
}

impl TablePair {
    pub fn open(attack: Card) -> Self {
        Self {
            attack,
            defense: None,
        }
    }

    pub fn is_defended(&self) -> bool {
        self.defense.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurakView {
    pub mode: Variant,
    pub phase: DurakPhase,
    pub attacker_id: Option<PlayerId>,
    pub defender_id: Option<PlayerId>,
    pub trump_suit: Suit,
    /// Display copy of the card lying face up under the deck.
    pub trump_card: Card,
    pub deck_count: usize,
    pub discard_count: usize,
    pub table: Vec<TablePair>,
    pub hands: Vec<HandView>,
    pub transfer_occurred: bool,
    pub max_attacks: usize,
    pub durak_loser_id: Option<PlayerId>,
    pub turn: Option<PlayerId>,
    /// Unix milliseconds.
    pub turn_deadline: Option<u64>,
}

// ---------------------------------------------------------------------------
// Omaha
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OmahaStage {
    DiscardToTurn,
    DiscardToRiver,
    Showdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmahaView {
    pub mode: Variant,
    pub stage: OmahaStage,
    pub board: Vec<Card>,
    pub burn_count: usize,
    pub muck_count: usize,
    pub deck_count: usize,
    pub pending_discards: Vec<PlayerId>,
    /// Unix milliseconds per pending player.
    pub discard_deadlines: BTreeMap<PlayerId, u64>,
    pub hands: Vec<HandView>,
    pub winners: Vec<PlayerId>,
    pub winning_category: Option<HandCategory>,
}
