//! The card itself.
//!
//! A card is an immutable `{id, suit, rank}` triple. The `id` is what
//! clients send back when they play a card; suit and rank are what the
//! rules look at.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric rank of an ace. Aces are always high except in the wheel.
pub const ACE: u8 = 14;

/// All ranks in ascending order, two through ace.
pub const RANKS: std::ops::RangeInclusive<u8> = 2..=ACE;

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// One of the four French suits.
///
/// Serialized as the single letter clients expect (`"H"`, `"D"`, `"C"`,
/// `"S"`). Declaration order is the canonical suit order used for deck
/// construction and hand sorting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Suit {
    #[serde(rename = "H")]
    Hearts,
    #[serde(rename = "D")]
    Diamonds,
    #[serde(rename = "C")]
    Clubs,
    #[serde(rename = "S")]
    Spades,
}

impl Suit {
    /// Suits in deck-construction order.
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    /// Position of this suit in [`Suit::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Spades => "♠",
        };
        f.write_str(symbol)
    }
}

// ---------------------------------------------------------------------------
// CardId / Card
// ---------------------------------------------------------------------------

/// Stable identifier of a card inside one 52-card deck (`0..=51`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u8);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub suit: Suit,
    pub rank: u8,
}

impl Card {
    /// Builds the card that occupies `id` in a freshly constructed deck.
    ///
    /// Ids run through the suits in [`Suit::ALL`] order, thirteen ranks
    /// each, so `0` is the two of hearts and `51` the ace of spades.
    /// Returns `None` for ids outside the deck.
    pub fn from_id(id: CardId) -> Option<Self> {
        let raw = id.0 as usize;
        let suit = *Suit::ALL.get(raw / 13)?;
        let rank = (raw % 13) as u8 + 2;
        Some(Self { id, suit, rank })
    }

    /// Whether this card belongs to `trump`.
    pub fn is_trump(&self, trump: Suit) -> bool {
        self.suit == trump
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self.rank {
            ACE => "A".to_string(),
            13 => "K".to_string(),
            12 => "Q".to_string(),
            11 => "J".to_string(),
            r => r.to_string(),
        };
        write!(f, "{rank}{}", self.suit)
    }
}
