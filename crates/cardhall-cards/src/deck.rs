//! The deck: an ordered pile that is drawn from the front.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Card, CardId, Suit, RANKS};

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// Builds the 52 cards in construction order (suits H, D, C, S; ranks 2..14).
pub fn standard_cards() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    let mut next_id = 0u8;
    for suit in Suit::ALL {
        for rank in RANKS {
            cards.push(Card {
                id: CardId(next_id),
                suit,
                rank,
            });
            next_id += 1;
        }
    }
    cards
}

/// A draw pile. The front is the top of the pile; the back is the bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// A full deck in construction order.
    pub fn standard() -> Self {
        Self::from_cards(standard_cards())
    }

    /// A full deck shuffled with `rng` (Fisher-Yates via `SliceRandom`).
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = standard_cards();
        cards.shuffle(rng);
        Self::from_cards(cards)
    }

    /// A deck with an explicit order, front first. Used for scripted games.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    /// Takes the top card, if any.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    /// Deals `rounds` cards to each hand, one card per hand per round.
    ///
    /// Stops quietly when the deck runs out.
    pub fn deal_round_robin(&mut self, hands: &mut [Vec<Card>], rounds: usize) {
        for _ in 0..rounds {
            for hand in hands.iter_mut() {
                match self.draw() {
                    Some(card) => hand.push(card),
                    None => return,
                }
            }
        }
    }

    /// The card at the bottom of the pile.
    pub fn bottom(&self) -> Option<&Card> {
        self.cards.back()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterates top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}
