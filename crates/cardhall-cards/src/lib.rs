//! Card primitives for Cardhall.
//!
//! This crate is the leaf of the workspace. It knows nothing about rooms,
//! players, or sockets; it only knows what a card is and how to compare
//! poker hands.
//!
//! - **Cards** ([`Card`], [`CardId`], [`Suit`]): the 52 immutable cards.
//! - **Deck** ([`Deck`]): construction, shuffling, and drawing from the front.
//! - **Evaluator** ([`HandScore`], [`best_hand`]): five-card ranking and
//!   best-of-combinations selection over hole and board cards.

mod card;
mod deck;
mod eval;

pub use card::{Card, CardId, Suit, ACE, RANKS};
pub use deck::{standard_cards, Deck, DECK_SIZE};
pub use eval::{best_hand, combinations, score_five, HandCategory, HandScore};
