//! Omaha discard variant (vote value `"4"`).
//!
//! Nobody bets. Each player holds four hole cards and must throw one away
//! before each of the last two board cards is revealed:
//!
//! ```text
//! deal 4 each, burn 1, flop 3
//!   └─ discard-to-turn   every player discards 1 ─▶ burn 1, turn 1
//!        └─ discard-to-river  every player discards 1 ─▶ burn 1, river 1
//!             └─ showdown  best 5 of (0..=2 hole + board) wins
//! ```
//!
//! Each discard stage gives every player their own deadline. A periodic
//! sweep discards a random card for anyone who lets it pass.

use std::collections::BTreeMap;

use cardhall_cards::{best_hand, Card, CardId, Deck, HandScore};
use cardhall_protocol::{GameAction, GameView, HandView, OmahaStage, OmahaView, PlayerId, Variant};
use rand::Rng;

use crate::engine::{deal, Seat};
use crate::{Engine, EngineConfig, Rejection, SetupError, TimerFired, TimerRequest};

/// Hole cards dealt to each player.
pub const HOLE_CARDS: usize = 4;

/// Cards the deck must hold beyond the hole cards: three burns and five
/// board cards.
const BOARD_AND_BURNS: usize = 8;

#[derive(Debug, Clone)]
pub struct OmahaGame {
    serial: u64,
    config: EngineConfig,
    deck: Deck,
    seats: Vec<Seat>,
    burn: Vec<Card>,
    muck: Vec<Card>,
    board: Vec<Card>,
    stage: OmahaStage,
    /// Seat index to discard deadline (unix ms) for players yet to discard.
    pending: BTreeMap<usize, u64>,
    winners: Vec<PlayerId>,
    winning: Option<HandScore>,
}

impl OmahaGame {
    /// Shuffles a fresh deck and deals.
    pub fn new<R: Rng + ?Sized>(
        serial: u64,
        players: &[PlayerId],
        config: EngineConfig,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        Self::with_deck(serial, players, Deck::shuffled(rng), config, now_ms)
    }

    /// Deals from `deck` as given, top card first.
    pub fn with_deck(
        serial: u64,
        players: &[PlayerId],
        mut deck: Deck,
        config: EngineConfig,
        now_ms: u64,
    ) -> Result<Self, SetupError> {
        if players.len() < 2 {
            return Err(SetupError::TooFewPlayers(players.len()));
        }
        let needed = players.len() * HOLE_CARDS + BOARD_AND_BURNS;
        if deck.len() < needed {
            return Err(SetupError::DeckTooSmall {
                needed,
                available: deck.len(),
            });
        }

        let seats = deal(players, &mut deck, HOLE_CARDS);
        let mut game = Self {
            serial,
            config,
            deck,
            seats,
            burn: Vec::new(),
            muck: Vec::new(),
            board: Vec::new(),
            stage: OmahaStage::DiscardToTurn,
            pending: BTreeMap::new(),
            winners: Vec::new(),
            winning: None,
        };
        game.burn_and_reveal(3);
        game.open_stage(now_ms);

        tracing::debug!(game = serial, players = players.len(), "omaha dealt");
        Ok(game)
    }

    // -- accessors ---------------------------------------------------------

    pub fn stage(&self) -> OmahaStage {
        self.stage
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn hand(&self, player: &PlayerId) -> Option<&[Card]> {
        self.seat_of(player).map(|i| self.seats[i].hand.as_slice())
    }

    /// Players yet to discard this stage, in seat order.
    pub fn pending(&self) -> Vec<PlayerId> {
        self.pending
            .keys()
            .map(|&i| self.seats[i].player.clone())
            .collect()
    }

    pub fn deadline(&self, player: &PlayerId) -> Option<u64> {
        self.seat_of(player)
            .and_then(|i| self.pending.get(&i).copied())
    }

    pub fn winners(&self) -> &[PlayerId] {
        &self.winners
    }

    pub fn winning_score(&self) -> Option<&HandScore> {
        self.winning.as_ref()
    }

    pub fn burn_len(&self) -> usize {
        self.burn.len()
    }

    pub fn muck_len(&self) -> usize {
        self.muck.len()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    // -- stage machinery ---------------------------------------------------

    fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| &s.player == player)
    }

    fn burn_and_reveal(&mut self, reveal: usize) {
        self.burn.extend(self.deck.draw());
        for _ in 0..reveal {
            self.board.extend(self.deck.draw());
        }
    }

    /// Marks every seat pending with a fresh deadline.
    fn open_stage(&mut self, now_ms: u64) {
        let deadline = now_ms + self.config.discard_timeout_ms;
        self.pending = (0..self.seats.len()).map(|i| (i, deadline)).collect();
    }

    fn discard(&mut self, seat: usize, card_id: CardId, now_ms: u64) -> Result<(), Rejection> {
        if self.stage == OmahaStage::Showdown {
            return Err(Rejection::GameOver);
        }
        if !self.pending.contains_key(&seat) {
            return Err(Rejection::NotPending);
        }
        let card = self.seats[seat].take(card_id)?;
        self.muck.push(card);
        self.pending.remove(&seat);

        if self.pending.is_empty() {
            self.advance(now_ms);
        }
        Ok(())
    }

    fn advance(&mut self, now_ms: u64) {
        self.burn_and_reveal(1);
        match self.stage {
            OmahaStage::DiscardToTurn => {
                self.stage = OmahaStage::DiscardToRiver;
                self.open_stage(now_ms);
            }
            OmahaStage::DiscardToRiver => {
                self.stage = OmahaStage::Showdown;
                self.evaluate();
            }
            OmahaStage::Showdown => {}
        }
        tracing::debug!(game = self.serial, stage = ?self.stage, board = self.board.len(), "omaha advanced");
    }

    fn evaluate(&mut self) {
        let scores: Vec<(usize, HandScore)> = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(i, s)| best_hand(&s.hand, &self.board).map(|score| (i, score)))
            .collect();
        let Some(best) = scores.iter().map(|(_, score)| score).max().cloned() else {
            return;
        };
        self.winners = scores
            .iter()
            .filter(|(_, score)| *score == best)
            .map(|&(i, _)| self.seats[i].player.clone())
            .collect();
        self.winning = Some(best);
    }

    /// Auto-discards for every pending seat whose deadline has passed.
    fn sweep<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) -> Result<(), Rejection> {
        let due: Vec<usize> = self
            .pending
            .iter()
            .filter(|&(_, &deadline)| deadline <= now_ms)
            .map(|(&seat, _)| seat)
            .collect();

        let mut discarded = 0;
        for seat in due {
            // An earlier discard in this pass may have opened a new stage.
            if !self.pending.get(&seat).is_some_and(|&d| d <= now_ms) {
                continue;
            }
            let hand = &self.seats[seat].hand;
            if hand.is_empty() {
                continue;
            }
            let card_id = hand[rng.random_range(0..hand.len())].id;
            tracing::debug!(game = self.serial, player = %self.seats[seat].player, card = %card_id, "auto discard");
            self.discard(seat, card_id, now_ms)?;
            discarded += 1;
        }

        if discarded == 0 {
            return Err(Rejection::NothingDue);
        }
        Ok(())
    }
}

impl Engine for OmahaGame {
    fn apply<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        action: &GameAction,
        now_ms: u64,
        _rng: &mut R,
    ) -> Result<(), Rejection> {
        let GameAction::Discard { card_id } = *action else {
            return Err(Rejection::WrongVariant);
        };
        let seat = self.seat_of(player).ok_or(Rejection::NotSeated)?;
        self.discard(seat, card_id, now_ms)
    }

    fn timer(&self) -> TimerRequest {
        match self.stage {
            OmahaStage::Showdown => TimerRequest::Idle,
            _ => TimerRequest::Sweep,
        }
    }

    fn on_timer<R: Rng + ?Sized>(
        &mut self,
        fired: TimerFired,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<(), Rejection> {
        match fired {
            TimerFired::Sweep if self.stage == OmahaStage::Showdown => Err(Rejection::GameOver),
            TimerFired::Sweep => self.sweep(now_ms, rng),
            TimerFired::Alarm(_) => Err(Rejection::StaleTimer),
        }
    }

    fn view(&self, viewer: &PlayerId) -> GameView {
        GameView::Omaha(OmahaView {
            mode: Variant::Omaha,
            stage: self.stage,
            board: self.board.clone(),
            burn_count: self.burn.len(),
            muck_count: self.muck.len(),
            deck_count: self.deck.len(),
            pending_discards: self.pending(),
            discard_deadlines: self
                .pending
                .iter()
                .map(|(&i, &deadline)| (self.seats[i].player.clone(), deadline))
                .collect(),
            hands: self
                .seats
                .iter()
                .map(|s| HandView::redacted(&s.player, &s.hand, viewer))
                .collect(),
            winners: self.winners.clone(),
            winning_category: self.winning.as_ref().map(|score| score.category),
        })
    }

    fn is_finished(&self) -> bool {
        self.stage == OmahaStage::Showdown
    }

    fn census(&self) -> Vec<CardId> {
        self.deck
            .iter()
            .chain(self.seats.iter().flat_map(|s| s.hand.iter()))
            .chain(self.board.iter())
            .chain(self.burn.iter())
            .chain(self.muck.iter())
            .map(|c| c.id)
            .collect()
    }
}
