//! The contract every game variant implements.
//!
//! Engines are plain synchronous state machines. They never sleep, never
//! spawn, and never read the clock: the room actor passes `now_ms` in and
//! asks [`Engine::timer`] after every mutation which wake-up it should
//! schedule next. When that wake-up arrives it is handed back through
//! [`Engine::on_timer`], where the engine checks it still applies.

use cardhall_cards::CardId;
use cardhall_protocol::{GameAction, GameView, PlayerId};
use rand::Rng;

use crate::Rejection;

/// Turn and discard clocks, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long the Durak player on turn has before the round is forced.
    pub turn_timeout_ms: u64,
    /// How long each Omaha player has to discard in a stage.
    pub discard_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: 20_000,
            discard_timeout_ms: 20_000,
        }
    }
}

/// Identifies one arming of a one-shot timer.
///
/// `game` is the serial the room gave the game when it was dealt; `epoch`
/// increases every time the engine re-arms. A ticket that doesn't match
/// the engine's current one belongs to a superseded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket {
    pub game: u64,
    pub epoch: u64,
}

/// What the engine wants scheduled after the latest mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Nothing pending.
    Idle,
    /// Fire once at `at_ms` (unix milliseconds) with `ticket`.
    Alarm { at_ms: u64, ticket: TimerTicket },
    /// Poll on the room's fixed sweep interval.
    Sweep,
}

/// A wake-up delivered back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFired {
    Alarm(TimerTicket),
    Sweep,
}

/// A game variant's rules.
pub trait Engine {
    /// Applies a player's move, or explains why it was refused.
    fn apply<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        action: &GameAction,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<(), Rejection>;

    /// The wake-up the current state needs.
    fn timer(&self) -> TimerRequest;

    /// Handles a wake-up. Stale or pointless wake-ups are refused.
    fn on_timer<R: Rng + ?Sized>(
        &mut self,
        fired: TimerFired,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<(), Rejection>;

    /// The state as `viewer` may see it.
    fn view(&self, viewer: &PlayerId) -> GameView;

    /// Whether the game reached its terminal state.
    fn is_finished(&self) -> bool;

    /// Every card id the game currently holds, wherever it lies.
    fn census(&self) -> Vec<CardId>;
}

/// A player's place at the table and the cards they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Seat {
    pub(crate) player: PlayerId,
    pub(crate) hand: Vec<cardhall_cards::Card>,
}

impl Seat {
    /// Removes and returns the card with `id`.
    pub(crate) fn take(&mut self, id: CardId) -> Result<cardhall_cards::Card, Rejection> {
        let pos = self
            .hand
            .iter()
            .position(|c| c.id == id)
            .ok_or(Rejection::CardNotInHand(id))?;
        Ok(self.hand.remove(pos))
    }

    pub(crate) fn peek(&self, id: CardId) -> Result<cardhall_cards::Card, Rejection> {
        self.hand
            .iter()
            .find(|c| c.id == id)
            .copied()
            .ok_or(Rejection::CardNotInHand(id))
    }
}

/// Seats `players` in order and deals `per_player` cards round-robin.
pub(crate) fn deal(
    players: &[PlayerId],
    deck: &mut cardhall_cards::Deck,
    per_player: usize,
) -> Vec<Seat> {
    let mut hands = vec![Vec::new(); players.len()];
    deck.deal_round_robin(&mut hands, per_player);
    players
        .iter()
        .cloned()
        .zip(hands)
        .map(|(player, hand)| Seat { player, hand })
        .collect()
}
