use cardhall_cards::CardId;
use cardhall_protocol::{GameAction, GameView, PlayerId, Variant};
use rand::Rng;

use crate::{
    DurakGame, Engine, EngineConfig, OmahaGame, Rejection, SetupError, TimerFired, TimerRequest,
};

/// The game slot of a room.
///
/// Variant dispatch happens here and nowhere else: the room talks to a
/// `GameState` and never needs to know which rules are in play.
#[derive(Debug, Clone, Default)]
pub enum GameState {
    #[default]
    Unstarted,
    Durak(DurakGame),
    Omaha(OmahaGame),
}

impl GameState {
    /// Deals a new game of `variant` for `players` in seat order.
    pub fn start<R: Rng + ?Sized>(
        variant: Variant,
        serial: u64,
        players: &[PlayerId],
        config: EngineConfig,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        Ok(match variant {
            Variant::Durak => Self::Durak(DurakGame::new(serial, players, config, now_ms, rng)?),
            Variant::Omaha => Self::Omaha(OmahaGame::new(serial, players, config, now_ms, rng)?),
        })
    }

    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Unstarted)
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            Self::Unstarted => None,
            Self::Durak(_) => Some(Variant::Durak),
            Self::Omaha(_) => Some(Variant::Omaha),
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        action: &GameAction,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<(), Rejection> {
        match self {
            Self::Unstarted => Err(Rejection::NotStarted),
            Self::Durak(game) => game.apply(player, action, now_ms, rng),
            Self::Omaha(game) => game.apply(player, action, now_ms, rng),
        }
    }

    pub fn timer(&self) -> TimerRequest {
        match self {
            Self::Unstarted => TimerRequest::Idle,
            Self::Durak(game) => game.timer(),
            Self::Omaha(game) => game.timer(),
        }
    }

    pub fn on_timer<R: Rng + ?Sized>(
        &mut self,
        fired: TimerFired,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<(), Rejection> {
        match self {
            Self::Unstarted => Err(Rejection::NotStarted),
            Self::Durak(game) => game.on_timer(fired, now_ms, rng),
            Self::Omaha(game) => game.on_timer(fired, now_ms, rng),
        }
    }

    pub fn view(&self, viewer: &PlayerId) -> GameView {
        match self {
            Self::Unstarted => GameView::unstarted(),
            Self::Durak(game) => game.view(viewer),
            Self::Omaha(game) => game.view(viewer),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Self::Unstarted => false,
            Self::Durak(game) => game.is_finished(),
            Self::Omaha(game) => game.is_finished(),
        }
    }

    /// Card ids held by the running game; empty when unstarted.
    pub fn census(&self) -> Vec<CardId> {
        match self {
            Self::Unstarted => Vec::new(),
            Self::Durak(game) => game.census(),
            Self::Omaha(game) => game.census(),
        }
    }
}
