//! Rule engines for the card games a Cardhall room can play.
//!
//! - **Durak** ([`DurakGame`]): attack, defend, transfer and take, played
//!   until one player is left holding cards.
//! - **Omaha** ([`OmahaGame`]): four hole cards, two forced discards, best
//!   five-card hand at showdown.
//!
//! Both implement [`Engine`], and [`GameState`] wraps them for the room.
//! Engines are deterministic given the injected RNG and the `now_ms` they
//! are handed, which is what the tests rely on.

mod durak;
mod engine;
mod error;
mod omaha;
mod state;

pub use durak::{beats, DurakGame, HAND_SIZE, MAX_ATTACKS, MAX_ATTACKS_AFTER_TRANSFER};
pub use engine::{Engine, EngineConfig, TimerFired, TimerRequest, TimerTicket};
pub use error::{Rejection, SetupError};
pub use omaha::{OmahaGame, HOLE_CARDS};
pub use state::GameState;
