//! Wire protocol for Cardhall.
//!
//! Every frame on the wire is a UTF-8 JSON object `{type, payload}`.
//! This crate defines:
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`GameAction`]):
//!   what clients send and what the server sends back.
//! - **Views** ([`RoomSnapshot`], [`GameView`], ...): the per-player
//!   redacted room state carried by `ROOM_UPDATE`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes to values and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding,
//!   and which `ERROR` text the client sees for it.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room actor
//! ```

mod codec;
mod error;
mod types;
mod view;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameAction, JoinRequest, PlayerId, RoomCode, ServerMessage, Variant,
};
pub use view::{
    DurakPhase, DurakView, GameView, HandView, OmahaStage, OmahaView, PlayerSummary,
    RoomSnapshot, TablePair, UnstartedView, VoteCounts,
};
