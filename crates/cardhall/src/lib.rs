//! # Cardhall
//!
//! A multiplayer card-room server. Players join rooms by code over
//! WebSocket, vote for a game (Durak or Omaha) and play it against the
//! server-authoritative engines in `cardhall-game`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardhall::prelude::*;
//!
//! # async fn start() -> Result<(), CardhallError> {
//! let server = CardhallServer::builder()
//!     .bind("127.0.0.1:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::CardhallError;
pub use server::{CardhallServer, CardhallServerBuilder};

/// The types most embedders and tests need.
pub mod prelude {
    pub use cardhall_protocol::{ClientMessage, GameAction, PlayerId, RoomCode, ServerMessage};
    pub use cardhall_room::RoomConfig;

    pub use crate::{CardhallError, CardhallServer, CardhallServerBuilder, ServerConfig};
}
