//! Rooms for Cardhall.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, votes, game and timers.
//!
//! # Key types
//!
//! - [`RoomManager`]: finds or creates rooms by code
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`Link`]: a member's connection as the room sees it
//! - [`VoteTally`]: variant votes and the majority rule
//! - [`RoomConfig`]: capacity, clocks and grace period

mod config;
mod error;
mod manager;
mod room;
mod vote;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{Joined, Link, PlayerSender, RoomHandle, RoomInfo};
pub use vote::VoteTally;
