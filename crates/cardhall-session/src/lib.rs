//! Room membership for Cardhall.
//!
//! This crate answers "who is in the room" without knowing anything about
//! sockets or games:
//!
//! 1. **Admission**: new players get a fresh id, up to the room capacity
//! 2. **Reconnection**: a returning player presents their old id and is
//!    rebound to the new connection, keeping seat and host flag
//! 3. **Grace**: a dropped connection leaves the member in place as
//!    disconnected until the room expires them
//! 4. **Host election**: the first joiner hosts; when the host leaves, the
//!    earliest remaining member takes over
//!
//! # How it fits in the stack
//!
//! ```text
//! Room actor (above)  ← owns one Roster per room, schedules grace expiry
//!     ↕
//! Session layer (this crate)  ← membership, presence, host
//!     ↕
//! Protocol layer (below)  ← PlayerId
//! ```

mod error;
mod roster;

pub use error::SessionError;
pub use roster::{generate_player_id, Admission, Member, Presence, Roster, DEFAULT_NAME};
