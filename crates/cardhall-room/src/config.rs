//! Room configuration.

use std::time::Duration;

use cardhall_game::EngineConfig;
use serde::{Deserialize, Serialize};

/// Settings shared by every room a manager creates.
///
/// The defaults are the house rules; tests shorten or seed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Most members a room holds, connected or inside their grace period.
    pub capacity: usize,

    /// Members needed before the host can start a game.
    pub min_players: usize,

    /// Durak turn clock.
    pub turn_timeout: Duration,

    /// Omaha per-player discard clock.
    pub discard_timeout: Duration,

    /// How often overdue Omaha discards are swept.
    pub sweep_interval: Duration,

    /// How long a disconnected member keeps their place.
    pub reconnect_grace: Duration,

    /// Bound of each room's command channel.
    pub channel_size: usize,

    /// Seeds every room's RNG when set. Unset rooms draw from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            min_players: 2,
            turn_timeout: Duration::from_secs(20),
            discard_timeout: Duration::from_secs(20),
            sweep_interval: Duration::from_secs(1),
            reconnect_grace: Duration::from_secs(60),
            channel_size: 64,
            rng_seed: None,
        }
    }
}

impl RoomConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            turn_timeout_ms: self.turn_timeout.as_millis() as u64,
            discard_timeout_ms: self.discard_timeout.as_millis() as u64,
        }
    }
}
