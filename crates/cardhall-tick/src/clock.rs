//! Wall-clock milliseconds that follow Tokio time.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Maps between unix milliseconds and Tokio instants for one room.
///
/// The clock reads the system time once, at construction, and from then
/// on advances with `tokio::time::Instant`. Deadlines computed from
/// [`now_ms`](Self::now_ms) therefore line up exactly with sleeps started
/// from [`instant_at`](Self::instant_at), including under a paused test
/// runtime.
#[derive(Debug, Clone, Copy)]
pub struct RoomClock {
    origin: Instant,
    origin_ms: u64,
}

impl RoomClock {
    pub fn new() -> Self {
        let origin_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::starting_at(origin_ms)
    }

    /// A clock whose current reading is `origin_ms`.
    pub fn starting_at(origin_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            origin_ms,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.origin_ms + self.origin.elapsed().as_millis() as u64
    }

    /// The instant at which [`now_ms`](Self::now_ms) reads `at_ms`.
    /// Times in the past map to the clock's origin or later.
    pub fn instant_at(&self, at_ms: u64) -> Instant {
        self.origin + Duration::from_millis(at_ms.saturating_sub(self.origin_ms))
    }
}

impl Default for RoomClock {
    fn default() -> Self {
        Self::new()
    }
}
