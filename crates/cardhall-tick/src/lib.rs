//! Timekeeping for Cardhall rooms.
//!
//! Three pieces, all driven by Tokio time so paused-clock tests behave:
//!
//! - [`RoomClock`]: unix-millisecond timestamps anchored to a Tokio
//!   instant, used for every deadline a client sees.
//! - [`Alarm`]: a one-shot wake-up carrying a key (the Durak turn timer).
//! - [`TickScheduler`]: a fixed-rate tick with pause/resume (the Omaha
//!   discard sweep).
//!
//! # Integration
//!
//! Both timers pend forever when idle, so they sit directly inside a room
//! actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         ticket = alarm.wait() => { /* turn timeout */ }
//!         _ = sweep.wait_for_tick() => { /* discard deadlines */ }
//!     }
//! }
//! ```

mod alarm;
mod clock;

pub use alarm::Alarm;
pub use clock::RoomClock;

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = never ticks.
    pub tick_rate_hz: u32,
    /// Random jitter (0–max µs) added to the first tick so rooms created
    /// together do not sweep in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 0,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// A config ticking once per `period`, rounded to whole Hz (at least 1).
    pub fn with_period(period: Duration) -> Self {
        let hz = (1.0 / period.as_secs_f64()).round().max(1.0) as u32;
        Self::with_rate(hz)
    }

    /// Caps `tick_rate_hz` at [`Self::MAX_TICK_RATE_HZ`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self
    }

    /// Duration of a single tick. `None` when the rate is 0.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }
}

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Starts at 1 and never resets, not even across pauses.
    pub tick: u64,
    /// `true` if the tick fired more than 10% late.
    pub overrun: bool,
    /// Whole periods skipped because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-rate tick for a single room. Late ticks are never replayed; the
/// schedule restarts from the moment the tick actually fired.
pub struct TickScheduler {
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<TokioInstant>,
    paused: bool,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                let us = rand::rng().random_range(0..config.initial_jitter_us);
                Duration::from_micros(us)
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + d + jitter
        });

        debug!(rate_hz = config.tick_rate_hz, "tick scheduler created");

        Self {
            tick_duration,
            tick_count: 0,
            next_tick,
            paused: false,
        }
    }

    /// A scheduler that starts paused; nothing fires until [`resume`](Self::resume).
    pub fn paused(config: TickConfig) -> Self {
        let mut scheduler = Self::new(config);
        scheduler.paused = true;
        scheduler
    }

    /// Waits until the next tick is due.
    ///
    /// With a rate of 0 or while paused this future pends forever, so
    /// `tokio::select!` keeps serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, tick_dur) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(dur)) if !self.paused => (next, dur),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > tick_dur / 10;
        let ticks_skipped = if overrun {
            late_by.as_nanos() as u64 / tick_dur.as_nanos() as u64
        } else {
            0
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }
        self.next_tick = Some(now + tick_dur);

        trace!(tick = self.tick_count, overrun, "tick fired");
        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resumes with the next tick one full period from now, so time spent
    /// paused never produces a burst of ticks.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(dur) = self.tick_duration {
                self.next_tick = Some(TokioInstant::now() + dur);
            }
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Pauses or resumes to match `running`.
    pub fn set_running(&mut self, running: bool) {
        if running {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}
