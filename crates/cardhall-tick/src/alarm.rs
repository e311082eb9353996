//! One-shot alarm.

use tokio::time::{self, Instant};

/// A single pending wake-up that carries a key back to the caller.
///
/// Re-arming replaces whatever was pending. Once [`wait`](Self::wait)
/// resolves the alarm is disarmed, so the same key is never delivered
/// twice.
#[derive(Debug)]
pub struct Alarm<K> {
    armed: Option<(Instant, K)>,
}

impl<K> Default for Alarm<K> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<K: Clone> Alarm<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, at: Instant, key: K) {
        self.armed = Some((at, key));
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|(at, _)| *at)
    }

    /// Resolves with the key at the deadline. Pends forever while disarmed.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// alarm armed.
    pub async fn wait(&mut self) -> K {
        let Some((at, key)) = self.armed.clone() else {
            return std::future::pending().await;
        };
        time::sleep_until(at).await;
        self.armed = None;
        key
    }
}
