//! Wall clocks feeding the engine's millisecond timestamps.

use tokio::time::Instant;

/// Monotonic wall time in milliseconds.
pub trait WallClock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Milliseconds elapsed since construction, on tokio's clock.
///
/// Follows `tokio::time::pause`/`advance`, so tests with paused time see
/// exact, repeatable timestamps.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    epoch: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for TokioClock {
    #[inline]
    fn now_ms(&self) -> i64 {
        self.epoch.elapsed().as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.now_ms(), 0);
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(clock.now_ms(), 250);
    }
}
