//! Playback clock extrapolation.
//!
//! The host reports its logical playback time at irregular intervals (about
//! once per animation frame). Between samples the tick loop still needs a
//! position, so the clock projects the rate observed between the last two
//! samples forward from the newest one. Without a usable rate (right after
//! `reset`, or after a discontinuity) it assumes 1x playback.

use tracing::debug;

/// One (wall, logical) observation, both in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Sample {
    wall: i64,
    logical: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackClock {
    last: Sample,
    prev: Sample,
    jump_threshold_ms: Option<i64>,
}

impl PlaybackClock {
    pub fn new(at_ms: i64, now_wall_ms: i64) -> Self {
        let mut clock = Self::default();
        clock.reset(at_ms, now_wall_ms);
        clock
    }

    /// Treat samples drifting more than `threshold_ms` from wall time as a jump.
    pub fn with_jump_threshold(mut self, threshold_ms: i64) -> Self {
        self.jump_threshold_ms = Some(threshold_ms);
        self
    }

    pub fn set_jump_threshold(&mut self, threshold_ms: i64) {
        self.jump_threshold_ms = Some(threshold_ms);
    }

    /// Collapse both samples onto `at_ms` so rate estimation restarts cleanly.
    pub fn reset(&mut self, at_ms: i64, now_wall_ms: i64) {
        let s = Sample {
            wall: now_wall_ms,
            logical: at_ms,
        };
        self.last = s;
        self.prev = s;
    }

    /// Record a host sample, shifting the current sample into `prev`.
    ///
    /// Returns `true` when the sample was treated as a discontinuity, in which
    /// case rate estimation restarts from this sample.
    pub fn sync(&mut self, logical_ms: i64, now_wall_ms: i64) -> bool {
        if self.is_discontinuity(logical_ms, now_wall_ms) {
            debug!(
                from_ms = self.last.logical,
                to_ms = logical_ms,
                "clock discontinuity; restarting rate estimation"
            );
            self.reset(logical_ms, now_wall_ms);
            return true;
        }
        self.prev = self.last;
        self.last = Sample {
            wall: now_wall_ms,
            logical: logical_ms,
        };
        false
    }

    fn is_discontinuity(&self, logical_ms: i64, now_wall_ms: i64) -> bool {
        let d_logical = logical_ms.saturating_sub(self.last.logical);
        if d_logical < 0 {
            return true;
        }
        match self.jump_threshold_ms {
            Some(threshold) => {
                let d_wall = now_wall_ms.saturating_sub(self.last.wall);
                d_logical.saturating_sub(d_wall).saturating_abs() > threshold
            }
            None => false,
        }
    }

    /// Estimated logical time at `now_wall_ms`.
    pub fn extrapolate(&self, now_wall_ms: i64) -> i64 {
        let now_delta = now_wall_ms.saturating_sub(self.last.wall);
        let prev_wall_delta = self.last.wall.saturating_sub(self.prev.wall);
        let prev_logical_delta = self.last.logical.saturating_sub(self.prev.logical);
        if prev_wall_delta == 0 || prev_logical_delta == 0 {
            return self.last.logical.saturating_add(now_delta);
        }
        let rate = prev_logical_delta as f64 / prev_wall_delta as f64;
        self.last
            .logical
            .saturating_add((now_delta as f64 * rate).trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_rate_without_history() {
        let clock = PlaybackClock::new(1_000, 50);
        assert_eq!(clock.extrapolate(50), 1_000);
        assert_eq!(clock.extrapolate(300), 1_250);
    }

    #[test]
    fn projects_observed_rate() {
        let mut clock = PlaybackClock::new(0, 0);
        // Host plays at half speed.
        assert!(!clock.sync(100, 200));
        assert_eq!(clock.extrapolate(300), 150);
        assert_eq!(clock.extrapolate(201), 100);
    }

    #[test]
    fn stalled_host_falls_back_to_unit_rate() {
        let mut clock = PlaybackClock::new(500, 0);
        clock.sync(500, 100);
        // Same logical time twice: no rate signal.
        assert_eq!(clock.extrapolate(150), 550);
    }

    #[test]
    fn backward_sample_resets_rate() {
        let mut clock = PlaybackClock::new(0, 0);
        clock.sync(2_000, 1_000);
        assert!(clock.sync(100, 1_100));
        assert_eq!(clock.extrapolate(1_150), 150);
    }

    #[test]
    fn forward_jump_beyond_threshold_resets_rate() {
        let mut clock = PlaybackClock::new(0, 0).with_jump_threshold(1_000);
        clock.sync(100, 100);
        assert!(clock.sync(60_000, 200));
        assert_eq!(clock.extrapolate(210), 60_010);
        // Small drift is a normal sample.
        assert!(!clock.sync(60_150, 300));
    }

    #[test]
    fn reset_discards_stale_rate() {
        let mut clock = PlaybackClock::new(0, 0);
        clock.sync(200, 100);
        clock.reset(5_000, 1_000);
        assert_eq!(clock.extrapolate(1_100), 5_100);
    }
}
