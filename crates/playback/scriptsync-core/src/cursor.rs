//! Forward-only keyframe cursor.
//!
//! `index` points at the upcoming (target) keyframe and `prev` is the start of
//! the segment being interpolated. After a reset `prev` is a synthetic
//! keyframe placed at the restart point, so it need not equal
//! `timeline[index - 1]`. Scripts are walked strictly forward; seeks go
//! through [`Cursor::reset`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{Keyframe, Timeline, NEUTRAL_POS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceResult {
    /// Still tracking between `prev` and the target keyframe.
    Continue,
    /// Past the last keyframe; hold the last value.
    Stopped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cursor {
    index: usize,
    prev: Keyframe,
    /// Timeline index of `prev` when it is a real keyframe.
    prev_index: Option<usize>,
    offset_ms: i64,
}

impl Cursor {
    pub fn new(timeline: &Timeline, at_ms: i64, offset_ms: i64, last_pos: Option<f64>) -> Self {
        let mut cursor = Self {
            index: 0,
            prev: Keyframe::new(at_ms, NEUTRAL_POS),
            prev_index: None,
            offset_ms,
        };
        cursor.reset(timeline, at_ms, offset_ms, last_pos);
        cursor
    }

    /// Restart at logical time `at_ms`.
    ///
    /// The target becomes the first keyframe whose shifted time is not before
    /// `at_ms`; the segment start is synthesized at `at_ms` holding
    /// `last_pos` (or the neutral position when nothing was output yet). A
    /// keyframe sitting exactly on `at_ms` is consumed by the first advance and
    /// becomes the real segment start.
    pub fn reset(&mut self, timeline: &Timeline, at_ms: i64, offset_ms: i64, last_pos: Option<f64>) {
        self.offset_ms = offset_ms;
        self.index = timeline
            .keyframes()
            .iter()
            .position(|k| k.at.saturating_add(offset_ms) >= at_ms)
            .unwrap_or(timeline.len());
        // Stored in script time so that, once shifted, it sits at `at_ms`.
        self.prev = Keyframe::new(
            at_ms.saturating_sub(offset_ms),
            last_pos.unwrap_or(NEUTRAL_POS),
        );
        self.prev_index = None;
        debug!(at_ms, offset_ms, index = self.index, "cursor reset");
    }

    /// Move the target forward until it lies after `t_ms`.
    pub fn advance(&mut self, timeline: &Timeline, t_ms: i64) -> AdvanceResult {
        loop {
            let Some(target) = timeline.get(self.index) else {
                return AdvanceResult::Stopped;
            };
            if t_ms < target.at.saturating_add(self.offset_ms) {
                return AdvanceResult::Continue;
            }
            self.prev = target;
            self.prev_index = Some(self.index);
            self.index += 1;
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn prev(&self) -> Keyframe {
        self.prev
    }

    #[inline]
    pub fn prev_index(&self) -> Option<usize> {
        self.prev_index
    }

    #[inline]
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    #[inline]
    pub fn target(&self, timeline: &Timeline) -> Option<Keyframe> {
        timeline.get(self.index)
    }

    #[inline]
    pub fn is_at_end(&self, timeline: &Timeline) -> bool {
        self.index >= timeline.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tl(points: &[(i64, f64)]) -> Timeline {
        Timeline::from_keyframes(points.iter().map(|&(at, pos)| Keyframe::new(at, pos)).collect())
    }

    #[test]
    fn reset_targets_first_keyframe_not_before_restart() {
        let timeline = tl(&[(0, 0.0), (100, 50.0), (200, 100.0)]);
        let cursor = Cursor::new(&timeline, 150, 0, None);
        assert_eq!(cursor.index(), 2);
        let cursor = Cursor::new(&timeline, 100, 0, None);
        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.prev(), Keyframe::new(100, NEUTRAL_POS));
        assert_eq!(cursor.prev_index(), None);
    }

    #[test]
    fn keyframe_on_restart_point_becomes_segment_start() {
        let timeline = tl(&[(0, 0.0), (1_000, 100.0)]);
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.advance(&timeline, 0), AdvanceResult::Continue);
        assert_eq!(cursor.prev(), Keyframe::new(0, 0.0));
        assert_eq!(cursor.prev_index(), Some(0));
    }

    #[test]
    fn reset_applies_offset_and_last_pos() {
        let timeline = tl(&[(0, 0.0), (1_000, 100.0)]);
        let cursor = Cursor::new(&timeline, 850, -200, Some(12.0));
        // 1000 - 200 = 800 <= 850, so the target is past the end.
        assert_eq!(cursor.index(), 2);
        assert!(cursor.is_at_end(&timeline));
        let cursor = Cursor::new(&timeline, 700, -200, Some(12.0));
        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.prev(), Keyframe::new(900, 12.0));
    }

    #[test]
    fn advance_skips_several_keyframes_in_one_call() {
        let timeline = tl(&[(0, 0.0), (10, 10.0), (20, 20.0), (30, 30.0), (400, 0.0)]);
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.advance(&timeline, 35), AdvanceResult::Continue);
        assert_eq!(cursor.index(), 4);
        assert_eq!(cursor.prev(), Keyframe::new(30, 30.0));
        assert_eq!(cursor.prev_index(), Some(3));
    }

    #[test]
    fn advance_stops_at_end() {
        let timeline = tl(&[(0, 0.0), (100, 100.0)]);
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        assert_eq!(cursor.advance(&timeline, 99), AdvanceResult::Continue);
        assert_eq!(cursor.advance(&timeline, 100), AdvanceResult::Stopped);
        assert_eq!(cursor.prev(), Keyframe::new(100, 100.0));
        // Stays stopped.
        assert_eq!(cursor.advance(&timeline, 5_000), AdvanceResult::Stopped);
    }

    #[test]
    fn single_keyframe_timeline() {
        let timeline = tl(&[(500, 80.0)]);
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        assert_eq!(cursor.advance(&timeline, 250), AdvanceResult::Continue);
        assert_eq!(cursor.advance(&timeline, 500), AdvanceResult::Stopped);
    }

    #[test]
    fn index_never_decreases_while_advancing() {
        let timeline = tl(&(0..50).map(|i| (i * 37, (i % 7) as f64 * 10.0)).collect::<Vec<_>>());
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        let mut last = cursor.index();
        for t in (0..2_000).step_by(13) {
            cursor.advance(&timeline, t);
            assert!(cursor.index() >= last);
            last = cursor.index();
        }
    }
}
