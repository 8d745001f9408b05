//! Six-point interpolation stencil with boundary extrapolation.
//!
//! Layout: `[p-2, p-1, p0, p1, p2, p3]` where `[p0, p1]` is the segment under
//! evaluation. Times are shifted by the cursor offset. Neighbours missing at
//! the timeline boundaries are synthesized by mirroring the adjacent spacing
//! and holding the nearest real position:
//!
//! ```text
//! p-1 = (p0.t - (p1.t - p0.t),  p0.pos)     p2 = (p1.t + (p1.t - p0.t), p1.pos)
//! p-2 = (p-1.t - (p0.t - p-1.t), p-1.pos)   p3 = (p2.t + (p2.t - p1.t), p2.pos)
//! ```

use crate::cursor::Cursor;
use crate::data::{Keyframe, Timeline};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilPoint {
    /// Shifted time in ms.
    pub t: f64,
    pub pos: f64,
}

impl StencilPoint {
    #[inline]
    fn shifted(k: Keyframe, offset_ms: i64) -> Self {
        Self {
            t: k.at.saturating_add(offset_ms) as f64,
            pos: k.pos,
        }
    }

    /// Mirror `from` across `self`, keeping `self`'s position.
    #[inline]
    fn mirrored(self, from: StencilPoint) -> Self {
        Self {
            t: self.t + (self.t - from.t),
            pos: self.pos,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stencil {
    pub points: [StencilPoint; 6],
}

impl Stencil {
    /// Build the stencil around the cursor's current segment.
    ///
    /// Returns `None` when the cursor has no target (past the end).
    pub fn around(timeline: &Timeline, cursor: &Cursor) -> Option<Self> {
        let offset = cursor.offset_ms();
        let target = cursor.target(timeline)?;
        let index = cursor.index() as isize;
        let p0 = StencilPoint::shifted(cursor.prev(), offset);
        let p1 = StencilPoint::shifted(target, offset);

        // Real neighbours before p0: before the real start keyframe, or before
        // the target when p0 is synthetic.
        let before = cursor
            .prev_index()
            .map(|i| i as isize - 1)
            .unwrap_or(index - 1);
        let real = |i: isize| timeline.get_signed(i).map(|k| StencilPoint::shifted(k, offset));

        let pm1 = real(before).unwrap_or_else(|| p0.mirrored(p1));
        let pm2 = real(before - 1).unwrap_or_else(|| pm1.mirrored(p0));
        let pp1 = real(index + 1).unwrap_or_else(|| p1.mirrored(p0));
        let pp2 = real(index + 2).unwrap_or_else(|| pp1.mirrored(p1));

        Some(Self {
            points: [pm2, pm1, p0, p1, pp1, pp2],
        })
    }

    /// Build from explicit points, used by tests and tooling.
    pub fn from_points(points: [(f64, f64); 6]) -> Self {
        Self {
            points: points.map(|(t, pos)| StencilPoint { t, pos }),
        }
    }

    #[inline]
    pub fn p0(&self) -> StencilPoint {
        self.points[2]
    }

    #[inline]
    pub fn p1(&self) -> StencilPoint {
        self.points[3]
    }

    pub fn times(&self) -> [f64; 6] {
        self.points.map(|p| p.t)
    }

    pub fn positions(&self) -> [f64; 6] {
        self.points.map(|p| p.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tl(points: &[(i64, f64)]) -> Timeline {
        Timeline::from_keyframes(points.iter().map(|&(at, pos)| Keyframe::new(at, pos)).collect())
    }

    #[test]
    fn synthesizes_outer_points_on_two_keyframe_script() {
        let timeline = tl(&[(0, 0.0), (1_000, 100.0)]);
        let mut cursor = Cursor::new(&timeline, -10, 0, None);
        cursor.advance(&timeline, 5);
        assert_eq!(cursor.prev_index(), Some(0));
        let s = Stencil::around(&timeline, &cursor).unwrap();
        assert_eq!(s.times(), [-2_000.0, -1_000.0, 0.0, 1_000.0, 2_000.0, 3_000.0]);
        assert_eq!(s.positions(), [0.0, 0.0, 0.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn synthetic_start_borrows_keyframe_before_target() {
        let timeline = tl(&[(0, 0.0), (1_000, 100.0), (2_000, 0.0)]);
        let cursor = Cursor::new(&timeline, 500, 0, Some(40.0));
        assert_eq!(cursor.prev_index(), None);
        let s = Stencil::around(&timeline, &cursor).unwrap();
        assert_eq!(s.p0(), StencilPoint { t: 500.0, pos: 40.0 });
        // p-1 is the real keyframe at 0; p-2 is mirrored from it.
        assert_eq!(s.points[1], StencilPoint { t: 0.0, pos: 0.0 });
        assert_eq!(s.points[0], StencilPoint { t: -500.0, pos: 0.0 });
        assert_eq!(s.points[4], StencilPoint { t: 2_000.0, pos: 0.0 });
        assert_eq!(s.points[5], StencilPoint { t: 3_000.0, pos: 0.0 });
    }

    #[test]
    fn uses_real_neighbours_in_the_middle() {
        let timeline = tl(&[(0, 0.0), (100, 10.0), (200, 20.0), (300, 30.0), (400, 40.0), (500, 50.0)]);
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        cursor.advance(&timeline, 250);
        assert_eq!(cursor.index(), 3);
        assert_eq!(cursor.prev_index(), Some(2));
        let s = Stencil::around(&timeline, &cursor).unwrap();
        assert_eq!(s.times(), [0.0, 100.0, 200.0, 300.0, 400.0, 500.0]);
    }

    #[test]
    fn applies_offset_to_every_point() {
        let timeline = tl(&[(0, 0.0), (1_000, 100.0)]);
        let cursor = Cursor::new(&timeline, 0, -200, None);
        let s = Stencil::around(&timeline, &cursor).unwrap();
        assert_eq!(s.p0().t, 0.0);
        assert_eq!(s.p1().t, 800.0);
    }

    #[test]
    fn none_past_the_end() {
        let timeline = tl(&[(0, 0.0)]);
        let cursor = Cursor::new(&timeline, 10, 0, None);
        assert!(Stencil::around(&timeline, &cursor).is_none());
    }
}
