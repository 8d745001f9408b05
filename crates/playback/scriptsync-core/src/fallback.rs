//! Fallback vibration/rotation derived from main-channel stroke speed.
//!
//! Used when a device can vibrate or rotate but the script has no dedicated
//! axis for it. Intensity follows the average speed of the current main
//! segment and drops to zero across idle gaps so the device stops instead of
//! holding a stale non-zero output.

use crate::config::Config;
use crate::data::Keyframe;
use crate::interp::functions::clamp01;

/// Full strokes (0..100) per second over the `[p0, p1]` segment.
#[inline]
pub fn stroke_speed(p0: Keyframe, p1: Keyframe) -> f64 {
    let span_ms = p1.at.saturating_sub(p0.at);
    if span_ms <= 0 {
        return 0.0;
    }
    (p1.pos - p0.pos).abs() / 100.0 / (span_ms as f64 / 1000.0)
}

/// Synthetic intensity in [0,1] for the segment, before channel gain.
pub fn stroke_intensity(p0: Keyframe, p1: Keyframe, cfg: &Config) -> f64 {
    if p1.at.saturating_sub(p0.at) > cfg.fallback_idle_ms {
        return 0.0;
    }
    clamp01(stroke_speed(p0, p1) / cfg.fallback_speed_divisor)
}
