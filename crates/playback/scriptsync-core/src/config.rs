//! Engine configuration snapshot.

use serde::{Deserialize, Serialize};

/// Interpolation model applied between keyframes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationModel {
    #[default]
    Linear,
    /// Monotone cubic Hermite with PCHIP slopes.
    Pchip,
    /// Cubic Hermite with modified-Akima slopes.
    Makima,
}

impl InterpolationModel {
    /// Case-insensitive lookup; unknown names fall back to `Linear`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pchip" => Self::Pchip,
            "makima" => Self::Makima,
            _ => Self::Linear,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Pchip => "pchip",
            Self::Makima => "makima",
        }
    }
}

/// Immutable per-tick configuration.
///
/// `offset_ms` is latched when playback (re)starts; everything else is read
/// on every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Signed latency compensation added to every keyframe time.
    /// Negative moves the device ahead of the video.
    pub offset_ms: i64,
    pub interpolation: InterpolationModel,
    /// Tick rate of the playback loop.
    pub update_rate_hz: u32,
    /// Output gain applied to every channel, >= 0.
    pub gain: f64,

    pub speed_limit_enabled: bool,
    /// Maximum position travel in script units (0..100) per second.
    pub speed_limit_units_per_second: f64,

    /// Derive vibration from main-channel stroke speed when no vibrate axis exists.
    pub fallback_vibration: bool,
    /// Derive rotation from main-channel stroke speed when no rotate axis exists.
    pub fallback_rotation: bool,
    pub fallback_vibe_gain: f64,
    pub fallback_rotate_gain: f64,
    /// Stroke speed (full strokes per second) mapping to full intensity.
    pub fallback_speed_divisor: f64,
    /// Segments longer than this produce zero fallback intensity.
    pub fallback_idle_ms: i64,
    pub rotate_clockwise: bool,

    /// Minimum output change (0..1 scale) before a command is re-sent.
    pub dead_band: f64,
    /// Sample-to-sample drift between host and wall time treated as a jump.
    pub clock_jump_threshold_ms: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offset_ms: 0,
            interpolation: InterpolationModel::Linear,
            update_rate_hz: 20,
            gain: 1.0,
            speed_limit_enabled: false,
            speed_limit_units_per_second: 100.0,
            fallback_vibration: false,
            fallback_rotation: false,
            fallback_vibe_gain: 1.0,
            fallback_rotate_gain: 1.0,
            fallback_speed_divisor: 4.0,
            fallback_idle_ms: 2000,
            rotate_clockwise: true,
            dead_band: 0.005,
            clock_jump_threshold_ms: 1000,
        }
    }
}

const MIN_RATE_HZ: u32 = 1;
const MAX_RATE_HZ: u32 = 240;

fn non_negative(v: f64, default: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        default
    }
}

impl Config {
    /// Clamp every field into its valid domain.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        self.update_rate_hz = self.update_rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ);
        self.gain = non_negative(self.gain, d.gain);
        self.fallback_vibe_gain = non_negative(self.fallback_vibe_gain, d.fallback_vibe_gain);
        self.fallback_rotate_gain =
            non_negative(self.fallback_rotate_gain, d.fallback_rotate_gain);
        self.dead_band = non_negative(self.dead_band, d.dead_band);
        if !(self.speed_limit_units_per_second.is_finite()
            && self.speed_limit_units_per_second > 0.0)
        {
            self.speed_limit_units_per_second = d.speed_limit_units_per_second;
        }
        if !(self.fallback_speed_divisor.is_finite() && self.fallback_speed_divisor > 0.0) {
            self.fallback_speed_divisor = d.fallback_speed_divisor;
        }
        self.fallback_idle_ms = self.fallback_idle_ms.max(0);
        self.clock_jump_threshold_ms = self.clock_jump_threshold_ms.max(0);
        self
    }

    /// Tick period in milliseconds.
    #[inline]
    pub fn tick_interval_ms(&self) -> u64 {
        (1000.0 / f64::from(self.update_rate_hz.max(MIN_RATE_HZ))).round() as u64
    }

    /// Duration attached to position commands: one tick.
    #[inline]
    pub fn command_duration_ms(&self) -> u32 {
        self.tick_interval_ms() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range() {
        let cfg = Config {
            update_rate_hz: 0,
            gain: -2.0,
            speed_limit_units_per_second: f64::NAN,
            fallback_speed_divisor: 0.0,
            fallback_idle_ms: -5,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(cfg.update_rate_hz, 1);
        assert_eq!(cfg.gain, 0.0);
        assert_eq!(cfg.speed_limit_units_per_second, 100.0);
        assert_eq!(cfg.fallback_speed_divisor, 4.0);
        assert_eq!(cfg.fallback_idle_ms, 0);
    }

    #[test]
    fn tick_interval_follows_rate() {
        let cfg = Config::default();
        assert_eq!(cfg.tick_interval_ms(), 50);
        let cfg = Config {
            update_rate_hz: 60,
            ..Config::default()
        };
        assert_eq!(cfg.tick_interval_ms(), 17);
    }

    #[test]
    fn model_names_are_case_insensitive() {
        assert_eq!(InterpolationModel::from_name("PCHIP"), InterpolationModel::Pchip);
        assert_eq!(InterpolationModel::from_name("Makima"), InterpolationModel::Makima);
        assert_eq!(InterpolationModel::from_name("cubic"), InterpolationModel::Linear);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"gain":0.5}"#).unwrap();
        assert_eq!(cfg.gain, 0.5);
        assert_eq!(cfg.update_rate_hz, 20);
    }
}
