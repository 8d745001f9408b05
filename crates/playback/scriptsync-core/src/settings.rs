//! Host settings snapshot (plain key/value map) decoded into [`Config`] overrides.
//!
//! Hosts store settings as loosely typed JSON: numbers may arrive as strings
//! and booleans as `"true"`/`"false"`. Only keys present in the snapshot
//! override the current configuration; unknown keys are ignored.

use serde_json::{Map, Value as JsonValue};

use crate::config::{Config, InterpolationModel};
use crate::error::SyncError;

/// Partial configuration read from a host settings map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// Device latency in ms; becomes `offset_ms = -latency`.
    pub latency_ms: Option<i64>,
    pub update_rate_hz: Option<u32>,
    pub interpolation: Option<InterpolationModel>,
    pub intensity: Option<f64>,
    pub speed_limit_enabled: Option<bool>,
    pub speed_limit_units_per_second: Option<f64>,
    pub fallback_vibration: Option<bool>,
    pub fallback_rotation: Option<bool>,
    pub fallback_vibe_gain: Option<f64>,
    pub fallback_rotate_gain: Option<f64>,
}

fn number(map: &Map<String, JsonValue>, key: &str) -> Option<f64> {
    match map.get(key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn flag(map: &Map<String, JsonValue>, key: &str) -> Option<bool> {
    match map.get(key)? {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Some(true),
            "false" | "0" | "off" => Some(false),
            _ => None,
        },
        JsonValue::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}

impl Settings {
    pub fn from_json(value: &JsonValue) -> Result<Self, SyncError> {
        let map = value.as_object().ok_or_else(|| SyncError::InvalidConfig {
            reason: "settings snapshot must be an object".into(),
        })?;
        Ok(Self::from_map(map))
    }

    pub fn from_map(map: &Map<String, JsonValue>) -> Self {
        Self {
            latency_ms: number(map, "latency").map(|v| v.trunc() as i64),
            update_rate_hz: number(map, "updateRate")
                .filter(|v| *v >= 1.0)
                .map(|v| v.round() as u32),
            interpolation: map
                .get("interpolationType")
                .and_then(JsonValue::as_str)
                .map(InterpolationModel::from_name),
            intensity: number(map, "intensity"),
            speed_limit_enabled: flag(map, "enableSpeedLimit"),
            speed_limit_units_per_second: number(map, "speedLimitCount"),
            fallback_vibration: flag(map, "fallbackVibrate"),
            fallback_rotation: flag(map, "fallbackRotate"),
            fallback_vibe_gain: number(map, "fallbackVibeGain"),
            fallback_rotate_gain: number(map, "fallbackRotateGain"),
        }
    }

    /// Apply the present keys over `base` and return the sanitized result.
    pub fn merge_over(&self, base: Config) -> Config {
        let mut cfg = base;
        if let Some(latency) = self.latency_ms {
            cfg.offset_ms = -latency;
        }
        if let Some(rate) = self.update_rate_hz {
            cfg.update_rate_hz = rate;
        }
        if let Some(model) = self.interpolation {
            cfg.interpolation = model;
        }
        if let Some(gain) = self.intensity {
            cfg.gain = gain;
        }
        if let Some(enabled) = self.speed_limit_enabled {
            cfg.speed_limit_enabled = enabled;
        }
        if let Some(limit) = self.speed_limit_units_per_second {
            cfg.speed_limit_units_per_second = limit;
        }
        if let Some(enabled) = self.fallback_vibration {
            cfg.fallback_vibration = enabled;
        }
        if let Some(enabled) = self.fallback_rotation {
            cfg.fallback_rotation = enabled;
        }
        if let Some(gain) = self.fallback_vibe_gain {
            cfg.fallback_vibe_gain = gain;
        }
        if let Some(gain) = self.fallback_rotate_gain {
            cfg.fallback_rotate_gain = gain;
        }
        cfg.sanitized()
    }
}
