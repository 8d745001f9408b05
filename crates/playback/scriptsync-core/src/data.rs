//! Script data model: keyframes, timelines and multi-channel bundles.
//!
//! Timelines are immutable once loaded. Positions are clamped to [0,100] and
//! the inversion transform is applied exactly once, at load time. Playback
//! progress lives in the cursor and dispatcher, never in the timeline, so a
//! loaded script can be shared and replayed freely.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::SyncError;

/// Neutral rest position used when no prior signal exists.
pub const NEUTRAL_POS: f64 = 50.0;

/// One (time, position) sample of a script.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    /// Script time in milliseconds.
    pub at: i64,
    /// Target position in [0,100].
    pub pos: f64,
}

impl Keyframe {
    #[inline]
    pub fn new(at: i64, pos: f64) -> Self {
        Self { at, pos }
    }
}

/// Time-ascending keyframes of one channel.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
}

impl Timeline {
    /// Load a timeline from a raw `actions` array.
    ///
    /// Every entry must be an object with numeric `at` and `pos`. Fractional
    /// `at` values are truncated, positions are clamped to [0,100] and, when
    /// `inverted` is set, mapped to `100 - pos`. Out-of-order input is sorted
    /// stably so duplicated timestamps keep their authored order.
    pub fn load(raw_actions: &JsonValue, inverted: bool) -> Result<Self, SyncError> {
        let items = raw_actions
            .as_array()
            .ok_or_else(|| SyncError::invalid_script("actions must be an array"))?;
        if items.is_empty() {
            return Err(SyncError::invalid_script("script has no actions"));
        }

        let mut keyframes = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let obj = item
                .as_object()
                .ok_or_else(|| SyncError::invalid_script(format!("action {i} is not an object")))?;
            let at = obj
                .get("at")
                .and_then(JsonValue::as_f64)
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    SyncError::invalid_script(format!("action {i} has no numeric 'at'"))
                })?;
            let pos = obj
                .get("pos")
                .and_then(JsonValue::as_f64)
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    SyncError::invalid_script(format!("action {i} has no numeric 'pos'"))
                })?;
            let pos = pos.clamp(0.0, 100.0);
            let pos = if inverted { 100.0 - pos } else { pos };
            keyframes.push(Keyframe::new(at.trunc() as i64, pos));
        }

        if keyframes.windows(2).any(|w| w[1].at < w[0].at) {
            debug!(len = keyframes.len(), "sorting out-of-order timeline");
            keyframes.sort_by_key(|k| k.at);
        }

        Ok(Self { keyframes })
    }

    /// Build directly from keyframes (clamped and sorted, never inverted).
    pub fn from_keyframes(mut keyframes: Vec<Keyframe>) -> Self {
        for k in &mut keyframes {
            k.pos = k.pos.clamp(0.0, 100.0);
        }
        keyframes.sort_by_key(|k| k.at);
        Self { keyframes }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Keyframe> {
        self.keyframes.get(index).copied()
    }

    /// Signed lookup used by interpolation stencils.
    #[inline]
    pub fn get_signed(&self, index: isize) -> Option<Keyframe> {
        usize::try_from(index).ok().and_then(|i| self.get(i))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }
}

/// Main timeline plus optional dedicated vibration and rotation timelines.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ScriptBundle {
    pub main: Timeline,
    #[serde(default)]
    pub vibrate: Option<Timeline>,
    #[serde(default)]
    pub rotate: Option<Timeline>,
}

impl ScriptBundle {
    pub fn single(main: Timeline) -> Self {
        Self {
            main,
            vibrate: None,
            rotate: None,
        }
    }
}
