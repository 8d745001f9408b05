//! Per-channel dispatch pipeline: gain, speed limiting, dead-band, emit.
//!
//! The dispatcher owns the only mutable record of what was sent
//! (`DispatchState` per channel). Timelines stay untouched, so a script can
//! be replayed any number of times from the same inputs with identical
//! results.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::Config;
use crate::interp::functions::clamp01;
use crate::outputs::{Command, Outputs};

/// Actuation channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Linear stroke position; always the main channel.
    Position,
    Vibration,
    Rotation,
}

impl Channel {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Vibration => "vibration",
            Self::Rotation => "rotation",
        }
    }
}

/// Commands a sink can execute. Queried before every emission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub position: bool,
    pub vibration: bool,
    pub rotation: bool,
    pub stop: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            position: true,
            vibration: true,
            rotation: true,
            stop: true,
        }
    }

    #[inline]
    pub fn supports(&self, channel: Channel) -> bool {
        match channel {
            Channel::Position => self.position,
            Channel::Vibration => self.vibration,
            Channel::Rotation => self.rotation,
        }
    }
}

/// Last value actually sent on a channel (0..1 scale).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DispatchState {
    pub last_sent_value: Option<f64>,
    pub last_sent_wall_ms: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    states: HashMap<Channel, DispatchState>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one channel value (0..1, before gain) through the pipeline.
    ///
    /// Returns `true` when a command was emitted into `out`.
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &mut self,
        channel: Channel,
        value: f64,
        channel_gain: f64,
        cfg: &Config,
        caps: &Capabilities,
        now_wall_ms: i64,
        out: &mut Outputs,
    ) -> bool {
        if !caps.supports(channel) {
            return false;
        }
        let state = self.states.entry(channel).or_default();

        // 1) Gain
        let mut value = clamp01(value * channel_gain);

        // 2) Speed limit: bound the step, not the target.
        if channel == Channel::Position && cfg.speed_limit_enabled {
            if let (Some(last), Some(when)) = (state.last_sent_value, state.last_sent_wall_ms) {
                let dt_s = now_wall_ms.saturating_sub(when).max(0) as f64 / 1000.0;
                let max_step = cfg.speed_limit_units_per_second / 100.0 * dt_s;
                let diff = value - last;
                if diff.abs() > max_step {
                    value = last + diff.signum() * max_step;
                }
            }
        }

        // 3) Dead-band
        if let Some(last) = state.last_sent_value {
            if (value - last).abs() < cfg.dead_band {
                trace!(channel = channel.name(), value, last, "dead-band suppressed");
                return false;
            }
        }

        // 4) Emit
        let command = match channel {
            Channel::Position => Command::SetPosition {
                value,
                duration_ms: cfg.command_duration_ms(),
            },
            Channel::Vibration => Command::SetVibration { value },
            Channel::Rotation => Command::SetRotation {
                value,
                clockwise: cfg.rotate_clockwise,
            },
        };
        trace!(channel = channel.name(), value, "emit");
        out.push_command(command);
        state.last_sent_value = Some(value);
        state.last_sent_wall_ms = Some(now_wall_ms);
        true
    }

    /// Bring the device to rest and forget every channel's state.
    ///
    /// Without a stop command, running vibration and rotation channels are
    /// zeroed instead. A position channel simply holds.
    pub fn stop_all(&mut self, caps: &Capabilities, cfg: &Config, out: &mut Outputs) {
        if caps.stop {
            out.push_command(Command::Stop);
        } else {
            for channel in [Channel::Vibration, Channel::Rotation] {
                let running = self
                    .state(channel)
                    .last_sent_value
                    .is_some_and(|v| v != 0.0);
                if !running || !caps.supports(channel) {
                    continue;
                }
                out.push_command(match channel {
                    Channel::Rotation => Command::SetRotation {
                        value: 0.0,
                        clockwise: cfg.rotate_clockwise,
                    },
                    _ => Command::SetVibration { value: 0.0 },
                });
            }
        }
        self.reset();
    }

    /// Forget what was sent, e.g. after the sink reconnects.
    #[inline]
    pub fn reset(&mut self) {
        self.states.clear();
    }

    pub fn state(&self, channel: Channel) -> DispatchState {
        self.states.get(&channel).copied().unwrap_or_default()
    }
}
