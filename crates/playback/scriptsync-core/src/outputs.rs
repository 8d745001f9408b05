//! Output contracts from the core engine.
//!
//! Outputs carry the actuation commands produced this tick, in emission
//! order, plus a separate list of semantic events. Adapters forward the
//! commands to the sink and may surface the events to the host.

use serde::{Deserialize, Serialize};

/// One actuation command. Values are normalized to [0,1].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    SetPosition { value: f64, duration_ms: u32 },
    SetVibration { value: f64 },
    SetRotation { value: f64, clockwise: bool },
    Stop,
}

/// Discrete semantic signals emitted by the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum CoreEvent {
    ScriptLoaded {
        main_len: usize,
        has_vibrate: bool,
        has_rotate: bool,
    },
    ScriptCleared,
    PlaybackStarted {
        at_ms: i64,
    },
    PlaybackPaused,
    Seeked {
        at_ms: i64,
    },
    PlaybackEnded {
        at_ms: i64,
    },
}

/// Outputs returned by the engine's lifecycle and tick methods.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Outputs {
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }
}
