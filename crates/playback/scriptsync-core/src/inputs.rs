//! Input contracts for the core engine.
//!
//! Host lifecycle events and clock samples. Adapters either call the engine
//! methods directly or queue these and apply them in order with
//! [`Engine::handle`](crate::engine::Engine::handle).

use serde::{Deserialize, Serialize};

/// Host event; all times are logical playback milliseconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum HostEvent {
    Play { at_ms: i64 },
    Pause,
    Seek { at_ms: i64 },
    Sync { at_ms: i64 },
}

/// A host event stamped with the wall time it was observed at.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimedEvent {
    pub wall_ms: i64,
    pub event: HostEvent,
}

impl TimedEvent {
    #[inline]
    pub fn new(wall_ms: i64, event: HostEvent) -> Self {
        Self { wall_ms, event }
    }
}
