//! Scriptsync Runtime (tokio)
//!
//! Runs a `scriptsync-core` [`Engine`](scriptsync_core::Engine) on a fixed-rate
//! tick loop and forwards its commands to an asynchronous actuation sink.
//! Host lifecycle events arrive through a [`PlayerHandle`] and are applied in
//! the loop task, between ticks.

pub mod clock;
pub mod player;
pub mod sink;
pub mod source;

pub use clock::{TokioClock, WallClock};
pub use player::{Player, PlayerError, PlayerHandle, PlayerOptions};
pub use sink::{send_command, ActuatorSink};
pub use source::{FileScriptSource, ScriptSource};
