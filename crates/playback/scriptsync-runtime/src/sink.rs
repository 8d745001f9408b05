//! Actuation sink abstraction.
//!
//! A sink exposes any subset of position, vibration, rotation and stop. The
//! player checks [`ActuatorSink::capabilities`] once at startup and the engine
//! never emits a command type the sink lacks; the default method bodies still
//! report `CapabilityAbsent` for sinks that are called directly.

use async_trait::async_trait;
use scriptsync_core::{Capabilities, Command, Result, SyncError};

fn absent(capability: &str) -> SyncError {
    SyncError::CapabilityAbsent {
        capability: capability.to_string(),
    }
}

#[async_trait]
pub trait ActuatorSink: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Acquire the device. Failing here is the only error surfaced by `Player::spawn`.
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Move to `value` (0..1) over `duration_ms`.
    async fn set_position(&self, _value: f64, _duration_ms: u32) -> Result<()> {
        Err(absent("position"))
    }

    async fn set_vibration(&self, _value: f64) -> Result<()> {
        Err(absent("vibration"))
    }

    async fn set_rotation(&self, _value: f64, _clockwise: bool) -> Result<()> {
        Err(absent("rotation"))
    }

    async fn stop(&self) -> Result<()> {
        Err(absent("stop"))
    }
}

/// Route one engine command to the matching sink call.
pub async fn send_command(sink: &dyn ActuatorSink, command: Command) -> Result<()> {
    match command {
        Command::SetPosition { value, duration_ms } => sink.set_position(value, duration_ms).await,
        Command::SetVibration { value } => sink.set_vibration(value).await,
        Command::SetRotation { value, clockwise } => sink.set_rotation(value, clockwise).await,
        Command::Stop => sink.stop().await,
    }
}
