//! Play a funscript against a logging sink while simulating a 60 fps host clock.
//!
//! Usage: `simulate [path/to/script.funscript]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scriptsync_core::{Capabilities, Config, InterpolationModel, PlaybackState};
use scriptsync_runtime::{ActuatorSink, FileScriptSource, Player, TokioClock};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct LogSink;

#[async_trait]
impl ActuatorSink for LogSink {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    async fn set_position(&self, value: f64, duration_ms: u32) -> scriptsync_core::Result<()> {
        info!(target: "device", value, duration_ms, "position");
        Ok(())
    }

    async fn set_vibration(&self, value: f64) -> scriptsync_core::Result<()> {
        info!(target: "device", value, "vibration");
        Ok(())
    }

    async fn set_rotation(&self, value: f64, clockwise: bool) -> scriptsync_core::Result<()> {
        info!(target: "device", value, clockwise, "rotation");
        Ok(())
    }

    async fn stop(&self) -> scriptsync_core::Result<()> {
        info!(target: "device", "stop");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fixtures/scripts/strokes.funscript"));
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    let key = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("invalid script path {}", path.display()))?
        .to_string();

    let cfg = Config {
        interpolation: InterpolationModel::Pchip,
        fallback_vibration: true,
        update_rate_hz: 30,
        ..Config::default()
    };
    let clock = Arc::new(TokioClock::new());
    let player = Player::spawn(cfg, Arc::new(LogSink), clock).await?;
    player
        .load_from(&FileScriptSource::new(dir), &key)
        .await
        .with_context(|| format!("loading {}", path.display()))?;

    player.play(0)?;
    let mut logical = 0;
    let mut frame = tokio::time::interval(Duration::from_millis(16));
    while player.state() != PlaybackState::Ended && logical < 120_000 {
        frame.tick().await;
        logical += 16;
        player.sync(logical)?;
    }

    player.shutdown().await;
    Ok(())
}
