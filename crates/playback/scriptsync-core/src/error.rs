//! Error types for script loading, clock handling and actuation.

use serde::{Deserialize, Serialize};

/// Error type shared by the engine and its adapters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SyncError {
    /// Script data is malformed or missing
    #[error("Invalid script: {reason}")]
    InvalidScript { reason: String },

    /// Host clock jumped; never returned by the engine, only used for classification
    #[error("Clock discontinuity: {from_ms} ms -> {to_ms} ms")]
    ClockDiscontinuity { from_ms: i64, to_ms: i64 },

    /// A send to the actuation sink failed or timed out
    #[error("Sink unavailable: {reason}")]
    SinkUnavailable { reason: String },

    /// The sink does not implement the requested command
    #[error("Capability absent: {capability}")]
    CapabilityAbsent { capability: String },

    /// The script source could not deliver data
    #[error("Script source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// A settings snapshot could not be decoded
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Sink or clock could not be acquired when starting a session
    #[error("Startup failed: {reason}")]
    Startup { reason: String },
}

impl SyncError {
    pub fn invalid_script(reason: impl Into<String>) -> Self {
        Self::InvalidScript {
            reason: reason.into(),
        }
    }

    pub fn sink(reason: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            reason: reason.into(),
        }
    }

    /// Per-tick failures are recoverable; the next tick issues a fresher command.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ClockDiscontinuity { .. }
                | Self::SinkUnavailable { .. }
                | Self::CapabilityAbsent { .. }
                | Self::SourceUnavailable { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidScript { .. } | Self::SourceUnavailable { .. } => "script",
            Self::ClockDiscontinuity { .. } => "clock",
            Self::SinkUnavailable { .. } | Self::CapabilityAbsent { .. } => "sink",
            Self::InvalidConfig { .. } => "config",
            Self::Startup { .. } => "startup",
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidScript {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}
