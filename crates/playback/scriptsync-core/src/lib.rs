//! Scriptsync Core (host- and device-agnostic)
//!
//! Keeps a keyframed motion script in step with a host media clock and turns
//! it into rate-limited actuation commands. The crate is synchronous and
//! deterministic: wall time is always passed in, and every call returns the
//! commands and events it produced. Async scheduling and device I/O live in
//! `scriptsync-runtime`.

pub mod clock;
pub mod config;
pub mod cursor;
pub mod data;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod inputs;
pub mod interp;
pub mod outputs;
pub mod script;
pub mod settings;

// Re-exports for consumers (adapters)
pub use clock::PlaybackClock;
pub use config::{Config, InterpolationModel};
pub use cursor::{AdvanceResult, Cursor};
pub use data::{Keyframe, ScriptBundle, Timeline, NEUTRAL_POS};
pub use dispatch::{Capabilities, Channel, DispatchState, Dispatcher};
pub use engine::{Engine, PlaybackState};
pub use error::SyncError;
pub use inputs::{HostEvent, TimedEvent};
pub use interp::{evaluate, Stencil};
pub use outputs::{Command, CoreEvent, Outputs};
pub use script::parse_funscript_json;
pub use settings::Settings;

pub type Result<T> = core::result::Result<T, SyncError>;
