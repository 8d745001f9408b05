//! Engine: one playback session owning script, clock, cursors and dispatch state.
//!
//! Methods:
//! - load_script / load_script_json / clear_script
//! - play, pause, seek, sync (host lifecycle) and handle (queued events)
//! - tick: extrapolate clock -> advance cursors -> interpolate -> dispatch
//!
//! Every method takes the current wall time explicitly, so replaying the same
//! event sequence yields the same command sequence.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::PlaybackClock;
use crate::config::Config;
use crate::cursor::{AdvanceResult, Cursor};
use crate::data::{ScriptBundle, Timeline};
use crate::dispatch::{Capabilities, Channel, Dispatcher};
use crate::error::SyncError;
use crate::fallback::stroke_intensity;
use crate::inputs::HostEvent;
use crate::interp::{evaluate, Stencil};
use crate::outputs::{CoreEvent, Outputs};
use crate::script::parse_funscript_json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No playback started yet, or no script loaded.
    Idle,
    Playing,
    Paused,
    /// Main timeline exhausted; holding the last position.
    Ended,
}

impl PlaybackState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Cursors for each timeline of the loaded bundle.
#[derive(Debug, Default)]
struct Cursors {
    main: Option<Cursor>,
    vibrate: Option<Cursor>,
    rotate: Option<Cursor>,
}

#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    caps: Capabilities,
    script: Option<ScriptBundle>,
    clock: PlaybackClock,
    cursors: Cursors,
    dispatcher: Dispatcher,
    state: PlaybackState,
    /// Last interpolated position per channel (0..100), seeds cursor resets.
    last_pos: HashMap<Channel, f64>,
    /// Last host-reported position, used when playing after a paused seek.
    position_ms: i64,

    // Per-call outputs
    outputs: Outputs,
}

impl Engine {
    /// Create an engine assuming a sink with every capability.
    pub fn new(cfg: Config) -> Self {
        let cfg = cfg.sanitized();
        Self {
            clock: PlaybackClock::default().with_jump_threshold(cfg.clock_jump_threshold_ms),
            cfg,
            caps: Capabilities::all(),
            script: None,
            cursors: Cursors::default(),
            dispatcher: Dispatcher::new(),
            state: PlaybackState::Idle,
            last_pos: HashMap::new(),
            position_ms: 0,
            outputs: Outputs::default(),
        }
    }

    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn set_capabilities(&mut self, caps: Capabilities) {
        self.caps = caps;
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Replace the config snapshot. A changed offset applies from the next play/seek.
    pub fn set_config(&mut self, cfg: Config) {
        self.cfg = cfg.sanitized();
        self.clock.set_jump_threshold(self.cfg.clock_jump_threshold_ms);
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn script(&self) -> Option<&ScriptBundle> {
        self.script.as_ref()
    }

    #[inline]
    pub fn main_cursor(&self) -> Option<&Cursor> {
        self.cursors.main.as_ref()
    }

    /// Last interpolated main position (0..100), if any was computed.
    #[inline]
    pub fn last_position(&self) -> Option<f64> {
        self.last_pos.get(&Channel::Position).copied()
    }

    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Outputs of the most recent call.
    #[inline]
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Load a script bundle, pausing any running playback first.
    pub fn load_script(&mut self, bundle: ScriptBundle) -> &Outputs {
        self.outputs.clear();
        self.halt();
        info!(
            actions = bundle.main.len(),
            vibrate = bundle.vibrate.as_ref().map_or(0, Timeline::len),
            rotate = bundle.rotate.as_ref().map_or(0, Timeline::len),
            "script loaded"
        );
        self.outputs.push_event(CoreEvent::ScriptLoaded {
            main_len: bundle.main.len(),
            has_vibrate: bundle.vibrate.is_some(),
            has_rotate: bundle.rotate.is_some(),
        });
        self.script = Some(bundle);
        self.cursors = Cursors::default();
        self.state = PlaybackState::Idle;
        &self.outputs
    }

    /// Parse and load; on failure the engine holds no script.
    pub fn load_script_json(&mut self, json: &str) -> Result<&Outputs, SyncError> {
        match parse_funscript_json(json) {
            Ok(bundle) => Ok(self.load_script(bundle)),
            Err(err) => {
                warn!(%err, "script rejected; no script loaded");
                self.clear_script();
                Err(err)
            }
        }
    }

    pub fn clear_script(&mut self) -> &Outputs {
        self.outputs.clear();
        self.halt();
        if self.script.take().is_some() {
            self.outputs.push_event(CoreEvent::ScriptCleared);
        }
        self.cursors = Cursors::default();
        self.state = PlaybackState::Idle;
        &self.outputs
    }

    /// Start (or restart) playback at logical time `at_ms`.
    pub fn play(&mut self, at_ms: i64, now_wall_ms: i64) -> &Outputs {
        self.outputs.clear();
        self.start(at_ms, now_wall_ms);
        &self.outputs
    }

    /// Stop every channel and freeze playback.
    pub fn pause(&mut self, _now_wall_ms: i64) -> &Outputs {
        self.outputs.clear();
        self.halt();
        if self.script.is_some() {
            self.state = PlaybackState::Paused;
            self.outputs.push_event(CoreEvent::PlaybackPaused);
        }
        &self.outputs
    }

    /// Jump to `at_ms`. Restarts immediately when playing (or ended);
    /// otherwise the position is used by the next `play`.
    pub fn seek(&mut self, at_ms: i64, now_wall_ms: i64) -> &Outputs {
        self.outputs.clear();
        self.position_ms = at_ms;
        self.outputs.push_event(CoreEvent::Seeked { at_ms });
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Ended) {
            self.halt();
            self.start(at_ms, now_wall_ms);
        }
        &self.outputs
    }

    /// Record a host clock sample.
    pub fn sync(&mut self, at_ms: i64, now_wall_ms: i64) {
        self.position_ms = at_ms;
        self.clock.sync(at_ms, now_wall_ms);
    }

    /// Apply one queued host event.
    pub fn handle(&mut self, event: HostEvent, now_wall_ms: i64) -> &Outputs {
        match event {
            HostEvent::Play { at_ms } => self.play(at_ms, now_wall_ms),
            HostEvent::Pause => self.pause(now_wall_ms),
            HostEvent::Seek { at_ms } => self.seek(at_ms, now_wall_ms),
            HostEvent::Sync { at_ms } => {
                self.outputs.clear();
                self.sync(at_ms, now_wall_ms);
                &self.outputs
            }
        }
    }

    /// Forget dispatch state after the sink disconnects or reconnects.
    pub fn reset_sink(&mut self) {
        debug!("sink reset; clearing dispatch state");
        self.dispatcher.reset();
    }

    /// Logical time the host last reported.
    #[inline]
    pub fn position_ms(&self) -> i64 {
        self.position_ms
    }

    fn start(&mut self, at_ms: i64, now_wall_ms: i64) {
        let Some(script) = self.script.as_ref() else {
            debug!(at_ms, "play ignored: no script loaded");
            return;
        };
        let offset = self.cfg.offset_ms;
        self.clock.reset(at_ms, now_wall_ms);
        self.position_ms = at_ms;
        let last = |ch: Channel| self.last_pos.get(&ch).copied();
        self.cursors = Cursors {
            main: Some(Cursor::new(&script.main, at_ms, offset, last(Channel::Position))),
            vibrate: script
                .vibrate
                .as_ref()
                .map(|tl| Cursor::new(tl, at_ms, offset, last(Channel::Vibration))),
            rotate: script
                .rotate
                .as_ref()
                .map(|tl| Cursor::new(tl, at_ms, offset, last(Channel::Rotation))),
        };
        self.state = PlaybackState::Playing;
        debug!(at_ms, offset_ms = offset, "playback started");
        self.outputs.push_event(CoreEvent::PlaybackStarted { at_ms });
    }

    fn halt(&mut self) {
        self.dispatcher.stop_all(&self.caps, &self.cfg, &mut self.outputs);
        if self.state.is_playing() {
            debug!("playback halted");
        }
    }

    /// One fixed-rate step. Returns the commands to forward to the sink.
    pub fn tick(&mut self, now_wall_ms: i64) -> &Outputs {
        self.outputs.clear();
        if !self.state.is_playing() {
            return &self.outputs;
        }
        let (Some(script), Some(main)) = (self.script.as_ref(), self.cursors.main.as_mut()) else {
            return &self.outputs;
        };

        let t = self.clock.extrapolate(now_wall_ms);
        let cfg = &self.cfg;
        let caps = &self.caps;

        if main.advance(&script.main, t) == AdvanceResult::Stopped {
            // Hold position; derived channels stop.
            if script.vibrate.is_none() && cfg.fallback_vibration {
                self.dispatcher.process(
                    Channel::Vibration,
                    0.0,
                    1.0,
                    cfg,
                    caps,
                    now_wall_ms,
                    &mut self.outputs,
                );
            }
            if script.rotate.is_none() && cfg.fallback_rotation {
                self.dispatcher.process(
                    Channel::Rotation,
                    0.0,
                    1.0,
                    cfg,
                    caps,
                    now_wall_ms,
                    &mut self.outputs,
                );
            }
            self.state = PlaybackState::Ended;
            debug!(at_ms = t, "main timeline ended");
            self.outputs.push_event(CoreEvent::PlaybackEnded { at_ms: t });
            return &self.outputs;
        }

        // Main / position channel
        if let Some(stencil) = Stencil::around(&script.main, main) {
            let pos = evaluate(cfg.interpolation, &stencil, t as f64);
            self.last_pos.insert(Channel::Position, pos);
            self.dispatcher.process(
                Channel::Position,
                pos / 100.0,
                cfg.gain,
                cfg,
                caps,
                now_wall_ms,
                &mut self.outputs,
            );
        }
        let main_segment = main
            .target(&script.main)
            .map(|target| (main.prev(), target));

        // Vibration / rotation: dedicated axis, else optional fallback.
        for (channel, timeline, cursor, fallback, fallback_gain) in [
            (
                Channel::Vibration,
                script.vibrate.as_ref(),
                self.cursors.vibrate.as_mut(),
                cfg.fallback_vibration,
                cfg.fallback_vibe_gain,
            ),
            (
                Channel::Rotation,
                script.rotate.as_ref(),
                self.cursors.rotate.as_mut(),
                cfg.fallback_rotation,
                cfg.fallback_rotate_gain,
            ),
        ] {
            if !caps.supports(channel) {
                continue;
            }
            match (timeline, cursor) {
                (Some(timeline), Some(cursor)) => {
                    if cursor.advance(timeline, t) == AdvanceResult::Stopped {
                        continue;
                    }
                    if let Some(stencil) = Stencil::around(timeline, cursor) {
                        let pos = evaluate(cfg.interpolation, &stencil, t as f64);
                        self.last_pos.insert(channel, pos);
                        self.dispatcher.process(
                            channel,
                            pos / 100.0,
                            cfg.gain,
                            cfg,
                            caps,
                            now_wall_ms,
                            &mut self.outputs,
                        );
                    }
                }
                _ if fallback => {
                    let intensity = main_segment
                        .map(|(p0, p1)| stroke_intensity(p0, p1, cfg))
                        .unwrap_or(0.0);
                    self.dispatcher.process(
                        channel,
                        intensity,
                        cfg.gain * fallback_gain,
                        cfg,
                        caps,
                        now_wall_ms,
                        &mut self.outputs,
                    );
                }
                _ => {}
            }
        }

        &self.outputs
    }
}
