//! Player: the tokio task that owns an [`Engine`] and runs its tick loop.
//!
//! Two tasks per player:
//! - the loop task applies host messages and ticks the engine, both from one
//!   `select!`, so lifecycle changes land atomically between ticks;
//! - the sender task forwards commands to the sink with a per-send timeout.
//!
//! Tick commands reach the sender through a bounded queue fed with
//! `try_send`, so the loop never waits on the sink. Commands produced by
//! lifecycle changes (pause, seek, load, shutdown) bring the device to rest;
//! they travel on a separate unbounded lane that the sender always drains
//! first, and every tick command queued before them is discarded as stale.

use std::sync::Arc;
use std::time::Duration;

use scriptsync_core::{
    parse_funscript_json, Command, Config, CoreEvent, Engine, HostEvent, Outputs, PlaybackState,
    ScriptBundle, Settings, SyncError, TimedEvent,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, trace, warn};

use crate::clock::WallClock;
use crate::sink::{send_command, ActuatorSink};
use crate::source::ScriptSource;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PlayerError {
    #[error("player mailbox closed")]
    MailboxClosed,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Tuning for the loop/sender pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerOptions {
    /// Commands buffered between the loop and the sink before new ones are dropped.
    pub send_queue: usize,
    /// Upper bound for one sink call.
    pub send_timeout: Duration,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            send_queue: 32,
            send_timeout: Duration::from_millis(500),
        }
    }
}

/// Commands tagged with the halt epoch current when they were produced.
type Queued = (u64, Command);
type Halt = (u64, Vec<Command>);

#[derive(Debug)]
enum Message {
    Load(ScriptBundle),
    Clear,
    Host(TimedEvent),
    SetConfig(Config),
    ApplySettings(Settings),
    ResetSink,
    Shutdown,
}

pub struct Player;

impl Player {
    /// Connect the sink and start the player with default options.
    pub async fn spawn(
        cfg: Config,
        sink: Arc<dyn ActuatorSink>,
        clock: Arc<dyn WallClock>,
    ) -> Result<PlayerHandle, SyncError> {
        Self::spawn_with(cfg, sink, clock, PlayerOptions::default()).await
    }

    pub async fn spawn_with(
        cfg: Config,
        sink: Arc<dyn ActuatorSink>,
        clock: Arc<dyn WallClock>,
        opts: PlayerOptions,
    ) -> Result<PlayerHandle, SyncError> {
        sink.connect().await.map_err(|err| SyncError::Startup {
            reason: err.to_string(),
        })?;
        let caps = sink.capabilities();
        let engine = Engine::new(cfg).with_capabilities(caps);
        info!(?caps, "player started");

        let (tx, rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(opts.send_queue.max(1));
        let (halt_tx, halt_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlaybackState::Idle);

        let sender = tokio::spawn(run_sender(sink, cmd_rx, halt_rx, opts.send_timeout));
        let lanes = Lanes {
            queue: cmd_tx,
            halt: halt_tx,
            epoch: 0,
        };
        let main = tokio::spawn(run_loop(engine, rx, lanes, clock.clone(), state_tx));

        Ok(PlayerHandle {
            tx,
            clock,
            state: state_rx,
            main,
            sender,
        })
    }
}

/// Host-side handle. Every call is non-blocking except `load_from` and `shutdown`.
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<Message>,
    clock: Arc<dyn WallClock>,
    state: watch::Receiver<PlaybackState>,
    main: JoinHandle<()>,
    sender: JoinHandle<()>,
}

impl PlayerHandle {
    fn send(&self, message: Message) -> Result<(), PlayerError> {
        self.tx.send(message).map_err(|_| PlayerError::MailboxClosed)
    }

    fn host(&self, event: HostEvent) -> Result<(), PlayerError> {
        self.send(Message::Host(TimedEvent::new(self.clock.now_ms(), event)))
    }

    pub fn load(&self, bundle: ScriptBundle) -> Result<(), PlayerError> {
        self.send(Message::Load(bundle))
    }

    /// Parse on the caller's task, then hand the bundle to the loop.
    ///
    /// On a parse error the player is left without a script.
    pub fn load_json(&self, json: &str) -> Result<(), PlayerError> {
        match parse_funscript_json(json) {
            Ok(bundle) => self.load(bundle),
            Err(err) => {
                warn!(%err, "script rejected; clearing");
                self.send(Message::Clear)?;
                Err(err.into())
            }
        }
    }

    /// Fetch `key` from `source` and load it.
    pub async fn load_from(&self, source: &dyn ScriptSource, key: &str) -> Result<(), PlayerError> {
        match source.fetch(key).await {
            Ok(text) => self.load_json(&text),
            Err(err) => {
                warn!(key, %err, "script fetch failed; clearing");
                self.send(Message::Clear)?;
                Err(err.into())
            }
        }
    }

    pub fn clear(&self) -> Result<(), PlayerError> {
        self.send(Message::Clear)
    }

    pub fn play(&self, at_ms: i64) -> Result<(), PlayerError> {
        self.host(HostEvent::Play { at_ms })
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        self.host(HostEvent::Pause)
    }

    pub fn seek(&self, at_ms: i64) -> Result<(), PlayerError> {
        self.host(HostEvent::Seek { at_ms })
    }

    /// Report the host's current logical playback time.
    pub fn sync(&self, at_ms: i64) -> Result<(), PlayerError> {
        self.host(HostEvent::Sync { at_ms })
    }

    pub fn set_config(&self, cfg: Config) -> Result<(), PlayerError> {
        self.send(Message::SetConfig(cfg))
    }

    /// Merge a host settings snapshot over the running config.
    pub fn apply_settings(&self, settings: Settings) -> Result<(), PlayerError> {
        self.send(Message::ApplySettings(settings))
    }

    /// Forget dispatch state, e.g. after the device reconnects.
    pub fn reset_sink(&self) -> Result<(), PlayerError> {
        self.send(Message::ResetSink)
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Watch playback state changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    /// Stop the loop, send a final stop and wait for both tasks.
    pub async fn shutdown(self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Err(err) = self.main.await {
            warn!(%err, "player loop task failed");
        }
        if let Err(err) = self.sender.await {
            warn!(%err, "sink sender task failed");
        }
        info!("player stopped");
    }
}

/// The loop's ends of the two channels feeding the sender.
struct Lanes {
    queue: mpsc::Sender<Queued>,
    halt: mpsc::UnboundedSender<Halt>,
    epoch: u64,
}

impl Lanes {
    /// Forward tick commands; dropped when the sink is backed up.
    fn tick(&self, out: &Outputs) {
        log_events(out);
        for &command in &out.commands {
            match self.queue.try_send((self.epoch, command)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full((_, command))) => {
                    warn!(?command, "sink queue full; dropping command");
                }
                Err(mpsc::error::TrySendError::Closed((_, command))) => {
                    warn!(?command, "sink sender stopped; dropping command");
                }
            }
        }
    }

    /// Forward lifecycle commands ahead of anything still queued.
    fn halt(&mut self, out: &Outputs) {
        log_events(out);
        if out.commands.is_empty() {
            return;
        }
        self.epoch += 1;
        if self.halt.send((self.epoch, out.commands.clone())).is_err() {
            warn!(commands = ?out.commands, "sink sender stopped; dropping stop");
        }
    }
}

fn log_events(out: &Outputs) {
    for event in &out.events {
        debug!(?event, "engine event");
        if let CoreEvent::PlaybackEnded { at_ms } = event {
            info!(at_ms, "script finished");
        }
    }
}

fn tick_period(engine: &Engine) -> Duration {
    Duration::from_millis(engine.config().tick_interval_ms())
}

async fn run_loop(
    mut engine: Engine,
    mut rx: mpsc::UnboundedReceiver<Message>,
    mut lanes: Lanes,
    clock: Arc<dyn WallClock>,
    state_tx: watch::Sender<PlaybackState>,
) {
    let mut next_tick: Option<Instant> = None;

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };
                let now = clock.now_ms();
                match message {
                    Message::Shutdown => break,
                    Message::Load(bundle) => lanes.halt(engine.load_script(bundle)),
                    Message::Clear => lanes.halt(engine.clear_script()),
                    Message::Host(TimedEvent { wall_ms, event }) => {
                        lanes.halt(engine.handle(event, wall_ms))
                    }
                    Message::SetConfig(cfg) => engine.set_config(cfg),
                    Message::ApplySettings(settings) => {
                        let cfg = settings.merge_over(engine.config().clone());
                        engine.set_config(cfg);
                    }
                    Message::ResetSink => engine.reset_sink(),
                }
                trace!(now, state = engine.state().name(), "message applied");
                next_tick = match (engine.state().is_playing(), next_tick) {
                    (true, Some(at)) => Some(at),
                    (true, None) => Some(Instant::now() + tick_period(&engine)),
                    (false, _) => None,
                };
            }
            _ = sleep_until(next_tick.unwrap_or_else(Instant::now)), if next_tick.is_some() => {
                lanes.tick(engine.tick(clock.now_ms()));
                // Re-armed after the tick completes; never overlapping.
                next_tick = engine
                    .state()
                    .is_playing()
                    .then(|| Instant::now() + tick_period(&engine));
            }
        }
        state_tx.send_if_modified(|state| {
            let changed = *state != engine.state();
            *state = engine.state();
            changed
        });
    }

    // Leave the device at rest.
    lanes.halt(engine.pause(clock.now_ms()));
    let _ = state_tx.send(engine.state());
    debug!("player loop exited");
}

async fn run_sender(
    sink: Arc<dyn ActuatorSink>,
    mut queue: mpsc::Receiver<Queued>,
    mut halts: mpsc::UnboundedReceiver<Halt>,
    send_timeout: Duration,
) {
    let mut epoch = 0;
    loop {
        tokio::select! {
            biased;
            Some((at, commands)) = halts.recv() => {
                epoch = at;
                for command in commands {
                    deliver(sink.as_ref(), command, send_timeout).await;
                }
            }
            next = queue.recv() => match next {
                Some((at, command)) if at < epoch => trace!(?command, "stale; skipped"),
                Some((_, command)) => deliver(sink.as_ref(), command, send_timeout).await,
                None => break,
            },
        }
    }
}

async fn deliver(sink: &dyn ActuatorSink, command: Command, send_timeout: Duration) {
    match timeout(send_timeout, send_command(sink, command)).await {
        Ok(Ok(())) => trace!(?command, "sent"),
        Ok(Err(err)) => warn!(?command, %err, "sink send failed; dropped"),
        Err(_) => warn!(
            ?command,
            timeout_ms = send_timeout.as_millis() as u64,
            "sink send timed out; dropped"
        ),
    }
}
