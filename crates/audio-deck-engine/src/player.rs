//! Public player surface.
//!
//! Translates user actions into loop commands and exposes read-only state,
//! extension hooks, and the event stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use audio_deck_types::{CurrentSessionInfo, PlaybackEndResult, PlayerState, RepeatMode, Track};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::events::{EventBus, PlayerEvent};
use crate::playback_loop::{PlaybackLoop, PlayerCommand, SharedControls};
use crate::queue::TrackQueue;
use crate::sink::AudioSink;
use crate::source::AudioSource;
use crate::status::StatusStore;

/// Front-end extension points. Hooks get first call; the event bus re-fires
/// afterwards. The `on_*` notifications run on the loop task and must not
/// block.
pub trait PlayerHooks: Send + Sync {
    fn on_started(&self) {}
    fn on_state_changed(&self, _state: PlayerState) {}
    fn on_track_changed(&self, _track: Option<&Track>) {}
    fn on_session_ended(&self, _track: &Track, _result: &PlaybackEndResult) {}
    /// Transform or veto an enqueue; an empty result suppresses it.
    fn before_enqueue(&self, tracks: Vec<Track>) -> Vec<Track> {
        tracks
    }
    fn after_enqueue(&self, _tracks: &[Track]) {}
    /// Transform or veto a play-now; `None` suppresses it.
    fn before_play_now(&self, track: Track) -> Option<Track> {
        Some(track)
    }
    fn after_play_now(&self, _track: &Track) {}
    fn on_loop_faulted(&self, _message: &str) {}
}

/// Hook set that does nothing.
pub struct NoHooks;

impl PlayerHooks for NoHooks {}

pub struct Player {
    cmd_tx: mpsc::Sender<PlayerCommand>,
    queue: Arc<Mutex<TrackQueue>>,
    status: StatusStore,
    controls: Arc<SharedControls>,
    events: EventBus,
    hooks: Arc<dyn PlayerHooks>,
    source: Arc<dyn AudioSource>,
    sink: Arc<dyn AudioSink>,
    lifetime: CancellationToken,
    started: AtomicBool,
    pending_loop: Mutex<Option<PlaybackLoop>>,
    loop_join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    pub fn new(
        source: Arc<dyn AudioSource>,
        sink: Arc<dyn AudioSink>,
        config: EngineConfig,
    ) -> Self {
        Self::with_hooks(source, sink, config, Arc::new(NoHooks))
    }

    pub fn with_hooks(
        source: Arc<dyn AudioSource>,
        sink: Arc<dyn AudioSink>,
        config: EngineConfig,
        hooks: Arc<dyn PlayerHooks>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.queue_capacity.max(1));
        let queue = Arc::new(Mutex::new(TrackQueue::new()));
        let status = StatusStore::new();
        let controls = Arc::new(SharedControls::default());
        let events = EventBus::new();
        let lifetime = CancellationToken::new();
        let playback_loop = PlaybackLoop::new(
            cmd_tx.clone(),
            cmd_rx,
            queue.clone(),
            status.clone(),
            controls.clone(),
            events.clone(),
            hooks.clone(),
            source.clone(),
            sink.clone(),
            config,
            lifetime.clone(),
        );
        Self {
            cmd_tx,
            queue,
            status,
            controls,
            events,
            hooks,
            source,
            sink,
            lifetime,
            started: AtomicBool::new(false),
            pending_loop: Mutex::new(Some(playback_loop)),
            loop_join: Mutex::new(None),
        }
    }

    /// Spawn the command loop. Idempotent; the second call is a no-op.
    /// Must run inside a tokio runtime.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(playback_loop) = self.pending_loop.lock().unwrap().take() {
            let join = tokio::spawn(playback_loop.run());
            *self.loop_join.lock().unwrap() = Some(join);
            self.hooks.on_started();
        }
    }

    pub async fn enqueue(&self, tracks: Vec<Track>) {
        let tracks = self.hooks.before_enqueue(tracks);
        if tracks.is_empty() {
            return;
        }
        self.send(PlayerCommand::EnqueueTracks(tracks.clone())).await;
        self.hooks.after_enqueue(&tracks);
    }

    pub async fn enqueue_one(&self, track: Track) {
        self.enqueue(vec![track]).await;
    }

    pub async fn play_now(&self, track: Track) {
        let Some(track) = self.hooks.before_play_now(track) else {
            return;
        };
        self.send(PlayerCommand::PlayNow(track.clone())).await;
        self.hooks.after_play_now(&track);
    }

    pub async fn pause(&self) {
        self.send(PlayerCommand::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(PlayerCommand::Resume).await;
    }

    pub async fn skip(&self) {
        self.send(PlayerCommand::Skip).await;
    }

    pub async fn stop(&self) {
        self.send(PlayerCommand::Stop).await;
    }

    pub async fn clear(&self) {
        self.send(PlayerCommand::Clear).await;
    }

    pub fn state(&self) -> PlayerState {
        self.status.state()
    }

    pub fn current_session(&self) -> Option<CurrentSessionInfo> {
        self.status.current_session()
    }

    pub fn elapsed_ms(&self) -> Option<u64> {
        self.status.elapsed_ms()
    }

    pub fn queue_snapshot(&self) -> Vec<Track> {
        self.queue.lock().unwrap().snapshot()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.controls.repeat_mode()
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.controls.set_repeat_mode(mode);
    }

    pub fn shuffle(&self) -> bool {
        self.controls.shuffle()
    }

    pub fn set_shuffle(&self, on: bool) {
        self.controls.set_shuffle(on);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Soft-stop, cancel the loop lifetime, await the loop, and shut down
    /// the pipeline endpoints.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.lifetime.cancel();
        let join = self.loop_join.lock().unwrap().take();
        if let Some(join) = join {
            match join.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    let message = format!("playback loop faulted: {err}");
                    tracing::error!("{message}");
                    self.hooks.on_loop_faulted(&message);
                    self.events.loop_faulted(message);
                }
            }
        }
        if let Err(err) = self.sink.shutdown().await {
            tracing::warn!("sink shutdown failed: {err}");
        }
        if let Err(err) = self.source.shutdown().await {
            tracing::warn!("source shutdown failed: {err}");
        }
    }

    /// Commands to a stopped loop are logged and dropped.
    async fn send(&self, command: PlayerCommand) {
        if self.cmd_tx.send(command).await.is_err() {
            tracing::warn!("player loop is not running; command dropped");
        }
    }
}
