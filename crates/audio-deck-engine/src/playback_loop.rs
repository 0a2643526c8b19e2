//! The playback state machine.
//!
//! A single consumer applies transport commands in channel order; the
//! running session reports its termination back through the same channel, so
//! every state transition happens on the loop task and no cross-task locking
//! is needed.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use audio_deck_types::{PlaybackEndResult, PlayerState, RepeatMode, Track};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::buffer_pool::BufferPool;
use crate::config::EngineConfig;
use crate::events::EventBus;
use crate::pause_gate::PauseGate;
use crate::player::PlayerHooks;
use crate::queue::TrackQueue;
use crate::session::Session;
use crate::sink::AudioSink;
use crate::source::AudioSource;
use crate::status::StatusStore;

/// Commands applied by the loop, in channel order.
#[derive(Debug)]
pub(crate) enum PlayerCommand {
    EnqueueTracks(Vec<Track>),
    PlayNow(Track),
    Pause,
    Resume,
    Skip,
    Stop,
    Clear,
    /// Internal: a started session finished with `result`.
    SessionEnded {
        id: u64,
        track: Track,
        result: PlaybackEndResult,
    },
}

/// Repeat/shuffle knobs shared with the facade. Races are benign: the loop
/// reads them only at dequeue and re-enqueue time.
#[derive(Default)]
pub(crate) struct SharedControls {
    repeat: AtomicU8,
    shuffle: AtomicBool,
}

impl SharedControls {
    pub(crate) fn repeat_mode(&self) -> RepeatMode {
        match self.repeat.load(Ordering::Relaxed) {
            1 => RepeatMode::One,
            2 => RepeatMode::All,
            _ => RepeatMode::None,
        }
    }

    pub(crate) fn set_repeat_mode(&self, mode: RepeatMode) {
        let value = match mode {
            RepeatMode::None => 0,
            RepeatMode::One => 1,
            RepeatMode::All => 2,
        };
        self.repeat.store(value, Ordering::Relaxed);
    }

    pub(crate) fn shuffle(&self) -> bool {
        self.shuffle.load(Ordering::Relaxed)
    }

    pub(crate) fn set_shuffle(&self, on: bool) {
        self.shuffle.store(on, Ordering::Relaxed);
    }
}

struct SessionHandle {
    id: u64,
    gate: Arc<PauseGate>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

pub(crate) struct PlaybackLoop {
    cmd_tx: mpsc::Sender<PlayerCommand>,
    cmd_rx: mpsc::Receiver<PlayerCommand>,
    queue: Arc<Mutex<TrackQueue>>,
    status: StatusStore,
    controls: Arc<SharedControls>,
    events: EventBus,
    hooks: Arc<dyn PlayerHooks>,
    source: Arc<dyn AudioSource>,
    sink: Arc<dyn AudioSink>,
    pool: Arc<BufferPool>,
    config: EngineConfig,
    lifetime: CancellationToken,
    state: PlayerState,
    current: Option<SessionHandle>,
    session_seq: u64,
    skip_pending: bool,
    stop_pending: bool,
    pending_play_now: Option<Track>,
}

impl PlaybackLoop {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        cmd_tx: mpsc::Sender<PlayerCommand>,
        cmd_rx: mpsc::Receiver<PlayerCommand>,
        queue: Arc<Mutex<TrackQueue>>,
        status: StatusStore,
        controls: Arc<SharedControls>,
        events: EventBus,
        hooks: Arc<dyn PlayerHooks>,
        source: Arc<dyn AudioSource>,
        sink: Arc<dyn AudioSink>,
        config: EngineConfig,
        lifetime: CancellationToken,
    ) -> Self {
        let pool = BufferPool::new(config.read_buffer_size);
        Self {
            cmd_tx,
            cmd_rx,
            queue,
            status,
            controls,
            events,
            hooks,
            source,
            sink,
            pool,
            config,
            lifetime,
            state: PlayerState::Idle,
            current: None,
            session_seq: 0,
            skip_pending: false,
            stop_pending: false,
            pending_play_now: None,
        }
    }

    /// Consume commands until the lifetime is cancelled or every sender is
    /// gone.
    pub(crate) async fn run(mut self) {
        loop {
            let command = tokio::select! {
                _ = self.lifetime.cancelled() => break,
                command = self.cmd_rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            self.step(command).await;
        }
        self.teardown().await;
    }

    async fn step(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::EnqueueTracks(tracks) => self.handle_enqueue(tracks),
            PlayerCommand::PlayNow(track) => self.handle_play_now(track),
            PlayerCommand::Pause => self.handle_pause(),
            PlayerCommand::Resume => self.handle_resume(),
            PlayerCommand::Skip => self.handle_skip(),
            PlayerCommand::Stop => self.handle_stop(),
            PlayerCommand::Clear => self.handle_clear(),
            PlayerCommand::SessionEnded { id, track, result } => {
                self.handle_session_ended(id, track, result).await;
            }
        }
        self.autostart();
    }

    fn handle_enqueue(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }
        self.queue.lock().unwrap().enqueue_back(tracks);
        self.rearm_if_stopped();
    }

    fn handle_play_now(&mut self, track: Track) {
        self.queue.lock().unwrap().remove_all_by_uri(&track.uri);
        self.rearm_if_stopped();
        match self.current.as_ref() {
            Some(session) => {
                // Start only after the predecessor's SessionEnded is seen.
                self.pending_play_now = Some(track);
                session.cancel.cancel();
            }
            None => self.start_track(track),
        }
    }

    fn handle_pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        let Some(session) = self.current.as_ref() else {
            return;
        };
        session.gate.reset();
        self.set_state(PlayerState::Paused);
    }

    fn handle_resume(&mut self) {
        if self.state != PlayerState::Paused {
            return;
        }
        let Some(session) = self.current.as_ref() else {
            return;
        };
        session.gate.set();
        self.set_state(PlayerState::Playing);
    }

    fn handle_skip(&mut self) {
        if let Some(session) = self.current.as_ref() {
            self.skip_pending = true;
            session.cancel.cancel();
        }
    }

    fn handle_stop(&mut self) {
        self.queue.lock().unwrap().clear();
        self.pending_play_now = None;
        match self.current.as_ref() {
            Some(session) => {
                self.stop_pending = true;
                session.cancel.cancel();
            }
            None => self.set_state(PlayerState::Stopped),
        }
    }

    fn handle_clear(&mut self) {
        self.queue.lock().unwrap().clear();
    }

    async fn handle_session_ended(&mut self, id: u64, track: Track, result: PlaybackEndResult) {
        let finished_by_skip = self.skip_pending;
        self.skip_pending = false;

        match self.current.take() {
            Some(session) if session.id == id => {
                // The report send is the task's last act, so this join
                // resolves immediately.
                if let Err(err) = session.join.await {
                    tracing::error!("session task failed: {err}");
                }
            }
            Some(session) => {
                tracing::warn!(session = id, "stale session end ignored");
                self.current = Some(session);
                return;
            }
            None => {
                tracing::warn!(session = id, "session end without a live session");
                return;
            }
        }

        self.status.on_session_released();
        self.hooks.on_session_ended(&track, &result);
        self.events.session_ended(track.clone(), result.clone());

        if result.is_completed() && !finished_by_skip {
            match self.controls.repeat_mode() {
                RepeatMode::One => self.queue.lock().unwrap().enqueue_front(track),
                RepeatMode::All => self.queue.lock().unwrap().enqueue_back([track]),
                RepeatMode::None => {}
            }
        }

        if let Some(next) = self.pending_play_now.take() {
            self.stop_pending = false;
            self.start_track(next);
            return;
        }
        if self.stop_pending {
            self.stop_pending = false;
            self.set_state(PlayerState::Stopped);
        }
    }

    /// After every command: keep playing while there is work and we are not
    /// stopped; fall back to idle when the queue drains.
    fn autostart(&mut self) {
        if self.current.is_some() || self.state == PlayerState::Stopped {
            return;
        }
        let next = self
            .queue
            .lock()
            .unwrap()
            .dequeue_next(self.controls.shuffle());
        match next {
            Some(track) => self.start_track(track),
            None => {
                if matches!(self.state, PlayerState::Playing | PlayerState::Paused) {
                    self.hooks.on_track_changed(None);
                    self.events.track_changed(None);
                    self.set_state(PlayerState::Idle);
                }
            }
        }
    }

    fn start_track(&mut self, track: Track) {
        self.session_seq += 1;
        let id = self.session_seq;
        let gate = Arc::new(PauseGate::new(true));
        let cancel = self.lifetime.child_token();
        let started_at = SystemTime::now();

        self.status.on_track_started(track.clone(), started_at);
        self.set_state(PlayerState::Playing);
        self.hooks.on_track_changed(Some(&track));
        self.events.track_changed(Some(track.clone()));

        let session = Session::new(
            track.clone(),
            self.source.clone(),
            self.sink.clone(),
            gate.clone(),
            cancel.clone(),
            self.status.clone(),
            self.pool.clone(),
            &self.config,
        );
        let cmd_tx = self.cmd_tx.clone();
        let join = tokio::spawn(async move {
            let result = session.run().await;
            let ended = PlayerCommand::SessionEnded { id, track, result };
            if cmd_tx.send(ended).await.is_err() {
                tracing::debug!(session = id, "loop gone before session end report");
            }
        });

        tracing::debug!(session = id, "session started");
        self.current = Some(SessionHandle {
            id,
            gate,
            cancel,
            join,
        });
    }

    /// An enqueue or play-now while stopped re-arms the loop; the visible
    /// transition is Stopped -> Playing via the new session.
    fn rearm_if_stopped(&mut self) {
        if self.state == PlayerState::Stopped && self.current.is_none() {
            self.state = PlayerState::Idle;
            self.status.set_state(PlayerState::Idle);
        }
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.status.set_state(state);
        self.hooks.on_state_changed(state);
        self.events.state_changed(state);
    }

    async fn teardown(&mut self) {
        if let Some(session) = self.current.take() {
            session.cancel.cancel();
            session.gate.set();
            if let Err(err) = session.join.await {
                tracing::error!("session task failed during teardown: {err}");
            }
        }
        self.status.on_session_released();
    }
}
