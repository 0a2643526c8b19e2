//! In-process event bus for player updates.
//!
//! Provides a lightweight broadcast channel for front-end subscriptions.

use audio_deck_types::{PlaybackEndResult, PlayerState, Track};
use tokio::sync::broadcast;

/// Player event payloads published by the playback loop.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    StateChanged(PlayerState),
    TrackChanged(Option<Track>),
    SessionEnded {
        track: Track,
        result: PlaybackEndResult,
    },
    LoopFaulted(String),
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Create a new event bus with a bounded broadcast channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn state_changed(&self, state: PlayerState) {
        let _ = self.sender.send(PlayerEvent::StateChanged(state));
    }

    pub(crate) fn track_changed(&self, track: Option<Track>) {
        let _ = self.sender.send(PlayerEvent::TrackChanged(track));
    }

    pub(crate) fn session_ended(&self, track: Track, result: PlaybackEndResult) {
        let _ = self.sender.send(PlayerEvent::SessionEnded { track, result });
    }

    pub(crate) fn loop_faulted(&self, message: String) {
        let _ = self.sender.send(PlayerEvent::LoopFaulted(message));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
