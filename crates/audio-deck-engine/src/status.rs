//! Shared playback status snapshot.
//!
//! Updated by the playback loop and by session progress reporting; backs the
//! facade's read-only properties.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use audio_deck_types::{CurrentSessionInfo, PlayerState, Track};

#[derive(Clone, Debug, Default)]
pub struct PlayerStatus {
    pub state: PlayerState,
    pub current: Option<CurrentSessionInfo>,
    pub elapsed_ms: Option<u64>,
}

/// Snapshot store shared between the loop, sessions, and front-ends.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<Mutex<PlayerStatus>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PlayerStatus {
        self.inner.lock().unwrap().clone()
    }

    pub fn state(&self) -> PlayerState {
        self.inner.lock().unwrap().state
    }

    pub fn current_session(&self) -> Option<CurrentSessionInfo> {
        self.inner.lock().unwrap().current.clone()
    }

    pub fn elapsed_ms(&self) -> Option<u64> {
        self.inner.lock().unwrap().elapsed_ms
    }

    pub(crate) fn set_state(&self, state: PlayerState) {
        let mut status = self.inner.lock().unwrap();
        status.state = state;
        if let Some(current) = status.current.as_mut() {
            current.state = state;
        }
    }

    pub(crate) fn on_track_started(&self, track: Track, started_at: SystemTime) {
        let mut status = self.inner.lock().unwrap();
        status.state = PlayerState::Playing;
        status.elapsed_ms = Some(0);
        status.current = Some(CurrentSessionInfo {
            track,
            state: PlayerState::Playing,
            started_at,
        });
    }

    pub(crate) fn on_session_released(&self) {
        let mut status = self.inner.lock().unwrap();
        status.current = None;
        status.elapsed_ms = None;
    }

    pub(crate) fn set_elapsed_ms(&self, elapsed_ms: u64) {
        self.inner.lock().unwrap().elapsed_ms = Some(elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_deck_types::TrackKind;

    #[test]
    fn track_start_and_release_round_trip() {
        let store = StatusStore::new();
        assert_eq!(store.state(), PlayerState::Idle);
        assert!(store.current_session().is_none());

        let track = Track::new("/a", "a", TrackKind::LocalFile);
        store.on_track_started(track.clone(), SystemTime::now());
        assert_eq!(store.state(), PlayerState::Playing);
        assert_eq!(store.current_session().unwrap().track, track);
        assert_eq!(store.elapsed_ms(), Some(0));

        store.set_state(PlayerState::Paused);
        let current = store.current_session().unwrap();
        assert_eq!(current.state, PlayerState::Paused);

        store.on_session_released();
        assert!(store.current_session().is_none());
        assert!(store.elapsed_ms().is_none());
    }
}
