//! Ordered track queue with sequential or random dequeue.

use std::collections::VecDeque;

use audio_deck_types::Track;
use rand::Rng;

/// Pending tracks. The playback loop is the sole mutator; other readers go
/// through the surrounding lock and `snapshot`.
#[derive(Debug, Default)]
pub struct TrackQueue {
    items: VecDeque<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_back(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.items.extend(tracks);
    }

    /// Make `track` the next sequential dequeue.
    pub fn enqueue_front(&mut self, track: Track) {
        self.items.push_front(track);
    }

    /// Remove and return the next track. `shuffle` picks uniformly at random
    /// from the remaining set instead of taking the front.
    pub fn dequeue_next(&mut self, shuffle: bool) -> Option<Track> {
        if self.items.is_empty() {
            return None;
        }
        if shuffle && self.items.len() > 1 {
            let index = rand::thread_rng().gen_range(0..self.items.len());
            self.items.remove(index)
        } else {
            self.items.pop_front()
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop every entry with a matching uri, preserving the order of the
    /// survivors.
    pub fn remove_all_by_uri(&mut self, uri: &str) {
        self.items.retain(|track| track.uri != uri);
    }

    pub fn snapshot(&self) -> Vec<Track> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
