//! TTL cache for resolver probe results.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use audio_deck_types::Track;

/// Maps an opaque resolver key to tracks with a per-entry TTL. A resolver
/// with a hit may skip its probe I/O entirely.
#[derive(Default)]
pub struct RequestCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    tracks: Vec<Track>,
    expires_at: Instant,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_get(&self, key: &str) -> Option<Vec<Track>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.tracks.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `tracks` under `key` for `ttl`. A zero TTL disables storage.
    pub fn set(&self, key: &str, tracks: Vec<Track>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            tracks,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_deck_types::TrackKind;

    fn tracks() -> Vec<Track> {
        vec![Track::new("u", "t", TrackKind::Remote)]
    }

    #[test]
    fn hit_within_ttl() {
        let cache = RequestCache::new();
        cache.set("k", tracks(), Duration::from_secs(60));
        assert_eq!(cache.try_get("k"), Some(tracks()));
        assert_eq!(cache.try_get("other"), None);
    }

    #[test]
    fn zero_ttl_disables_storage() {
        let cache = RequestCache::new();
        cache.set("k", tracks(), Duration::ZERO);
        assert_eq!(cache.try_get("k"), None);
    }

    #[test]
    fn entries_expire() {
        let cache = RequestCache::new();
        cache.set("k", tracks(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.try_get("k"), None);
    }
}
