//! Remote media resolver backed by an external prober.
//!
//! Shells out to yt-dlp for titles, durations, and the direct media URL, so
//! the transcoder can ingest remote tracks with the same contract as local
//! files. Probe results may be cached with a TTL.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use audio_deck_types::{Track, TrackKind, TrackRequest};
use serde_json::Value;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::TrackResolver;
use super::cache::RequestCache;
use crate::error::ResolveError;

pub struct RemoteTrackResolver {
    command: String,
    cache: Option<Arc<RequestCache>>,
    cache_ttl: Duration,
}

impl RemoteTrackResolver {
    pub fn new() -> Self {
        Self {
            command: "yt-dlp".to_string(),
            cache: None,
            cache_ttl: Duration::ZERO,
        }
    }

    /// Use a different prober binary (name on PATH or full path).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Cache probe results for `ttl`; a zero TTL disables caching.
    pub fn with_cache(mut self, cache: Arc<RequestCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    async fn probe(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Track>, ResolveError> {
        let child = Command::new(&self.command)
            .args(["-J", "-f", "bestaudio/best", "--no-warnings", url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let output = tokio::select! {
            // Dropping the wait future kills the child (kill_on_drop).
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            output = child.wait_with_output() => output?,
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Probe(stderr.trim().to_string()));
        }
        let json: Value = serde_json::from_slice(&output.stdout)?;
        Ok(tracks_from_probe(&json, url))
    }
}

impl Default for RemoteTrackResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a probe document (single item or playlist) into tracks.
fn tracks_from_probe(json: &Value, fallback_uri: &str) -> Vec<Track> {
    match json.get("entries").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .filter_map(|entry| track_from_entry(entry, None))
            .collect(),
        None => track_from_entry(json, Some(fallback_uri))
            .into_iter()
            .collect(),
    }
}

fn track_from_entry(entry: &Value, fallback_uri: Option<&str>) -> Option<Track> {
    let uri = entry
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| entry.get("webpage_url").and_then(Value::as_str))
        .or(fallback_uri)?
        .to_string();
    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uri.clone());
    let mut track = Track::new(uri, title, TrackKind::Remote);
    if let Some(seconds) = entry.get("duration").and_then(Value::as_f64) {
        if seconds.is_finite() && seconds > 0.0 {
            track = track.with_duration_hint(Duration::from_secs_f64(seconds));
        }
    }
    Some(track)
}

#[async_trait]
impl TrackResolver for RemoteTrackResolver {
    fn can_resolve(&self, request: &TrackRequest) -> bool {
        match request.kind_hint {
            Some(TrackKind::Remote) => true,
            Some(TrackKind::LocalFile) => false,
            None => {
                request.raw.starts_with("http://") || request.raw.starts_with("https://")
            }
        }
    }

    async fn resolve(
        &self,
        request: &TrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Track>, ResolveError> {
        if let Some(cache) = &self.cache {
            if let Some(tracks) = cache.try_get(&request.raw) {
                tracing::debug!(url = %request.raw, "probe cache hit");
                return Ok(tracks);
            }
        }
        let tracks = self.probe(&request.raw, cancel).await?;
        if let Some(cache) = &self.cache {
            cache.set(&request.raw, tracks.clone(), self.cache_ttl);
        }
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_only() {
        let resolver = RemoteTrackResolver::new();
        assert!(resolver.can_resolve(&TrackRequest::new("https://x/y")));
        assert!(resolver.can_resolve(&TrackRequest::new("http://x/y")));
        assert!(!resolver.can_resolve(&TrackRequest::new("/tmp/a.mp3")));
        assert!(resolver.can_resolve(
            &TrackRequest::new("anything").with_kind_hint(TrackKind::Remote)
        ));
    }

    #[test]
    fn single_probe_yields_one_track() {
        let json = json!({
            "title": "A Song",
            "url": "https://cdn/stream.m4a",
            "duration": 245.3,
        });

        let tracks = tracks_from_probe(&json, "https://page/watch");

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri, "https://cdn/stream.m4a");
        assert_eq!(tracks[0].title, "A Song");
        assert_eq!(tracks[0].kind, TrackKind::Remote);
        assert_eq!(tracks[0].duration_hint, Some(Duration::from_secs_f64(245.3)));
    }

    #[test]
    fn playlist_probe_yields_every_entry() {
        let json = json!({
            "entries": [
                { "title": "One", "url": "https://cdn/1" },
                { "title": "Two", "webpage_url": "https://page/2" },
                { "no_uri_at_all": true },
            ],
        });

        let tracks = tracks_from_probe(&json, "https://page/playlist");

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].uri, "https://cdn/1");
        assert_eq!(tracks[1].uri, "https://page/2");
    }

    #[test]
    fn probe_without_uri_falls_back_to_the_request() {
        let json = json!({ "title": "Untitled" });
        let tracks = tracks_from_probe(&json, "https://page/watch");
        assert_eq!(tracks[0].uri, "https://page/watch");
    }

    #[tokio::test]
    async fn cache_hit_skips_the_probe() {
        let cache = Arc::new(RequestCache::new());
        let cached = vec![Track::new("https://cdn/1", "One", TrackKind::Remote)];
        cache.set("https://page/watch", cached.clone(), Duration::from_secs(60));
        // A bogus command proves the probe is never spawned on a hit.
        let resolver = RemoteTrackResolver::new()
            .with_command("/nonexistent/prober")
            .with_cache(cache, Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let tracks = resolver
            .resolve(&TrackRequest::new("https://page/watch"), &cancel)
            .await
            .unwrap();
        assert_eq!(tracks, cached);
    }
}
