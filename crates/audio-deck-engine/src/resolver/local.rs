//! Local filesystem resolver.

use std::path::Path;

use async_trait::async_trait;
use audio_deck_types::{Track, TrackKind, TrackRequest};
use tokio_util::sync::CancellationToken;

use super::TrackResolver;
use crate::error::ResolveError;

/// Treats any non-URL input as a path on the local filesystem.
#[derive(Default)]
pub struct LocalFileResolver;

impl LocalFileResolver {
    pub fn new() -> Self {
        Self
    }
}

fn looks_like_url(raw: &str) -> bool {
    raw.contains("://")
}

#[async_trait]
impl TrackResolver for LocalFileResolver {
    fn can_resolve(&self, request: &TrackRequest) -> bool {
        match request.kind_hint {
            Some(TrackKind::LocalFile) => true,
            Some(TrackKind::Remote) => false,
            None => !looks_like_url(&request.raw),
        }
    }

    async fn resolve(
        &self,
        request: &TrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Track>, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let path = Path::new(&request.raw);
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| ResolveError::NotFound(request.raw.clone()))?;
        if !metadata.is_file() {
            return Err(ResolveError::NotFound(request.raw.clone()));
        }
        let title = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&request.raw)
            .to_string();
        Ok(vec![Track::new(
            request.raw.clone(),
            title,
            TrackKind::LocalFile,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_not_paths() {
        let resolver = LocalFileResolver::new();
        assert!(resolver.can_resolve(&TrackRequest::new("/tmp/a.mp3")));
        assert!(resolver.can_resolve(&TrackRequest::new("relative/b.flac")));
        assert!(!resolver.can_resolve(&TrackRequest::new("https://x/y")));
    }

    #[test]
    fn kind_hint_overrides_detection() {
        let resolver = LocalFileResolver::new();
        assert!(resolver.can_resolve(
            &TrackRequest::new("https://x/y").with_kind_hint(TrackKind::LocalFile)
        ));
        assert!(!resolver
            .can_resolve(&TrackRequest::new("/tmp/a.mp3").with_kind_hint(TrackKind::Remote)));
    }

    #[tokio::test]
    async fn resolves_an_existing_file_with_its_stem_as_title() {
        let file = tempfile::Builder::new()
            .suffix(".mp3")
            .tempfile()
            .unwrap();
        let raw = file.path().to_str().unwrap().to_string();
        let resolver = LocalFileResolver::new();
        let cancel = CancellationToken::new();

        let tracks = resolver
            .resolve(&TrackRequest::new(raw.clone()), &cancel)
            .await
            .unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri, raw);
        assert_eq!(tracks[0].kind, TrackKind::LocalFile);
        assert!(!tracks[0].title.ends_with(".mp3"));
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let resolver = LocalFileResolver::new();
        let cancel = CancellationToken::new();

        let err = resolver
            .resolve(&TrackRequest::new("/definitely/not/here.flac"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }
}
