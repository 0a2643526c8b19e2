//! Track resolution pipeline.
//!
//! Resolvers turn raw user input into playable tracks; the routing resolver
//! dispatches to the first capable one.

mod cache;
mod local;
mod remote;

pub use cache::RequestCache;
pub use local::LocalFileResolver;
pub use remote::RemoteTrackResolver;

use std::sync::Arc;

use async_trait::async_trait;
use audio_deck_types::{Track, TrackRequest};
use tokio_util::sync::CancellationToken;

use crate::error::ResolveError;

#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Cheap, non-I/O capability check.
    fn can_resolve(&self, request: &TrackRequest) -> bool;

    /// Resolve into zero or more tracks.
    async fn resolve(
        &self,
        request: &TrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Track>, ResolveError>;
}

/// Dispatches to the first inner resolver that can handle the request and
/// yields exclusively from it.
///
/// Order is policy: put remote resolvers before the local file fallback so
/// URLs are not misread as paths.
pub struct RoutingResolver {
    inner: Vec<Arc<dyn TrackResolver>>,
}

impl RoutingResolver {
    pub fn new(inner: Vec<Arc<dyn TrackResolver>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TrackResolver for RoutingResolver {
    fn can_resolve(&self, request: &TrackRequest) -> bool {
        self.inner.iter().any(|r| r.can_resolve(request))
    }

    async fn resolve(
        &self,
        request: &TrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Track>, ResolveError> {
        for resolver in &self.inner {
            if resolver.can_resolve(request) {
                return resolver.resolve(request, cancel).await;
            }
        }
        Err(ResolveError::NoResolver(request.raw.clone()))
    }
}

/// First resolved track, or `None` when resolution yields nothing.
pub async fn resolve_first(
    resolver: &dyn TrackResolver,
    request: &TrackRequest,
    cancel: &CancellationToken,
) -> Result<Option<Track>, ResolveError> {
    let mut tracks = resolver.resolve(request, cancel).await?;
    if tracks.is_empty() {
        Ok(None)
    } else {
        Ok(Some(tracks.remove(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_deck_types::TrackKind;

    struct StubResolver {
        prefix: &'static str,
        kind: TrackKind,
    }

    #[async_trait]
    impl TrackResolver for StubResolver {
        fn can_resolve(&self, request: &TrackRequest) -> bool {
            request.raw.starts_with(self.prefix)
        }

        async fn resolve(
            &self,
            request: &TrackRequest,
            _cancel: &CancellationToken,
        ) -> Result<Vec<Track>, ResolveError> {
            Ok(vec![Track::new(
                request.raw.clone(),
                request.raw.clone(),
                self.kind,
            )])
        }
    }

    fn routing() -> RoutingResolver {
        RoutingResolver::new(vec![
            Arc::new(StubResolver {
                prefix: "https://",
                kind: TrackKind::Remote,
            }),
            Arc::new(StubResolver {
                prefix: "/",
                kind: TrackKind::LocalFile,
            }),
        ])
    }

    #[tokio::test]
    async fn first_capable_resolver_wins() {
        let routing = routing();
        let cancel = CancellationToken::new();

        let local = routing
            .resolve(&TrackRequest::new("/tmp/a.mp3"), &cancel)
            .await
            .unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].kind, TrackKind::LocalFile);
        assert_eq!(local[0].uri, "/tmp/a.mp3");

        let remote = routing
            .resolve(&TrackRequest::new("https://x/y"), &cancel)
            .await
            .unwrap();
        assert_eq!(remote[0].kind, TrackKind::Remote);
    }

    #[tokio::test]
    async fn unhandled_input_reports_no_resolver() {
        let routing = routing();
        let cancel = CancellationToken::new();

        let err = routing
            .resolve(&TrackRequest::new("ftp://nope"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoResolver(raw) if raw == "ftp://nope"));
        assert!(!routing.can_resolve(&TrackRequest::new("ftp://nope")));
    }

    #[tokio::test]
    async fn resolve_first_returns_the_head_emission() {
        let routing = routing();
        let cancel = CancellationToken::new();

        let track = resolve_first(&routing, &TrackRequest::new("/tmp/a.mp3"), &cancel)
            .await
            .unwrap()
            .expect("one track");
        assert_eq!(track.uri, "/tmp/a.mp3");
    }
}
