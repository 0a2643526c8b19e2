//! Kind-based source selection.

use std::sync::Arc;

use async_trait::async_trait;
use audio_deck_types::{Track, TrackKind};
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::source::{AudioSource, PcmReader};

/// Routes `open_reader` to an inner source by track kind, with an optional
/// fallback for unrouted kinds.
#[derive(Default)]
pub struct RoutingAudioSource {
    routes: Vec<(TrackKind, Arc<dyn AudioSource>)>,
    fallback: Option<Arc<dyn AudioSource>>,
}

impl RoutingAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, kind: TrackKind, source: Arc<dyn AudioSource>) -> Self {
        self.routes.push((kind, source));
        self
    }

    pub fn with_fallback(mut self, source: Arc<dyn AudioSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    fn select(&self, kind: TrackKind) -> Option<&Arc<dyn AudioSource>> {
        self.routes
            .iter()
            .find(|(routed, _)| *routed == kind)
            .map(|(_, source)| source)
            .or(self.fallback.as_ref())
    }

    /// All registered sources, deduplicated by identity.
    fn distinct_sources(&self) -> Vec<Arc<dyn AudioSource>> {
        let mut distinct: Vec<Arc<dyn AudioSource>> = Vec::new();
        for source in self
            .routes
            .iter()
            .map(|(_, source)| source)
            .chain(self.fallback.iter())
        {
            if !distinct.iter().any(|seen| Arc::ptr_eq(seen, source)) {
                distinct.push(source.clone());
            }
        }
        distinct
    }
}

#[async_trait]
impl AudioSource for RoutingAudioSource {
    async fn open_reader(
        &self,
        track: &Track,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn PcmReader>, SourceError> {
        match self.select(track.kind) {
            Some(source) => source.open_reader(track, cancel).await,
            None => Err(SourceError::UnsupportedKind(track.kind)),
        }
    }

    /// Shut down each distinct inner source once, collecting failures.
    async fn shutdown(&self) -> Result<(), SourceError> {
        let mut failures = Vec::new();
        for source in self.distinct_sources() {
            if let Err(err) = source.shutdown().await {
                failures.push(err.to_string());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SourceError::Aggregate(failures))
        }
    }
}
