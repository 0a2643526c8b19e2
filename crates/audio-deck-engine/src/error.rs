//! Error types at the engine's seams.
//!
//! Cancellation is modelled as a variant so sessions can fold it into a
//! `Cancelled` end result instead of a failure.

use audio_deck_types::TrackKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("playback cancelled")]
    Cancelled,
    #[error("no audio source registered for {0:?} tracks")]
    UnsupportedKind(TrackKind),
    #[error("transcoder: {0}")]
    Transcoder(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("source shutdown failed: {}", .0.join("; "))]
    Aggregate(Vec<String>),
}

impl SourceError {
    /// Fatal errors cannot change between attempts; sessions fail on them
    /// without retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SourceError::UnsupportedKind(_) | SourceError::Aggregate(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("playback cancelled")]
    Cancelled,
    #[error("sink process is not running")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no resolver accepts {0:?}")]
    NoResolver(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("resolution cancelled")]
    Cancelled,
    #[error("metadata probe failed: {0}")]
    Probe(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
