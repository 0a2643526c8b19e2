//! Source-side contracts: a track as an async PCM byte stream.

use async_trait::async_trait;
use audio_deck_types::Track;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

/// Opens PCM readers for tracks. Implementations produce the engine's fixed
/// profile (48 kHz, stereo, s16le); open failures are retry candidates for
/// the session.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn open_reader(
        &self,
        track: &Track,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn PcmReader>, SourceError>;

    /// Release any long-lived resources held by the source.
    async fn shutdown(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Async byte reader over decoded PCM.
#[async_trait]
pub trait PcmReader: Send {
    /// Read into `buf`; returns 0 at end of stream.
    async fn read(
        &mut self,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<usize, SourceError>;

    /// Stop the backing decoder: bounded grace, then force kill.
    async fn close(&mut self);
}

impl std::fmt::Debug for dyn PcmReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn PcmReader")
    }
}
