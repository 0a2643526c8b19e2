//! Sink-side contract: a back-pressuring PCM consumer.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;

#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Consume `data` fully. Suspension of this call is the engine's
    /// back-pressure: the copy loop stalls until the sink drains.
    async fn write(&self, data: &[u8], cancel: &CancellationToken) -> Result<(), SinkError>;

    /// Per-track flush hook.
    async fn complete(&self, _cancel: &CancellationToken) -> Result<(), SinkError> {
        Ok(())
    }

    /// Flush and close, waiting bounded for any child process.
    async fn shutdown(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
