//! Single-track playback session.
//!
//! Opens a reader from the source, pumps bytes through the pause gate to the
//! sink, retries failed attempts with linear backoff, and reports exactly one
//! result.

use std::sync::Arc;
use std::time::Duration;

use audio_deck_types::{PcmProfile, PlaybackEndResult, Track};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::buffer_pool::BufferPool;
use crate::config::EngineConfig;
use crate::error::{SinkError, SourceError};
use crate::pause_gate::PauseGate;
use crate::sink::AudioSink;
use crate::source::AudioSource;
use crate::status::StatusStore;

const MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl AttemptError {
    fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AttemptError::Source(SourceError::Cancelled) | AttemptError::Sink(SinkError::Cancelled)
        )
    }

    /// Retrying cannot help: the sink is the fault, or the source error is a
    /// static condition like an unrouted track kind.
    fn is_fatal(&self) -> bool {
        match self {
            AttemptError::Sink(SinkError::Cancelled) => false,
            AttemptError::Sink(_) => true,
            AttemptError::Source(err) => err.is_fatal(),
        }
    }
}

pub(crate) struct Session {
    track: Track,
    source: Arc<dyn AudioSource>,
    sink: Arc<dyn AudioSink>,
    gate: Arc<PauseGate>,
    cancel: CancellationToken,
    status: StatusStore,
    pool: Arc<BufferPool>,
    profile: PcmProfile,
    max_attempts: u32,
    retry_base: Duration,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        track: Track,
        source: Arc<dyn AudioSource>,
        sink: Arc<dyn AudioSink>,
        gate: Arc<PauseGate>,
        cancel: CancellationToken,
        status: StatusStore,
        pool: Arc<BufferPool>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            track,
            source,
            sink,
            gate,
            cancel,
            status,
            pool,
            profile: config.profile,
            max_attempts: config.max_attempts,
            retry_base: config.retry_base,
        }
    }

    /// Run the session to completion. Always signals the gate on the way out
    /// so no waiter stays parked.
    pub(crate) async fn run(self) -> PlaybackEndResult {
        let result = self.run_attempts().await;
        self.gate.set();
        result
    }

    async fn run_attempts(&self) -> PlaybackEndResult {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.play_once().await {
                Ok(()) => return PlaybackEndResult::completed(),
                Err(err) if err.is_cancelled() || self.cancel.is_cancelled() => {
                    return PlaybackEndResult::cancelled();
                }
                Err(err) if err.is_fatal() => {
                    tracing::warn!(uri = %self.track.uri, error = %err, "playback failed");
                    return PlaybackEndResult::failed(err.to_string());
                }
                Err(err) => {
                    tracing::warn!(
                        uri = %self.track.uri,
                        attempt,
                        error = %err,
                        "playback attempt failed"
                    );
                    last_error = Some(err.to_string());
                    if attempt < self.max_attempts {
                        let backoff = self.retry_base * attempt;
                        tokio::select! {
                            _ = self.cancel.cancelled() => return PlaybackEndResult::cancelled(),
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            }
        }
        match last_error {
            Some(error) => PlaybackEndResult::failed(error),
            None => PlaybackEndResult::failed("maximum playback attempts reached"),
        }
    }

    async fn play_once(&self) -> Result<(), AttemptError> {
        let mut reader = self.source.open_reader(&self.track, &self.cancel).await?;
        let mut buf = self.pool.acquire();
        let stride = report_stride(&self.profile);
        let mut total: u64 = 0;
        let mut next_report = stride;

        let copied: Result<(), AttemptError> = loop {
            // The gate is checked before each read so a pause strands no
            // partial frame; the write already in flight completes.
            tokio::select! {
                _ = self.cancel.cancelled() => break Err(SourceError::Cancelled.into()),
                _ = self.gate.wait() => {}
            }
            let read = match reader.read(&mut buf[..], &self.cancel).await {
                Ok(read) => read,
                Err(err) => break Err(err.into()),
            };
            if read == 0 {
                break Ok(());
            }
            if let Err(err) = self.sink.write(&buf[..read], &self.cancel).await {
                break Err(err.into());
            }
            total += read as u64;
            if total >= next_report {
                let position_ms = self.profile.position_ms(total);
                self.status.set_elapsed_ms(position_ms);
                tracing::debug!(
                    uri = %self.track.uri,
                    total_bytes = total,
                    position_ms,
                    "playback progress"
                );
                next_report += stride;
            }
        };
        reader.close().await;
        copied?;
        self.sink.complete(&self.cancel).await?;
        self.status.set_elapsed_ms(self.profile.position_ms(total));
        Ok(())
    }
}

/// Progress is reported each 1 MiB or 5 s of audio, whichever is shorter.
fn report_stride(profile: &PcmProfile) -> u64 {
    MEGABYTE.min(profile.bytes_per_second() * 5).max(1)
}
