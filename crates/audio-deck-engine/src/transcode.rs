//! External transcoder (ffmpeg) as a PCM byte stream.
//!
//! The child decodes any input the transcoder understands and emits the
//! engine profile on stdout; stderr is drained into the log.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use audio_deck_types::{PcmProfile, Track};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::source::{AudioSource, PcmReader};

/// How long a child gets to exit on its own before being killed.
const CHILD_GRACE: Duration = Duration::from_secs(2);

pub struct TranscodeSource {
    command: String,
    profile: PcmProfile,
}

impl TranscodeSource {
    pub fn new(profile: PcmProfile) -> Self {
        Self {
            command: "ffmpeg".to_string(),
            profile,
        }
    }

    /// Use a different transcoder binary (name on PATH or full path).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

/// Argument list for decoding `uri` to raw PCM on stdout.
fn transcode_args(uri: &str, profile: &PcmProfile) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        uri.into(),
        "-vn".into(),
        "-f".into(),
        "s16le".into(),
        "-ac".into(),
        profile.channels.to_string(),
        "-ar".into(),
        profile.sample_rate.to_string(),
        "pipe:1".into(),
    ]
}

#[async_trait]
impl AudioSource for TranscodeSource {
    async fn open_reader(
        &self,
        track: &Track,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn PcmReader>, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        let mut child = Command::new(&self.command)
            .args(transcode_args(&track.uri, &self.profile))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Transcoder("no stdout pipe".into()))?;
        if let Some(stderr) = child.stderr.take() {
            let uri = track.uri.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!(%uri, "transcoder: {line}");
                }
            });
        }
        tracing::debug!(uri = %track.uri, command = %self.command, "transcoder started");
        Ok(Box::new(TranscodeReader {
            child,
            stdout: Some(stdout),
        }))
    }
}

struct TranscodeReader {
    child: Child,
    stdout: Option<ChildStdout>,
}

#[async_trait]
impl PcmReader for TranscodeReader {
    async fn read(
        &mut self,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<usize, SourceError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(0);
        };
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = self.child.start_kill();
                Err(SourceError::Cancelled)
            }
            read = stdout.read(buf) => Ok(read?),
        }
    }

    async fn close(&mut self) {
        // Closing the pipe tells the child to stop producing.
        self.stdout = None;
        match tokio::time::timeout(CHILD_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                if !status.success() {
                    tracing::debug!(%status, "transcoder exited");
                }
            }
            Ok(Err(err)) => tracing::warn!("transcoder wait failed: {err}"),
            Err(_) => {
                tracing::warn!("transcoder did not exit in time; killing");
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_request_the_engine_profile() {
        let args = transcode_args("/music/a.flac", &PcmProfile::default());
        assert_eq!(
            args,
            [
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "/music/a.flac",
                "-vn",
                "-f",
                "s16le",
                "-ac",
                "2",
                "-ar",
                "48000",
                "pipe:1",
            ]
        );
    }
}
