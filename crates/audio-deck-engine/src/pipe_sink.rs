//! PCM sink backed by a player subprocess (ffplay by default).
//!
//! Bytes go to the child's stdin; suspension of `write` is the engine's
//! back-pressure. Closing stdin is the child's signal to exit.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use audio_deck_types::PcmProfile;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;
use crate::sink::AudioSink;

const CHILD_GRACE: Duration = Duration::from_secs(2);

pub struct PipeSink {
    command: String,
    profile: PcmProfile,
    inner: Mutex<Option<PlayerChild>>,
}

struct PlayerChild {
    child: Child,
    stdin: ChildStdin,
}

/// Argument list for a player consuming raw PCM on stdin.
fn player_args(profile: &PcmProfile) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-nodisp".into(),
        "-autoexit".into(),
        "-f".into(),
        "s16le".into(),
        "-ac".into(),
        profile.channels.to_string(),
        "-ar".into(),
        profile.sample_rate.to_string(),
        "-i".into(),
        "pipe:0".into(),
    ]
}

impl PipeSink {
    pub fn new(profile: PcmProfile) -> Self {
        Self {
            command: "ffplay".to_string(),
            profile,
            inner: Mutex::new(None),
        }
    }

    /// Use a different player binary (name on PATH or full path).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    fn spawn_player(&self) -> Result<PlayerChild, SinkError> {
        let mut child = Command::new(&self.command)
            .args(player_args(&self.profile))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child.stdin.take().ok_or(SinkError::Closed)?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!("player: {line}");
                }
            });
        }
        tracing::debug!(command = %self.command, "player started");
        Ok(PlayerChild { child, stdin })
    }
}

#[async_trait]
impl AudioSink for PipeSink {
    async fn write(&self, data: &[u8], cancel: &CancellationToken) -> Result<(), SinkError> {
        let mut guard = self.inner.lock().await;
        if guard.is_none() {
            *guard = Some(self.spawn_player()?);
        }
        let Some(player) = guard.as_mut() else {
            return Err(SinkError::Closed);
        };
        let written = tokio::select! {
            _ = cancel.cancelled() => return Err(SinkError::Cancelled),
            written = player.stdin.write_all(data) => written,
        };
        if let Err(err) = written {
            // A dead player fails every later track; drop it so the next
            // write respawns.
            if let Some(mut dead) = guard.take() {
                let _ = dead.child.start_kill();
                let _ = dead.child.wait().await;
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn complete(&self, cancel: &CancellationToken) -> Result<(), SinkError> {
        let mut guard = self.inner.lock().await;
        if let Some(player) = guard.as_mut() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(SinkError::Cancelled),
                flushed = player.stdin.flush() => flushed?,
            }
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SinkError> {
        let Some(player) = self.inner.lock().await.take() else {
            return Ok(());
        };
        let PlayerChild {
            mut child,
            mut stdin,
        } = player;
        let _ = stdin.shutdown().await;
        drop(stdin);
        match tokio::time::timeout(CHILD_GRACE, child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!("player did not exit in time; killing");
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }
        Ok(())
    }
}
