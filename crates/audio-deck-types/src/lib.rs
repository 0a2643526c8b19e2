use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// How a track's bytes are obtained.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    LocalFile,
    Remote,
}

/// A playable item. Equality is structural; queue identity is `uri`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub uri: String,
    pub title: String,
    pub kind: TrackKind,
    pub duration_hint: Option<Duration>,
}

impl Track {
    pub fn new(uri: impl Into<String>, title: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            kind,
            duration_hint: None,
        }
    }

    pub fn with_duration_hint(mut self, hint: Duration) -> Self {
        self.duration_hint = Some(hint);
        self
    }
}

/// Raw user input awaiting resolution into tracks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackRequest {
    pub raw: String,
    pub kind_hint: Option<TrackKind>,
}

impl TrackRequest {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            kind_hint: None,
        }
    }

    pub fn with_kind_hint(mut self, hint: TrackKind) -> Self {
        self.kind_hint = Some(hint);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    None,
    One,
    All,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEndReason {
    Completed,
    Cancelled,
    Failed,
}

/// Outcome of a playback session. `error` is set only for `Failed`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackEndResult {
    pub reason: PlaybackEndReason,
    pub details: Option<String>,
    pub error: Option<String>,
}

impl PlaybackEndResult {
    pub fn completed() -> Self {
        Self {
            reason: PlaybackEndReason::Completed,
            details: None,
            error: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            reason: PlaybackEndReason::Cancelled,
            details: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            reason: PlaybackEndReason::Failed,
            details: None,
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.reason == PlaybackEndReason::Completed
    }
}

/// Snapshot of the running session, projected by the playback loop.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentSessionInfo {
    pub track: Track,
    pub state: PlayerState,
    pub started_at: SystemTime,
}

/// The fixed interchange format between source and sink: interleaved
/// little-endian signed PCM.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PcmProfile {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmProfile {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

impl PcmProfile {
    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * (self.bits_per_sample as u64 / 8)
    }

    /// Stream position implied by a byte count.
    pub fn position_ms(&self, total_bytes: u64) -> u64 {
        let bps = self.bytes_per_second();
        if bps == 0 {
            return 0;
        }
        total_bytes.saturating_mul(1000) / bps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_48k_stereo_s16le() {
        let profile = PcmProfile::default();
        assert_eq!(profile.bytes_per_second(), 192_000);
    }

    #[test]
    fn position_tracks_byte_count() {
        let profile = PcmProfile::default();
        assert_eq!(profile.position_ms(0), 0);
        assert_eq!(profile.position_ms(192_000), 1000);
        assert_eq!(profile.position_ms(96_000), 500);
    }

    #[test]
    fn failed_result_carries_error() {
        let result = PlaybackEndResult::failed("boom");
        assert_eq!(result.reason, PlaybackEndReason::Failed);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(PlaybackEndResult::completed().error.is_none());
    }
}
