use std::time::Duration;

use audio_deck_types::PcmProfile;

/// Tunables for the playback loop and its sessions.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Command channel capacity.
    pub queue_capacity: usize,
    /// Attempts per track before a session reports failure.
    pub max_attempts: u32,
    /// Linear backoff base between attempts.
    pub retry_base: Duration,
    /// Size of the pooled transfer buffers.
    pub read_buffer_size: usize,
    /// Interchange format between source and sink.
    pub profile: PcmProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_attempts: 3,
            retry_base: Duration::from_millis(200),
            read_buffer_size: 80 * 1024,
            profile: PcmProfile::default(),
        }
    }
}
