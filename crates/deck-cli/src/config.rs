//! CLI configuration file loading.
//!
//! Optional TOML file; command-line flags take precedence over file values.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    pub transcoder: Option<String>,
    pub player: Option<String>,
    pub prober: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub queue_capacity: Option<usize>,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<CliConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_fields_and_tolerates_omissions() {
        let cfg = toml::from_str::<CliConfig>(
            r#"
            transcoder = "/opt/ffmpeg/bin/ffmpeg"
            cache_ttl_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(cfg.transcoder.as_deref(), Some("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cfg.cache_ttl_secs, Some(120));
        assert!(cfg.player.is_none());
        assert!(cfg.queue_capacity.is_none());
    }
}
