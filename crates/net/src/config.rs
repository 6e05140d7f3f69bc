//! Gateway configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

/// Resource bundle push settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BundleConfig {
    /// Push id echoed back by client responses.
    pub id: String,
    /// Download URL served by the distribution endpoint.
    pub url: String,
    /// Content hash of the bundle build.
    pub hash: String,
    /// Whether the client must accept to stay connected.
    pub required: bool,
    /// Prompt text shown with the push.
    pub prompt: Option<String>,
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Resource bundle to push during configuration; `None` disables the
    /// push entirely.
    pub resource_bundle: Option<BundleConfig>,
    /// How long a push may await acknowledgment before the connection is
    /// closed defensively.
    pub handshake_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            resource_bundle: None,
            handshake_timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on
    /// errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<GatewayConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    GatewayConfig::default()
                }
            },
            Err(err) => {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
                GatewayConfig::default()
            }
        }
    }

    /// Persist configuration (used by the editing tooling).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Handshake timeout as a [`Duration`].
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_bundle() {
        let cfg = GatewayConfig::default();
        assert!(cfg.resource_bundle.is_none());
        assert_eq!(cfg.handshake_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = GatewayConfig::load_from_path(Path::new("/nonexistent/gateway.toml"));
        assert_eq!(cfg, GatewayConfig::default());
    }

    #[test]
    fn parses_bundle_section() {
        let cfg: GatewayConfig = toml::from_str(
            r#"
            handshake_timeout_secs = 30

            [resource_bundle]
            id = "6a1c2f9e-88a0-4d2b-9f50-2f3c4d5e6f70"
            url = "https://packs.example.net/veilcraft.zip"
            hash = "0123456789abcdef0123456789abcdef01234567"
            required = true
            prompt = "Required for custom content"
            "#,
        )
        .unwrap();
        let bundle = cfg.resource_bundle.expect("bundle configured");
        assert!(bundle.required);
        assert_eq!(cfg.handshake_timeout_secs, 30);
    }
}
