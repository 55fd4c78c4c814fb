use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Action server settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_actions_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_actions_bind(),
        }
    }
}

fn default_actions_bind() -> String {
    "0.0.0.0:5055".to_string()
}

/// Chat relay settings.
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_relay_bind")]
    pub bind: String,
    /// REST webhook of the dialogue backend the relay forwards to.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: default_relay_bind(),
            backend_url: default_backend_url(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

fn default_relay_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_backend_url() -> String {
    "http://localhost:5005/webhooks/rest/webhook".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    8
}

/// Record store settings.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Explicit path to the record store CSV. When unset the usual
    /// candidate locations are probed (see the store module).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Load configuration from a TOML file. A missing file is not an error:
/// every setting has a default, so the bot runs unconfigured out of the
/// box and deployments only override what they need.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.relay.timeout_secs == 0 {
        anyhow::bail!("relay.timeout_secs must be > 0");
    }
    if config.relay.backend_url.is_empty() {
        anyhow::bail!("relay.backend_url must not be empty");
    }
    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:5055");
        assert_eq!(config.relay.timeout_secs, 8);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defbot.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[store]\npath = \"/srv/bot/data/radicados.csv\"").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.store.path.as_deref(),
            Some(Path::new("/srv/bot/data/radicados.csv"))
        );
        assert_eq!(
            config.relay.backend_url,
            "http://localhost:5005/webhooks/rest/webhook"
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defbot.toml");
        std::fs::write(&path, "[relay]\ntimeout_secs = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
