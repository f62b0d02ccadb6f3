//! Configuration system for Courier.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $COURIER_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/courier/config.toml
//!   3. ~/.config/courier/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::digest::Digest;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub node: NodeConfig,
    pub identity: IdentityConfig,
    pub exchange: ExchangeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Base URL of the ledger node's RPC control API.
    pub rpc_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to the Ed25519 keypair. Auto-generated on first run.
    pub keypair_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Digest both parties agreed on out-of-band. Absent = the sender
    /// derives it from the artifact file.
    pub expected_digest: Option<Digest>,
    /// How the recipient's observer treats non-matching events.
    pub observer_policy: ObserverPolicy,
}

/// Recipient observation policy.
///
/// The original exchange decides the outcome from the first event observed,
/// whether or not it matches. The scan variant keeps reading until the
/// expected digest appears, for deployments where unrelated transactions
/// share the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObserverPolicy {
    #[default]
    FirstEvent,
    ScanUntilMatch,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            identity: IdentityConfig::default(),
            exchange: ExchangeConfig::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_address: "http://127.0.0.1:10004".to_string(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            keypair_path: config_dir().join("keypair"),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            expected_digest: None,
            observer_policy: ObserverPolicy::default(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("courier")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl CourierConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::file_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path, without env overrides. Missing file
    /// yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(CourierConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("COURIER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&CourierConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply COURIER_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("COURIER_NODE__RPC_ADDRESS") {
            self.node.rpc_address = v;
        }
        if let Ok(v) = std::env::var("COURIER_IDENTITY__KEYPAIR_PATH") {
            self.identity.keypair_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("COURIER_EXCHANGE__EXPECTED_DIGEST") {
            if let Ok(d) = v.parse() {
                self.exchange.expected_digest = Some(d);
            }
        }
        if let Ok(v) = std::env::var("COURIER_EXCHANGE__OBSERVER_POLICY") {
            match v.as_str() {
                "first-event" => self.exchange.observer_policy = ObserverPolicy::FirstEvent,
                "scan-until-match" => self.exchange.observer_policy = ObserverPolicy::ScanUntilMatch,
                _ => {}
            }
        }
    }
}
