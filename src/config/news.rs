// src/config/news.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::providers::{guardian, newsapi, nyt};
use crate::ingest::types::SourceId;

pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const ENV_GUARDIAN_KEY: &str = "GUARDIAN_KEY";
pub const ENV_NYT_KEY: &str = "NYT_KEY";
pub const ENV_TIMEOUT_MS: &str = "NEWS_PROVIDER_TIMEOUT_MS";
pub const ENV_BIND_ADDR: &str = "NEWS_BIND_ADDR";

fn default_timeout_ms() -> u64 {
    8_000
}
fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Per-provider credentials. Empty keys are allowed; the upstream rejects the
/// request and the failure is absorbed like any other.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderKeys {
    #[serde(default)]
    pub newsapi: String,
    #[serde(default)]
    pub guardian: String,
    #[serde(default)]
    pub nyt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    #[serde(default = "default_newsapi_base")]
    pub newsapi: String,
    #[serde(default = "default_guardian_base")]
    pub guardian: String,
    #[serde(default = "default_nyt_base")]
    pub nyt: String,
}

/// Keys never appear in `{:?}` output, only whether each one is set.
impl fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &str| if k.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("ProviderKeys")
            .field("newsapi", &mask(&self.newsapi))
            .field("guardian", &mask(&self.guardian))
            .field("nyt", &mask(&self.nyt))
            .finish()
    }
}

fn default_newsapi_base() -> String {
    newsapi::DEFAULT_BASE_URL.to_string()
}
fn default_guardian_base() -> String {
    guardian::DEFAULT_BASE_URL.to_string()
}
fn default_nyt_base() -> String {
    nyt::DEFAULT_BASE_URL.to_string()
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            newsapi: default_newsapi_base(),
            guardian: default_guardian_base(),
            nyt: default_nyt_base(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default)]
    pub keys: ProviderKeys,
    #[serde(default)]
    pub endpoints: ProviderEndpoints,
    /// Upper bound for a single provider call; 0 disables the bound.
    #[serde(default = "default_timeout_ms")]
    pub provider_timeout_ms: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            keys: ProviderKeys::default(),
            endpoints: ProviderEndpoints::default(),
            provider_timeout_ms: default_timeout_ms(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl NewsConfig {
    pub fn key_for(&self, id: SourceId) -> &str {
        match id {
            SourceId::NewsApi => &self.keys.newsapi,
            SourceId::Guardian => &self.keys.guardian,
            SourceId::Nyt => &self.keys.nyt,
        }
    }

    pub fn endpoint_for(&self, id: SourceId) -> &str {
        match id {
            SourceId::NewsApi => &self.endpoints.newsapi,
            SourceId::Guardian => &self.endpoints.guardian,
            SourceId::Nyt => &self.endpoints.nyt,
        }
    }

    /// Environment values win over file values when set and non-empty.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_non_empty(ENV_NEWSAPI_KEY) {
            self.keys.newsapi = v;
        }
        if let Some(v) = env_non_empty(ENV_GUARDIAN_KEY) {
            self.keys.guardian = v;
        }
        if let Some(v) = env_non_empty(ENV_NYT_KEY) {
            self.keys.nyt = v;
        }
        if let Some(v) = env_non_empty(ENV_TIMEOUT_MS) {
            self.provider_timeout_ms = v
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_MS} must be an integer, got {v:?}"))?;
        }
        if let Some(v) = env_non_empty(ENV_BIND_ADDR) {
            self.bind_addr = v;
        }
        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<NewsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading news config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks, then apply env overrides:
/// 1) $NEWS_CONFIG_PATH
/// 2) config/news.toml
/// 3) config/news.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<NewsConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else {
        let toml_p = PathBuf::from("config/news.toml");
        let json_p = PathBuf::from("config/news.json");
        if toml_p.exists() {
            load_config_from(&toml_p)?
        } else if json_p.exists() {
            load_config_from(&json_p)?
        } else {
            NewsConfig::default()
        }
    };
    cfg.apply_env_overrides()?;
    Ok(cfg)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<NewsConfig> {
    match hint_ext {
        "toml" => toml::from_str(s).context("parsing news config toml"),
        "json" => serde_json::from_str(s).context("parsing news config json"),
        _ => serde_json::from_str(s)
            .or_else(|_| toml::from_str(s))
            .map_err(|_| anyhow!("unsupported news config format")),
    }
}
