// src/ingest/types.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream news provider identity. Ordering is the adapter invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    NewsApi,
    Guardian,
    Nyt,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::NewsApi, SourceId::Guardian, SourceId::Nyt];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::NewsApi => "newsapi",
            SourceId::Guardian => "guardian",
            SourceId::Nyt => "nyt",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::NewsApi => "NewsAPI.org",
            SourceId::Guardian => "The Guardian",
            SourceId::Nyt => "New York Times",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown news source id: {0:?}")]
pub struct UnknownSource(pub String);

impl FromStr for SourceId {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownSource(t.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: SourceId,
    pub name: String,
}

impl From<SourceId> for SourceRef {
    fn from(id: SourceId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
        }
    }
}

/// Normalized article, identical in shape regardless of the provider it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Raw timestamp as the provider sent it; see [`Article::published_instant`].
    pub published_at: String,
    pub source: SourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Article {
    /// Parse `published_at` into a comparable instant. Accepts RFC 3339,
    /// NYT-style `+0000` offsets and bare dates. Anything else is `None`.
    pub fn published_instant(&self) -> Option<DateTime<Utc>> {
        parse_published_at(&self.published_at)
    }
}

pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Empty or whitespace-only strings become `None`.
pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("response shape mismatch: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no response within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("invalid endpoint {0}")]
    Endpoint(String),

    #[error("simulated failure: {0}")]
    Simulated(String),
}

impl ProviderError {
    /// Short label for metrics and reports.
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::Transport(_) => "transport",
            ProviderError::Status { .. } => "status",
            ProviderError::Decode(_) => "decode",
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::Endpoint(_) => "endpoint",
            ProviderError::Simulated(_) => "simulated",
        }
    }
}

/// One upstream news API. Implementations issue exactly one request per call
/// and never retry; the caller decides how failures are absorbed.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn source(&self) -> SourceId;

    async fn fetch(&self, term: &str) -> Result<Vec<Article>, ProviderError>;
}
