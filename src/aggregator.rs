//! Fan-out to the enabled providers, tolerate failures, merge newest-first.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::counter;
use serde::Serialize;

use crate::config::NewsConfig;
use crate::ingest::providers::{GuardianProvider, NewsApiProvider, NytProvider};
use crate::ingest::types::{Article, NewsProvider, ProviderError, SourceId};
use crate::ingest::{ensure_metrics_described, record_provider_failure};
use crate::query::{CanonicalQuery, SourceSelection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProviderOutcome {
    Ok { articles: usize },
    Failed { reason: String, detail: String },
    TimedOut { after_ms: u64 },
}

impl ProviderOutcome {
    fn from_error(err: &ProviderError) -> Self {
        match err {
            ProviderError::Timeout { after_ms } => ProviderOutcome::TimedOut {
                after_ms: *after_ms,
            },
            other => ProviderOutcome::Failed {
                reason: other.reason().to_string(),
                detail: other.to_string(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, ProviderOutcome::Ok { .. })
    }
}

/// Per-provider diagnostics for one query cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReport {
    pub source: SourceId,
    pub outcome: ProviderOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub articles: Vec<Article>,
    /// At least one provider failed while another delivered articles.
    pub partial_failure: bool,
    /// No articles at all, whether from outages or empty matches.
    pub total_failure: bool,
    pub reports: Vec<ProviderReport>,
}

/// Holds one adapter per provider id and runs query cycles against them.
pub struct Aggregator {
    providers: BTreeMap<SourceId, Arc<dyn NewsProvider>>,
    timeout: Option<Duration>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
            timeout: None,
        }
    }

    /// Build the three real adapters from config, sharing one HTTP client.
    pub fn from_config(cfg: &NewsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("newsfeed-aggregator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .build()?;

        let timeout = (cfg.provider_timeout_ms > 0)
            .then(|| Duration::from_millis(cfg.provider_timeout_ms));

        Ok(Self::new()
            .with_timeout(timeout)
            .with_provider(Arc::new(NewsApiProvider::new(
                http.clone(),
                cfg.endpoint_for(SourceId::NewsApi),
                cfg.key_for(SourceId::NewsApi),
            )))
            .with_provider(Arc::new(GuardianProvider::new(
                http.clone(),
                cfg.endpoint_for(SourceId::Guardian),
                cfg.key_for(SourceId::Guardian),
            )))
            .with_provider(Arc::new(NytProvider::new(
                http,
                cfg.endpoint_for(SourceId::Nyt),
                cfg.key_for(SourceId::Nyt),
            ))))
    }

    /// Register (or replace) the adapter for its source id.
    pub fn with_provider(mut self, provider: Arc<dyn NewsProvider>) -> Self {
        self.providers.insert(provider.source(), provider);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sources(&self) -> Vec<SourceId> {
        self.providers.keys().copied().collect()
    }

    /// Adapters a selection reaches, in invocation order.
    pub fn active_providers(&self, selection: &SourceSelection) -> Vec<Arc<dyn NewsProvider>> {
        self.providers
            .iter()
            .filter(|(id, _)| selection.includes(**id))
            .map(|(_, p)| Arc::clone(p))
            .collect()
    }

    /// Run one query cycle. Never fails: provider errors and timeouts only
    /// shrink the result and show up in `reports`.
    pub async fn run(&self, query: &CanonicalQuery) -> AggregateResult {
        ensure_metrics_described();
        let active = self.active_providers(&query.sources);

        tracing::info!(
            mode = query.mode.as_str(),
            term = %query.term,
            providers = active.len(),
            "dispatching query"
        );

        let settled = join_all(
            active
                .iter()
                .map(|p| settle(p.as_ref(), &query.term, self.timeout)),
        )
        .await;

        let mut articles = Vec::new();
        let mut reports = Vec::with_capacity(settled.len());
        for (mut batch, report) in settled {
            articles.append(&mut batch);
            reports.push(report);
        }

        sort_by_recency(&mut articles);

        let total_failure = articles.is_empty();
        let partial_failure = !total_failure && reports.iter().any(|r| r.outcome.is_failure());
        if total_failure {
            counter!("news_total_failures_total").increment(1);
        }

        tracing::info!(
            mode = query.mode.as_str(),
            articles = articles.len(),
            partial_failure,
            total_failure,
            "query settled"
        );

        AggregateResult {
            articles,
            partial_failure,
            total_failure,
            reports,
        }
    }
}

/// Await one adapter under the optional bound; failures become an empty batch.
async fn settle(
    provider: &dyn NewsProvider,
    term: &str,
    timeout: Option<Duration>,
) -> (Vec<Article>, ProviderReport) {
    let source = provider.source();
    let t0 = Instant::now();

    let res = match timeout {
        Some(limit) => match tokio::time::timeout(limit, provider.fetch(term)).await {
            Ok(r) => r,
            Err(_) => Err(ProviderError::Timeout {
                after_ms: limit.as_millis() as u64,
            }),
        },
        None => provider.fetch(term).await,
    };
    let elapsed_ms = t0.elapsed().as_millis() as u64;

    match res {
        Ok(batch) => {
            tracing::debug!(provider = source.as_str(), articles = batch.len(), elapsed_ms, "provider ok");
            let outcome = ProviderOutcome::Ok {
                articles: batch.len(),
            };
            (batch, ProviderReport { source, outcome, elapsed_ms })
        }
        Err(e) => {
            record_provider_failure(source, &e);
            let outcome = ProviderOutcome::from_error(&e);
            (Vec::new(), ProviderReport { source, outcome, elapsed_ms })
        }
    }
}

/// Newest first; unparseable dates last. Stable, so equal instants keep input order.
pub fn sort_by_recency(articles: &mut [Article]) {
    articles.sort_by(|a, b| match (a.published_instant(), b.published_instant()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
