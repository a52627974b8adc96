// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod facade;
pub mod ingest;
pub mod metrics;
pub mod query;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{AggregateResult, Aggregator, ProviderOutcome, ProviderReport};
pub use crate::api::router;
pub use crate::config::NewsConfig;
pub use crate::facade::{FeedState, NewsFacade, QueryPhase};
pub use crate::ingest::types::{Article, NewsProvider, ProviderError, SourceId, SourceRef};
pub use crate::query::{CanonicalQuery, NewsFilters, QueryMode, SourceSelection};

use std::sync::Arc;

/// Build the aggregator the binary serves: real adapters, or embedded
/// fixtures when `NEWS_TEST_MODE=fixture`.
pub fn build_aggregator(cfg: &NewsConfig) -> anyhow::Result<Aggregator> {
    let fixture_mode = std::env::var("NEWS_TEST_MODE")
        .map(|v| v == "fixture")
        .unwrap_or(false);

    if fixture_mode {
        tracing::warn!("NEWS_TEST_MODE=fixture: serving embedded fixtures, no upstream calls");
        let agg = ingest::providers::embedded_fixture_providers()
            .into_iter()
            .fold(Aggregator::new(), |agg, p| agg.with_provider(p));
        return Ok(agg);
    }

    Aggregator::from_config(cfg)
}

/// Facade over [`build_aggregator`].
pub fn build_facade(cfg: &NewsConfig) -> anyhow::Result<Arc<NewsFacade>> {
    Ok(Arc::new(NewsFacade::new(Arc::new(build_aggregator(cfg)?))))
}
