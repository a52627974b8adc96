// src/ingest/providers/fixture.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::ingest::types::{Article, NewsProvider, ProviderError, SourceId};

use super::{GuardianProvider, NewsApiProvider, NytProvider};

/// What a fixture provider does when asked for articles.
#[derive(Debug, Clone)]
pub enum FixtureBehavior {
    /// Return these articles as-is.
    Articles(Vec<Article>),
    /// Decode a captured upstream body with the real adapter's parser.
    Body(String),
    /// Fail with a simulated error.
    Fail(String),
    /// Panic inside the fetch (exercises the facade's failure boundary).
    Panic,
}

/// Offline stand-in for an upstream provider. Counts calls and remembers
/// the last term so fan-out can be asserted.
pub struct FixtureProvider {
    source: SourceId,
    behavior: FixtureBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_term: Mutex<Option<String>>,
}

impl FixtureProvider {
    pub fn new(source: SourceId, behavior: FixtureBehavior) -> Self {
        Self {
            source,
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            last_term: Mutex::new(None),
        }
    }

    pub fn articles(source: SourceId, articles: Vec<Article>) -> Self {
        Self::new(source, FixtureBehavior::Articles(articles))
    }

    pub fn from_body(source: SourceId, body: impl Into<String>) -> Self {
        Self::new(source, FixtureBehavior::Body(body.into()))
    }

    pub fn failing(source: SourceId, reason: impl Into<String>) -> Self {
        Self::new(source, FixtureBehavior::Fail(reason.into()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_term(&self) -> Option<String> {
        self.last_term
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NewsProvider for FixtureProvider {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch(&self, term: &str) -> Result<Vec<Article>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_term.lock().unwrap_or_else(PoisonError::into_inner) = Some(term.to_string());

        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        match &self.behavior {
            FixtureBehavior::Articles(v) => Ok(v.clone()),
            FixtureBehavior::Body(body) => match self.source {
                SourceId::NewsApi => NewsApiProvider::parse_response(body),
                SourceId::Guardian => GuardianProvider::parse_response(body),
                SourceId::Nyt => NytProvider::parse_response(body),
            },
            FixtureBehavior::Fail(reason) => Err(ProviderError::Simulated(reason.clone())),
            FixtureBehavior::Panic => panic!("fixture provider {} panicked", self.source),
        }
    }
}

/// Providers backed by the captured upstream bodies in `tests/fixtures`,
/// for running the service without credentials or network.
pub fn embedded_fixture_providers() -> Vec<std::sync::Arc<dyn NewsProvider>> {
    let newsapi: &str = include_str!("../../../tests/fixtures/newsapi_everything.json");
    let guardian: &str = include_str!("../../../tests/fixtures/guardian_search.json");
    let nyt: &str = include_str!("../../../tests/fixtures/nyt_articlesearch.json");

    vec![
        std::sync::Arc::new(FixtureProvider::from_body(SourceId::NewsApi, newsapi)),
        std::sync::Arc::new(FixtureProvider::from_body(SourceId::Guardian, guardian)),
        std::sync::Arc::new(FixtureProvider::from_body(SourceId::Nyt, nyt)),
    ]
}
