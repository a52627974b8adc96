//! Query facade: the observable loading/error/result state for the presentation layer.
//!
//! Every dispatched query takes the next generation number. When a query
//! settles, its result is applied only if no newer query has been dispatched
//! meanwhile; stale settlements are dropped. Queries are never cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use metrics::counter;
use serde::Serialize;

use crate::aggregator::{AggregateResult, Aggregator};
use crate::ingest::types::Article;
use crate::query::{CanonicalQuery, NewsFilters, SourceSelection, GENERAL_CATEGORY};

pub const MSG_NO_ARTICLES: &str = "No articles found from selected sources";
pub const MSG_SEARCH_FAILED: &str = "Failed to search articles";
pub const MSG_HEADLINES_FAILED: &str = "Failed to load headlines";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPhase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Snapshot of what the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub articles: Vec<Article>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: QueryPhase,
    /// Generation of the query whose result is currently shown (0 = none yet).
    pub generation: u64,
    pub partial_failure: bool,
    /// Category used when an empty search degrades to headlines.
    pub category: String,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            loading: false,
            error: None,
            phase: QueryPhase::Idle,
            generation: 0,
            partial_failure: false,
            category: GENERAL_CATEGORY.to_string(),
        }
    }
}

pub struct NewsFacade {
    aggregator: Arc<Aggregator>,
    shared: Arc<Shared>,
}

/// State plus the dispatch counter; owned jointly by the facade and every
/// in-flight cycle so a settlement lands even if the caller went away.
struct Shared {
    state: RwLock<FeedState>,
    latest: AtomicU64,
}

impl NewsFacade {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            shared: Arc::new(Shared {
                state: RwLock::new(FeedState::default()),
                latest: AtomicU64::new(0),
            }),
        }
    }

    pub fn snapshot(&self) -> FeedState {
        self.shared.snapshot()
    }

    pub fn current_category(&self) -> String {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .category
            .clone()
    }

    /// Keyword search. A blank term degrades to headlines for the current category.
    /// Returns the state after this query settled (or was superseded).
    pub async fn search(&self, term: &str, filters: &NewsFilters) -> FeedState {
        let term = term.trim();
        if term.is_empty() {
            let category = self.current_category();
            let csv = filters.sources_csv();
            return self.headlines(&category, Some(&csv)).await;
        }
        let query = CanonicalQuery::search(term, filters.selection());
        self.dispatch(query, None, MSG_SEARCH_FAILED).await
    }

    /// Category headlines; `sources_csv` is the comma-joined provider filter.
    pub async fn headlines(&self, category: &str, sources_csv: Option<&str>) -> FeedState {
        let category = match category.trim() {
            "" => GENERAL_CATEGORY,
            c => c,
        };
        let query = CanonicalQuery::headlines(category, SourceSelection::from_csv(sources_csv));
        self.dispatch(query, Some(category.to_string()), MSG_HEADLINES_FAILED)
            .await
    }

    async fn dispatch(
        &self,
        query: CanonicalQuery,
        category: Option<String>,
        unexpected_msg: &'static str,
    ) -> FeedState {
        counter!("news_queries_total", "mode" => query.mode.as_str()).increment(1);
        let generation = self.shared.begin(category);

        // The cycle owns its settlement: dropping this future does not
        // cancel the query or leave the state loading.
        let aggregator = Arc::clone(&self.aggregator);
        let shared = Arc::clone(&self.shared);
        let cycle = tokio::spawn(async move {
            let mode = query.mode;
            // Inner task so a panic in the cycle surfaces as a JoinError here.
            let run = tokio::spawn(async move { aggregator.run(&query).await });
            let settled = match run.await {
                Ok(result) => Ok(result),
                Err(e) => {
                    tracing::error!(error = %e, mode = mode.as_str(), "query cycle aborted");
                    Err(unexpected_msg)
                }
            };
            shared.apply(generation, settled);
            shared.snapshot()
        });

        match cycle.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, generation, "settlement task failed");
                self.snapshot()
            }
        }
    }
}

impl Shared {
    fn snapshot(&self) -> FeedState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Enter loading and take the next generation under one write lock.
    fn begin(&self, category: Option<String>) -> u64 {
        let mut st = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        st.loading = true;
        st.error = None;
        st.phase = QueryPhase::Loading;
        if let Some(c) = category {
            st.category = c;
        }
        generation
    }

    fn apply(&self, generation: u64, settled: Result<AggregateResult, &'static str>) {
        let mut st = self.state.write().unwrap_or_else(PoisonError::into_inner);

        // Only the most recently dispatched generation may write.
        let latest = self.latest.load(Ordering::SeqCst);
        if generation != latest {
            tracing::debug!(generation, latest, "discarding stale settlement");
            counter!("news_stale_settlements_total").increment(1);
            return;
        }

        st.loading = false;
        st.generation = generation;
        match settled {
            Ok(result) => {
                st.partial_failure = result.partial_failure;
                st.articles = result.articles;
                if result.total_failure {
                    st.error = Some(MSG_NO_ARTICLES.to_string());
                    st.phase = QueryPhase::Failed;
                } else {
                    st.error = None;
                    st.phase = QueryPhase::Succeeded;
                }
            }
            Err(msg) => {
                st.articles.clear();
                st.partial_failure = false;
                st.error = Some(msg.to_string());
                st.phase = QueryPhase::Failed;
            }
        }
    }
}
