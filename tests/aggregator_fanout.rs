// tests/aggregator_fanout.rs
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use newsfeed_aggregator::ingest::providers::FixtureProvider;
use newsfeed_aggregator::{
    Aggregator, Article, CanonicalQuery, ProviderOutcome, SourceId, SourceSelection,
};

fn article(source: SourceId, n: u32, ts: &str) -> Article {
    Article {
        title: format!("{source} #{n}"),
        description: String::new(),
        url: format!("https://{source}.test/{n}"),
        image_url: None,
        published_at: ts.to_string(),
        source: source.into(),
        author: None,
        content: None,
    }
}

fn batch(source: SourceId, count: u32, day_offset: u32) -> Vec<Article> {
    (0..count)
        .map(|n| {
            let ts = format!("2024-06-{:02}T{:02}:00:00Z", 1 + day_offset, n);
            article(source, n, &ts)
        })
        .collect()
}

struct Harness {
    newsapi: Arc<FixtureProvider>,
    guardian: Arc<FixtureProvider>,
    nyt: Arc<FixtureProvider>,
    agg: Aggregator,
}

fn harness(newsapi: FixtureProvider, guardian: FixtureProvider, nyt: FixtureProvider) -> Harness {
    let newsapi = Arc::new(newsapi);
    let guardian = Arc::new(guardian);
    let nyt = Arc::new(nyt);
    let agg = Aggregator::new()
        .with_provider(newsapi.clone())
        .with_provider(guardian.clone())
        .with_provider(nyt.clone());
    Harness {
        newsapi,
        guardian,
        nyt,
        agg,
    }
}

fn all_ok() -> Harness {
    harness(
        FixtureProvider::articles(SourceId::NewsApi, batch(SourceId::NewsApi, 2, 0)),
        FixtureProvider::articles(SourceId::Guardian, batch(SourceId::Guardian, 2, 1)),
        FixtureProvider::articles(SourceId::Nyt, batch(SourceId::Nyt, 2, 2)),
    )
}

fn only(ids: &[SourceId]) -> SourceSelection {
    SourceSelection::Only(ids.iter().copied().collect::<BTreeSet<_>>())
}

#[tokio::test]
async fn enabled_sources_are_exactly_the_ones_invoked() {
    let h = all_ok();
    let q = CanonicalQuery::search("x", only(&[SourceId::Guardian, SourceId::Nyt]));
    let res = h.agg.run(&q).await;

    assert_eq!(h.newsapi.calls(), 0);
    assert_eq!(h.guardian.calls(), 1);
    assert_eq!(h.nyt.calls(), 1);
    assert_eq!(res.articles.len(), 4);
    assert!(res
        .articles
        .iter()
        .all(|a| a.source.id != SourceId::NewsApi));
    let reported: Vec<SourceId> = res.reports.iter().map(|r| r.source).collect();
    assert_eq!(reported, vec![SourceId::Guardian, SourceId::Nyt]);
}

#[tokio::test]
async fn empty_selection_invokes_all_three_with_same_term() {
    let h = all_ok();
    let q = CanonicalQuery::search("solar", BTreeSet::<SourceId>::new().into());
    let res = h.agg.run(&q).await;

    for p in [&h.newsapi, &h.guardian, &h.nyt] {
        assert_eq!(p.calls(), 1);
        assert_eq!(p.last_term().as_deref(), Some("solar"));
    }
    assert_eq!(res.articles.len(), 6);
    assert!(!res.total_failure);
    assert!(!res.partial_failure);
}

#[tokio::test]
async fn selection_of_only_unknown_ids_invokes_nothing() {
    let h = all_ok();
    let q = CanonicalQuery::search("x", SourceSelection::from_csv(Some("bbc,cnn")));
    let res = h.agg.run(&q).await;

    assert_eq!(h.newsapi.calls() + h.guardian.calls() + h.nyt.calls(), 0);
    assert!(res.articles.is_empty());
    assert!(res.total_failure);
}

#[tokio::test]
async fn climate_query_survives_guardian_failure() {
    // 5 NewsAPI + failing Guardian + 3 NYT
    let h = harness(
        FixtureProvider::articles(SourceId::NewsApi, batch(SourceId::NewsApi, 5, 0)),
        FixtureProvider::failing(SourceId::Guardian, "HTTP 401"),
        FixtureProvider::articles(SourceId::Nyt, batch(SourceId::Nyt, 3, 3)),
    );
    let q = CanonicalQuery::search("climate", SourceSelection::All);
    let res = h.agg.run(&q).await;

    assert_eq!(res.articles.len(), 8);
    assert!(!res.total_failure);
    assert!(res.partial_failure);
    assert!(res
        .articles
        .iter()
        .all(|a| a.source.id != SourceId::Guardian));

    // newest first
    for pair in res.articles.windows(2) {
        assert!(pair[0].published_instant() >= pair[1].published_instant());
    }
    assert_eq!(res.articles[0].source.id, SourceId::Nyt);

    let guardian = res
        .reports
        .iter()
        .find(|r| r.source == SourceId::Guardian)
        .unwrap();
    assert!(matches!(
        guardian.outcome,
        ProviderOutcome::Failed { ref reason, .. } if reason == "simulated"
    ));
}

#[tokio::test]
async fn sole_enabled_provider_failing_is_total_failure() {
    let h = harness(
        FixtureProvider::articles(SourceId::NewsApi, batch(SourceId::NewsApi, 5, 0)),
        FixtureProvider::failing(SourceId::Guardian, "connection refused"),
        FixtureProvider::articles(SourceId::Nyt, batch(SourceId::Nyt, 3, 0)),
    );
    let q = CanonicalQuery::search("x", only(&[SourceId::Guardian]));
    let res = h.agg.run(&q).await;

    assert!(res.articles.is_empty());
    assert!(res.total_failure);
    assert!(!res.partial_failure);
    assert_eq!(h.newsapi.calls(), 0);
}

#[tokio::test]
async fn empty_matches_everywhere_is_total_failure() {
    let h = harness(
        FixtureProvider::articles(SourceId::NewsApi, vec![]),
        FixtureProvider::articles(SourceId::Guardian, vec![]),
        FixtureProvider::articles(SourceId::Nyt, vec![]),
    );
    let res = h
        .agg
        .run(&CanonicalQuery::search("zzz", SourceSelection::All))
        .await;
    assert!(res.total_failure);
    assert!(res
        .reports
        .iter()
        .all(|r| r.outcome == ProviderOutcome::Ok { articles: 0 }));
}

#[tokio::test]
async fn slow_provider_is_cut_off_without_stalling_others() {
    let h = harness(
        FixtureProvider::articles(SourceId::NewsApi, batch(SourceId::NewsApi, 2, 0)),
        FixtureProvider::articles(SourceId::Guardian, batch(SourceId::Guardian, 2, 0))
            .with_delay(Duration::from_secs(5)),
        FixtureProvider::articles(SourceId::Nyt, batch(SourceId::Nyt, 1, 0)),
    );
    let agg = h.agg.with_timeout(Some(Duration::from_millis(100)));

    let started = std::time::Instant::now();
    let res = agg
        .run(&CanonicalQuery::search("x", SourceSelection::All))
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(res.articles.len(), 3);
    assert!(res.partial_failure);
    let g = res
        .reports
        .iter()
        .find(|r| r.source == SourceId::Guardian)
        .unwrap();
    assert_eq!(g.outcome, ProviderOutcome::TimedOut { after_ms: 100 });
}

#[tokio::test]
async fn providers_run_concurrently() {
    let delay = Duration::from_millis(200);
    let h = harness(
        FixtureProvider::articles(SourceId::NewsApi, batch(SourceId::NewsApi, 1, 0)).with_delay(delay),
        FixtureProvider::articles(SourceId::Guardian, batch(SourceId::Guardian, 1, 0)).with_delay(delay),
        FixtureProvider::articles(SourceId::Nyt, batch(SourceId::Nyt, 1, 0)).with_delay(delay),
    );
    let started = std::time::Instant::now();
    let res = h
        .agg
        .run(&CanonicalQuery::search("x", SourceSelection::All))
        .await;
    assert_eq!(res.articles.len(), 3);
    // sequential would take >= 600ms
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn equal_timestamps_keep_invocation_order() {
    let ts = "2024-06-01T12:00:00Z";
    let h = harness(
        FixtureProvider::articles(SourceId::NewsApi, vec![article(SourceId::NewsApi, 1, ts)]),
        FixtureProvider::articles(SourceId::Guardian, vec![article(SourceId::Guardian, 1, ts)]),
        FixtureProvider::articles(
            SourceId::Nyt,
            vec![article(SourceId::Nyt, 1, ts), article(SourceId::Nyt, 2, "garbled")],
        ),
    );
    let res = h
        .agg
        .run(&CanonicalQuery::search("x", SourceSelection::All))
        .await;
    let order: Vec<SourceId> = res.articles.iter().map(|a| a.source.id).collect();
    assert_eq!(
        order,
        vec![SourceId::NewsApi, SourceId::Guardian, SourceId::Nyt, SourceId::Nyt]
    );
    assert_eq!(res.articles[3].published_at, "garbled");
}
