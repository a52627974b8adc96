// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;

use crate::ingest::types::{ProviderError, SourceId};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_provider_requests_total",
            "Upstream requests issued, per provider."
        );
        describe_counter!(
            "news_provider_errors_total",
            "Absorbed provider failures, per provider and reason."
        );
        describe_histogram!(
            "news_provider_fetch_ms",
            "Provider round trip (request + decode) in milliseconds."
        );
        describe_counter!("news_queries_total", "Query cycles dispatched, per mode.");
        describe_counter!(
            "news_total_failures_total",
            "Query cycles that produced no articles at all."
        );
        describe_counter!(
            "news_stale_settlements_total",
            "Query settlements discarded because a newer query was dispatched."
        );
    });
}

/// Normalize provider text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Issue one GET and decode the body with `parse`. Non-2xx is an error; no retries.
pub(crate) async fn get_and_parse<T, F>(
    client: &reqwest::Client,
    source: SourceId,
    url: reqwest::Url,
    parse: F,
) -> Result<T, ProviderError>
where
    F: FnOnce(&str) -> Result<T, ProviderError>,
{
    let t0 = Instant::now();
    counter!("news_provider_requests_total", "provider" => source.as_str()).increment(1);

    let out: Result<T, ProviderError> = async {
        let resp = client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        parse(&body)
    }
    .await;

    // recorded for failures too
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("news_provider_fetch_ms", "provider" => source.as_str()).record(ms);
    out
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    Ok(serde_json::from_str(body)?)
}

/// Record an absorbed provider failure in logs and metrics.
pub(crate) fn record_provider_failure(source: SourceId, err: &ProviderError) {
    ensure_metrics_described();
    tracing::warn!(
        provider = source.as_str(),
        reason = err.reason(),
        error = %err,
        "provider failed; contributing no articles"
    );
    counter!(
        "news_provider_errors_total",
        "provider" => source.as_str(),
        "reason" => err.reason()
    )
    .increment(1);
}
