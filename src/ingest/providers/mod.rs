pub mod fixture;
pub mod guardian;
pub mod newsapi;
pub mod nyt;

use reqwest::Url;
use serde::{Deserialize, Deserializer};

use crate::ingest::types::ProviderError;

/// Fixed page size requested from providers that accept one.
pub const PAGE_SIZE: u32 = 20;

pub use fixture::{embedded_fixture_providers, FixtureBehavior, FixtureProvider};
pub use guardian::GuardianProvider;
pub use newsapi::NewsApiProvider;
pub use nyt::NytProvider;

/// `base` + `path` with the query pairs appended (percent-encoded).
pub(crate) fn endpoint(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, ProviderError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| ProviderError::Endpoint(format!("{raw}: {e}")))?;
    url.query_pairs_mut().extend_pairs(params.iter().copied());
    Ok(url)
}

/// `null` decodes like a missing key: the type's default.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_percent_encodes_term_and_trims_slash() {
        let url = endpoint(
            "https://api.example.test/",
            "/search",
            &[("q", "climate & energy"), ("api-key", "k")],
        )
        .unwrap();
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("q".into(), "climate & energy".into()));
        assert!(!url.as_str().contains("climate & energy"));
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        let err = endpoint("not a url", "/x", &[]).unwrap_err();
        assert_eq!(err.reason(), "endpoint");
    }
}
