// src/ingest/providers/guardian.rs
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::types::{non_empty, Article, NewsProvider, ProviderError, SourceId};
use crate::ingest::{decode_json, get_and_parse, normalize_text};

use super::{endpoint, PAGE_SIZE};

pub const DEFAULT_BASE_URL: &str = "https://content.guardianapis.com";
const PATH: &str = "/search";
const SHOW_FIELDS: &str = "headline,trailText,thumbnail,byline";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default, deserialize_with = "super::null_as_default")]
    results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    web_title: Option<String>,
    web_url: Option<String>,
    web_publication_date: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    fields: Fields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fields {
    headline: Option<String>,
    trail_text: Option<String>,
    thumbnail: Option<String>,
    byline: Option<String>,
}

pub struct GuardianProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GuardianProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn request_url(&self, term: &str) -> Result<reqwest::Url, ProviderError> {
        let page_size = PAGE_SIZE.to_string();
        endpoint(
            &self.base_url,
            PATH,
            &[
                ("q", term),
                ("api-key", self.api_key.as_str()),
                ("show-fields", SHOW_FIELDS),
                ("page-size", page_size.as_str()),
            ],
        )
    }

    pub fn parse_response(body: &str) -> Result<Vec<Article>, ProviderError> {
        let env: Envelope = decode_json(body)?;
        let results = env.response.map(|b| b.results).unwrap_or_default();
        Ok(results.into_iter().map(map_item).collect())
    }
}

fn map_item(it: Item) -> Article {
    let Fields {
        headline,
        trail_text,
        thumbnail,
        byline,
    } = it.fields;

    // headline is only present when show-fields was honoured
    let title = non_empty(headline).or(it.web_title).unwrap_or_default();
    let trail = normalize_text(trail_text.as_deref().unwrap_or_default());

    Article {
        title: normalize_text(&title),
        description: trail.clone(),
        url: it.web_url.unwrap_or_default(),
        image_url: non_empty(thumbnail),
        published_at: it.web_publication_date.unwrap_or_default(),
        source: SourceId::Guardian.into(),
        author: non_empty(byline),
        content: non_empty(Some(trail)),
    }
}

#[async_trait]
impl NewsProvider for GuardianProvider {
    fn source(&self) -> SourceId {
        SourceId::Guardian
    }

    async fn fetch(&self, term: &str) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(term)?;
        get_and_parse(&self.client, self.source(), url, Self::parse_response).await
    }
}
