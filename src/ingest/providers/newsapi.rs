// src/ingest/providers/newsapi.rs
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::types::{non_empty, Article, NewsProvider, ProviderError, SourceId};
use crate::ingest::{decode_json, get_and_parse, normalize_text};

use super::{endpoint, PAGE_SIZE};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const PATH: &str = "/v2/everything";

#[derive(Debug, Deserialize)]
struct Everything {
    #[serde(default, deserialize_with = "super::null_as_default")]
    articles: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    author: Option<String>,
    content: Option<String>,
}

/// NewsAPI.org `/v2/everything`, newest first, key passed as `apiKey`.
pub struct NewsApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiProvider {
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
                ("apiKey", self.api_key.as_str()),
                ("pageSize", page_size.as_str()),
                ("sortBy", "publishedAt"),
            ],
        )
    }

    pub fn parse_response(body: &str) -> Result<Vec<Article>, ProviderError> {
        let page: Everything = decode_json(body)?;
        Ok(page.articles.into_iter().map(map_item).collect())
    }
}

fn map_item(it: Item) -> Article {
    Article {
        title: normalize_text(it.title.as_deref().unwrap_or_default()),
        description: normalize_text(it.description.as_deref().unwrap_or_default()),
        url: it.url.unwrap_or_default(),
        image_url: non_empty(it.url_to_image),
        published_at: it.published_at.unwrap_or_default(),
        source: SourceId::NewsApi.into(),
        author: non_empty(it.author),
        content: non_empty(it.content.map(|c| normalize_text(&c))),
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn source(&self) -> SourceId {
        SourceId::NewsApi
    }

    async fn fetch(&self, term: &str) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(term)?;
        get_and_parse(&self.client, self.source(), url, Self::parse_response).await
    }
}
