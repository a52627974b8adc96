// src/ingest/providers/nyt.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::ingest::types::{non_empty, Article, NewsProvider, ProviderError, SourceId};
use crate::ingest::{decode_json, get_and_parse, normalize_text};

use super::endpoint;

pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com";
const PATH: &str = "/svc/search/v2/articlesearch.json";
const IMAGE_HOST: &str = "https://static01.nyt.com/";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default, deserialize_with = "super::null_as_default")]
    docs: Vec<Doc>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    headline: Option<Headline>,
    #[serde(rename = "abstract")]
    abstract_: Option<String>,
    lead_paragraph: Option<String>,
    web_url: Option<String>,
    /// Older payloads send an array of images, newer ones an object with `default`.
    multimedia: Option<Value>,
    pub_date: Option<String>,
    byline: Option<Byline>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Headline {
    main: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Byline {
    original: Option<String>,
}

/// NYT Article Search. No page size parameter: the provider default applies.
pub struct NytProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NytProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn request_url(&self, term: &str) -> Result<reqwest::Url, ProviderError> {
        endpoint(&self.base_url, PATH, &[("q", term), ("api-key", self.api_key.as_str())])
    }

    pub fn parse_response(body: &str) -> Result<Vec<Article>, ProviderError> {
        let env: Envelope = decode_json(body)?;
        let docs = env.response.map(|b| b.docs).unwrap_or_default();
        Ok(docs.into_iter().map(map_doc).collect())
    }
}

fn first_image(multimedia: Option<&Value>) -> Option<String> {
    let raw = match multimedia? {
        Value::Array(items) => items.first()?.get("url")?.as_str()?,
        Value::Object(obj) => obj.get("default")?.get("url")?.as_str()?,
        _ => return None,
    };
    if raw.is_empty() {
        None
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else {
        Some(format!("{IMAGE_HOST}{}", raw.trim_start_matches('/')))
    }
}

fn map_doc(d: Doc) -> Article {
    let description = non_empty(d.abstract_)
        .or(d.lead_paragraph)
        .unwrap_or_default();

    Article {
        title: normalize_text(
            d.headline
                .and_then(|h| h.main)
                .as_deref()
                .unwrap_or_default(),
        ),
        description: normalize_text(&description),
        url: d.web_url.unwrap_or_default(),
        image_url: first_image(d.multimedia.as_ref()),
        published_at: d.pub_date.unwrap_or_default(),
        source: SourceId::Nyt.into(),
        author: non_empty(d.byline.and_then(|b| b.original)),
        content: non_empty(d.snippet.map(|s| normalize_text(&s))),
    }
}

#[async_trait]
impl NewsProvider for NytProvider {
    fn source(&self) -> SourceId {
        SourceId::Nyt
    }

    async fn fetch(&self, term: &str) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(term)?;
        get_and_parse(&self.client, self.source(), url, Self::parse_response).await
    }
}
