//! oEmbed client: provider registry, endpoint fetching, response cache
//!
//! Recognized media URLs are exchanged for HTML fragments via the
//! providers' oEmbed endpoints. Responses are cached in-process per
//! (endpoint, url, width) so re-rendering an entry does not refetch.
//! Every failure degrades to "leave the link alone" — embed expansion
//! never fails a render.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::render::{escape_text, escape_url};

#[derive(Debug, Error)]
pub enum OEmbedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider response missing '{field}' field")]
    MissingField { field: &'static str },

    #[error("response type '{kind}' has no embeddable form")]
    Unembeddable { kind: String },
}

/// One oEmbed provider: a URL pattern and the endpoint that resolves it.
#[derive(Debug, Clone)]
pub struct Provider {
    pattern: Regex,
    endpoint: String,
}

impl Provider {
    pub fn new(pattern: &str, endpoint: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            endpoint: endpoint.to_string(),
        })
    }

    fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

/// Standard oEmbed response payload; only the fields we consume.
#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(rename = "type")]
    kind: String,
    html: Option<String>,
    url: Option<String>,
    title: Option<String>,
}

/// oEmbed metadata fetcher with an in-process response cache.
pub struct OEmbedClient {
    http: reqwest::Client,
    providers: Vec<Provider>,
    cache: RwLock<HashMap<String, String>>,
}

impl OEmbedClient {
    /// Client with the basic provider set: YouTube, Vimeo, SoundCloud, Flickr.
    pub fn bootstrap_basic() -> Self {
        let providers = [
            (
                r"^https?://(www\.)?youtube\.com/watch\S*",
                "https://www.youtube.com/oembed",
            ),
            (r"^https?://youtu\.be/\S+", "https://www.youtube.com/oembed"),
            (
                r"^https?://(www\.)?vimeo\.com/\S+",
                "https://vimeo.com/api/oembed.json",
            ),
            (r"^https?://soundcloud\.com/\S+", "https://soundcloud.com/oembed"),
            (
                r"^https?://(www\.)?flickr\.com/photos/\S+",
                "https://www.flickr.com/services/oembed/",
            ),
        ]
        .iter()
        .map(|(pattern, endpoint)| Provider::new(pattern, endpoint).expect("static pattern"))
        .collect();

        Self::with_providers(providers)
    }

    pub fn with_providers(providers: Vec<Provider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            providers,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a URL to an embed fragment, if a provider recognizes it.
    ///
    /// Returns `None` for unrecognized URLs and for any fetch or payload
    /// failure; callers render the original link in that case.
    pub async fn fetch(&self, url: &str, max_width: u32) -> Option<String> {
        let provider = self.providers.iter().find(|p| p.matches(url))?;
        let cache_key = format!("{}|{}|{}", provider.endpoint, url, max_width);

        if let Some(hit) = self.cache.read().await.get(&cache_key) {
            return Some(hit.clone());
        }

        match self.request(provider, url, max_width).await {
            Ok(fragment) => {
                self.cache
                    .write()
                    .await
                    .insert(cache_key, fragment.clone());
                Some(fragment)
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "embed expansion skipped");
                None
            }
        }
    }

    async fn request(
        &self,
        provider: &Provider,
        url: &str,
        max_width: u32,
    ) -> Result<String, OEmbedError> {
        let width = max_width.to_string();
        let response: OEmbedResponse = self
            .http
            .get(&provider.endpoint)
            .query(&[
                ("url", url),
                ("format", "json"),
                ("maxwidth", width.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.kind.as_str() {
            "photo" => {
                let src = response
                    .url
                    .as_deref()
                    .ok_or(OEmbedError::MissingField { field: "url" })?;
                let alt = response.title.as_deref().unwrap_or("");
                Ok(format!(
                    "<img src=\"{}\" alt=\"{}\" />",
                    escape_url(src),
                    escape_text(alt)
                ))
            }
            "video" | "rich" => response
                .html
                .ok_or(OEmbedError::MissingField { field: "html" }),
            other => Err(OEmbedError::Unembeddable {
                kind: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server_uri: &str) -> OEmbedClient {
        let provider = Provider::new(
            r"^https://media\.example/\S+",
            &format!("{}/oembed", server_uri),
        )
        .unwrap();
        OEmbedClient::with_providers(vec![provider])
    }

    #[tokio::test]
    async fn unrecognized_url_is_skipped() {
        let client = OEmbedClient::with_providers(Vec::new());
        assert_eq!(client.fetch("https://example.com/post", 800).await, None);
    }

    #[tokio::test]
    async fn video_response_yields_html_fragment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .and(query_param("url", "https://media.example/clip"))
            .and(query_param("maxwidth", "640"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "video",
                "html": "<iframe src=\"player\"></iframe>"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let fragment = client.fetch("https://media.example/clip", 640).await;
        assert_eq!(fragment.as_deref(), Some("<iframe src=\"player\"></iframe>"));
    }

    #[tokio::test]
    async fn photo_response_renders_img_tag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "photo",
                "url": "https://media.example/img.jpg",
                "title": "A \"photo\""
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let fragment = client
            .fetch("https://media.example/photos/1", 800)
            .await
            .unwrap();
        assert!(fragment.starts_with("<img src=\"https://media.example/img.jpg\""));
        assert!(fragment.contains("alt=\"A &quot;photo&quot;\""));
    }

    #[tokio::test]
    async fn responses_are_cached_per_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "rich",
                "html": "<blockquote>embed</blockquote>"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let first = client.fetch("https://media.example/thing", 800).await;
        let second = client.fetch("https://media.example/thing", 800).await;
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.fetch("https://media.example/broken", 800).await, None);
    }

    #[tokio::test]
    async fn link_type_is_not_embedded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "link",
                "title": "just a link"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.fetch("https://media.example/page", 800).await, None);
    }
}
