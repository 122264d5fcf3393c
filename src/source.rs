//! Where articles come from.
//!
//! The pipeline itself only needs an [`Article`]. The CLI gets one either
//! from a JSON file on disk ([`read_article`]) or from the article API
//! ([`HttpArticleSource`]).

use crate::config::SourceConfig;
use crate::types::Article;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Request timeout for article fetches.
const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("article API {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed article JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fetches articles by id.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_article(&self, id: &str) -> Result<Article, SourceError>;
}

/// Read an article export from disk.
pub fn read_article(path: &Path) -> Result<Article, SourceError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// The World Anvil article API.
pub struct HttpArticleSource {
    client: reqwest::Client,
    api_base: String,
    application_key: Option<String>,
    auth_token: Option<String>,
}

impl HttpArticleSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            application_key: config.application_key.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn article_url(&self, id: &str) -> String {
        format!("{}/article/{}", self.api_base, id)
    }
}

#[async_trait]
impl ArticleSource for HttpArticleSource {
    async fn fetch_article(&self, id: &str) -> Result<Article, SourceError> {
        let url = self.article_url(id);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.application_key {
            request = request.header("x-application-key", key);
        }
        if let Some(token) = &self.auth_token {
            request = request.header("x-auth-token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let article: Article = serde_json::from_str(&body)?;
        tracing::debug!(%url, title = %article.title, "article fetched");
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> SourceConfig {
        SourceConfig {
            api_base,
            application_key: Some("app".to_string()),
            auth_token: Some("user".to_string()),
        }
    }

    #[tokio::test]
    async fn fetches_article_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/article/abc"))
            .and(header("x-application-key", "app"))
            .and(header("x-auth-token", "user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc",
                "title": "Town",
                "url": "http://x/town",
                "sections": [],
                "relations": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpArticleSource::new(&config(format!("{}/api/", server.uri()))).unwrap();
        let article = source.fetch_article("abc").await.unwrap();
        assert_eq!(article.id, "abc");
        assert_eq!(article.title, "Town");
        assert!(article.sections.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpArticleSource::new(&config(server.uri())).unwrap();
        let result = source.fetch_article("missing").await;
        assert!(matches!(result, Err(SourceError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let source = HttpArticleSource::new(&config(server.uri())).unwrap();
        let result = source.fetch_article("x").await;
        assert!(matches!(result, Err(SourceError::Json(_))));
    }

    #[test]
    fn read_article_from_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.json");
        std::fs::write(&file, r#"{"id": 5, "title": "Five", "url": "u"}"#).unwrap();
        let article = read_article(&file).unwrap();
        assert_eq!(article.id, "5");
        assert_eq!(article.title, "Five");
    }

    #[test]
    fn read_missing_article_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = read_article(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
