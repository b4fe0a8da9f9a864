//! Scripture API client

use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::BibleConfig;
use tracing::{debug, instrument, warn};

use crate::error::{BibleError, Result};
use crate::reference::Reference;
use crate::types::{ChapterResponse, Verse};

/// Client for a bible-api.com compatible endpoint.
pub struct BibleClient {
    http_client: Arc<dyn HttpClient>,
    config: BibleConfig,
}

impl BibleClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: BibleConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn chapter_url(&self, reference: &Reference) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            reference.api_path()
        )
    }

    /// Fetch every verse of a chapter.
    pub async fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Vec<Verse>> {
        self.fetch_passage(&Reference::chapter(book, chapter)).await
    }

    /// Fetch the chapter containing `reference`. The verse, if any, is not
    /// used to narrow the request.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn fetch_passage(&self, reference: &Reference) -> Result<Vec<Verse>> {
        let url = self.chapter_url(reference);
        debug!(url = %url, "Fetching chapter");

        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(self.config.request_timeout);
        let response = self.http_client.execute(request).await?;

        if response.status == 404 {
            return Err(BibleError::NotFound(reference.to_string()));
        }
        if !response.is_success() {
            warn!(status = response.status, "Scripture API request failed");
            return Err(BibleError::HttpStatus {
                status: response.status,
            });
        }

        let decoded: ChapterResponse = serde_json::from_slice(&response.body)
            .map_err(|e| BibleError::Decode(e.to_string()))?;
        if let Some(message) = decoded.error {
            return Err(BibleError::NotFound(format!("{reference}: {message}")));
        }

        debug!(count = decoded.verses.len(), "Decoded verses");
        Ok(decoded.verses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::http::HttpResponse;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    const PSALM_23: &str = r#"{"verses": [
        {"book_name": "Psalms", "chapter": 23, "verse": 1, "text": "The Lord is my shepherd; I shall not want.\n"},
        {"book_name": "Psalms", "chapter": 23, "verse": 2, "text": "He makes me lie down in green pastures.\n"}
    ]}"#;

    #[tokio::test]
    async fn test_fetch_chapter_builds_url() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|request| {
            assert_eq!(request.url, "https://bible-api.com/Psalms+23");
            Ok(HttpResponse::new(200, PSALM_23))
        });

        let client = BibleClient::new(Arc::new(http), BibleConfig::default());
        let verses = client.fetch_chapter("psalm", 23).await.unwrap();
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].id(), "Psalms:23:1");
    }

    #[tokio::test]
    async fn test_multi_word_books_use_plus() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|request| {
            assert_eq!(request.url, "http://localhost:9000/1+John+4");
            Ok(HttpResponse::new(200, r#"{"verses": []}"#))
        });

        let config = BibleConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..BibleConfig::default()
        };
        let client = BibleClient::new(Arc::new(http), config);
        assert!(client.fetch_chapter("1 john", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_passage_is_not_found() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, r#"{"error": "not found"}"#)));
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"error": "not found"}"#)));

        let client = BibleClient::new(Arc::new(http), BibleConfig::default());
        assert!(matches!(
            client.fetch_chapter("Hezekiah", 1).await,
            Err(BibleError::NotFound(_))
        ));
        assert!(matches!(
            client.fetch_chapter("Hezekiah", 1).await,
            Err(BibleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_http_status() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(503, "unavailable")));

        let client = BibleClient::new(Arc::new(http), BibleConfig::default());
        assert!(matches!(
            client.fetch_chapter("John", 3).await,
            Err(BibleError::HttpStatus { status: 503 })
        ));
    }
}
