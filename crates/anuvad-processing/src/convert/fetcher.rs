//! Signed-URL fetch of the stored HTML translation.

use async_trait::async_trait;

use crate::convert::HtmlFetcher;
use crate::error::{ConvertError, ConvertResult};

/// Production fetcher over a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestHtmlFetcher {
    client: reqwest::Client,
}

impl ReqwestHtmlFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHtmlFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HtmlFetcher for ReqwestHtmlFetcher {
    async fn fetch(&self, url: &str) -> ConvertResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            ConvertError::UpstreamFetchFailed(format!("HTML fetch failed: {}", e))
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ConvertError::NotFound(
                "HTML translation blob not found".to_string(),
            ));
        }
        let response = response.error_for_status().map_err(|e| {
            ConvertError::UpstreamFetchFailed(format!("HTML fetch failed: {}", e))
        })?;

        response.text().await.map_err(|e| {
            ConvertError::UpstreamFetchFailed(format!("HTML body read failed: {}", e))
        })
    }
}
