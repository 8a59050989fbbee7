use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, UPGRADE_INSECURE_REQUESTS, USER_AGENT};
use tracing::debug;

use crate::error::SourceError;
use crate::retry::RetryPolicy;
use crate::settings::FetchSettings;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Shared HTTP session: browser-like headers, optional TLS verification, retries
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(settings: &FetchSettings, retry: RetryPolicy) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .timeout(settings.timeout())
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self { client, retry })
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.retry
            .retry("http_get", move || async move {
                let response = self.send(url).await?;
                let bytes = response.bytes().await.map_err(|source| SourceError::Request {
                    url: url.to_string(),
                    source,
                })?;
                Ok(bytes.to_vec())
            })
            .await
    }

    pub async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        self.retry
            .retry("http_get", move || async move {
                let response = self.send(url).await?;
                response.text().await.map_err(|source| SourceError::Request {
                    url: url.to_string(),
                    source,
                })
            })
            .await
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "HTTP GET");
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}
