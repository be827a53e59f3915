use crate::error::{AcquireError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::time::Duration;

/// Raw page transport used by the crawl driver.
///
/// Implementations return the response body undecoded; decoding happens in
/// [`crate::repair`].
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;

    async fn post_form(&self, url: &str, fields: &[(&str, String)]) -> Result<Vec<u8>>;
}

/// HTTP fetcher backed by a single `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, accept_language: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(accept_language).map_err(|e| {
            AcquireError::Config(format!("invalid Accept-Language header: {e}"))
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        read_body(response, url).await
    }

    async fn post_form(&self, url: &str, fields: &[(&str, String)]) -> Result<Vec<u8>> {
        tracing::debug!(url = %url, fields = fields.len(), "POST");
        let response = self.client.post(url).form(fields).send().await?;
        read_body(response, url).await
    }
}

async fn read_body(response: reqwest::Response, url: &str) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        return Err(AcquireError::HttpStatus {
            status,
            url: url.to_string(),
        });
    }

    let body = response.bytes().await?;
    tracing::debug!(url = %url, bytes = body.len(), "Received body");
    Ok(body.to_vec())
}
