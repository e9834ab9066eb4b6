// src/fnguide/client.rs
use reqwest::header;
use std::time::Duration;

use super::models::DocumentKind;
use super::DocumentSource;
use crate::utils::error::FetchError;

// FnGuide serves an error page to clients without a browser User-Agent.
const FNGUIDE_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP access to comp.fnguide.com with a fixed pause before every request.
#[derive(Debug, Clone)]
pub struct FnGuideClient {
    http: reqwest::Client,
    request_delay: Duration,
}

impl FnGuideClient {
    pub fn new(request_delay_ms: u64) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(FNGUIDE_USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, request_delay: Duration::from_millis(request_delay_ms) })
    }
}

/// The multi-factor feed is served with a UTF-8 byte order mark.
pub fn strip_bom(body: &str) -> &str {
    body.strip_prefix('\u{feff}').unwrap_or(body)
}

#[async_trait::async_trait]
impl DocumentSource for FnGuideClient {
    async fn fetch(&self, code: &str, kind: DocumentKind) -> Result<String, FetchError> {
        let url = kind.url(code);

        // --- Basic Rate Limiting ---
        tokio::time::sleep(self.request_delay).await;

        tracing::debug!("Fetching {} page for {}: {}", kind, code, url);
        let accept = if kind.is_json() { "application/json,*/*" } else { "text/html,*/*" };
        let response = self.http.get(&url).header(header::ACCEPT, accept).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotAvailable { code: code.to_string(), kind });
            }
            return Err(FetchError::Http { status, url });
        }

        let body = response.text().await?;
        tracing::trace!("Downloaded {} bytes from {}", body.len(), url);
        Ok(strip_bom(&body).to_string())
    }
}
