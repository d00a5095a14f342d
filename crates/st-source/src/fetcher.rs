//! Retrying HTTP fetcher for the paginated product listing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{redirect, Client, Response};
use serde_json::Value;
use st_core::{Config, Credentials};

use crate::error::{SourceError, SourceResult, RETRYABLE_STATUSES};

/// How a page is addressed in the request query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    /// `offset=<n>`, counted in records
    Offset(u64),
    /// `page=<n>`, 1-based
    Page(u64),
}

impl PageSelector {
    fn query(self, limit: u32) -> [(&'static str, u64); 2] {
        let selector = match self {
            PageSelector::Offset(offset) => ("offset", offset),
            PageSelector::Page(page) => ("page", page),
        };
        [("limit", u64::from(limit)), selector]
    }
}

/// Anything that can return one decoded page of the listing
#[async_trait]
pub trait PageSource: Send {
    async fn fetch(&mut self, selector: PageSelector, limit: u32) -> SourceResult<Value>;
}

/// Retry cap and exponential backoff base
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: f64,
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (1-based): `backoff_base ^ attempt` seconds
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_base.powi(exponent)).unwrap_or(Duration::MAX)
    }
}

/// Rewrite an insecure `http://` location to `https://`.
///
/// Any other location cannot be normalized.
pub fn secure_location(location: &str) -> Option<String> {
    location
        .strip_prefix("http://")
        .map(|rest| format!("https://{}", rest))
}

/// Outcome of inspecting a response for a redirect
#[derive(Debug, Clone, PartialEq, Eq)]
enum RedirectAction {
    /// Not a redirect; read the response as is
    Accept,
    /// Re-request this rewritten location once
    Follow(String),
}

/// Decide how to handle a response status and its `Location` header.
///
/// Only an `http://` location on the first response is followed; any other
/// redirect, including one answering the rewritten request, is an error.
fn classify_redirect(
    status: u16,
    location: Option<&str>,
    already_followed: bool,
) -> SourceResult<RedirectAction> {
    if !(300..400).contains(&status) {
        return Ok(RedirectAction::Accept);
    }
    match location.and_then(secure_location) {
        Some(secure) if !already_followed => Ok(RedirectAction::Follow(secure)),
        _ => Err(SourceError::Redirect {
            status,
            location: location.map(str::to_string),
        }),
    }
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Authenticated GET client with redirect normalization and retry
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
    credentials: Credentials,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
            policy,
        })
    }

    /// Build a fetcher for the product endpoint described by `config`
    pub fn from_config(config: &Config, credentials: Credentials) -> SourceResult<Self> {
        Self::new(
            config.product_endpoint(),
            credentials,
            RetryPolicy {
                max_retries: config.source.max_retries,
                backoff_base: config.source.backoff_base,
            },
            Duration::from_secs(config.source.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch one page, retrying transient failures with exponential backoff
    pub async fn fetch_json(&self, selector: PageSelector, limit: u32) -> SourceResult<Value> {
        let query = selector.query(limit);
        let mut attempt: u32 = 0;
        loop {
            match self.get_once(&query).await {
                Ok(payload) => return Ok(payload),
                Err(err) if err.is_retryable() => {
                    attempt += 1;
                    if attempt > self.policy.max_retries {
                        return Err(SourceError::Exhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    let delay = self.policy.delay(attempt);
                    log::warn!(
                        "{} (retry {}/{} in {:.1}s)",
                        err,
                        attempt,
                        self.policy.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_once(&self, query: &[(&str, u64)]) -> SourceResult<Value> {
        log::debug!("GET {} {:?}", self.endpoint, query);
        let mut response = self.send(self.client.get(&self.endpoint).query(query)).await?;

        let first = classify_redirect(response.status().as_u16(), location(&response), false)?;
        if let RedirectAction::Follow(secure) = first {
            log::debug!("Following insecure redirect to {}", secure);
            // The rewritten location carries its own query string
            response = self.send(self.client.get(&secure)).await?;
            classify_redirect(response.status().as_u16(), location(&response), true)?;
        }

        let url = response.url().to_string();
        let status = response.status().as_u16();
        if RETRYABLE_STATUSES.contains(&status) {
            return Err(SourceError::RetryableStatus { status, url });
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, url, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode {
            url,
            message: e.to_string(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> SourceResult<Response> {
        let response = request
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret()),
            )
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&mut self, selector: PageSelector, limit: u32) -> SourceResult<Value> {
        self.fetch_json(selector, limit).await
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
