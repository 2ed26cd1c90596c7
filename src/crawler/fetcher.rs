//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of the harvester, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with optional query parameters
//! - Manual redirect following with a recorded hop history
//! - Redirect guarding and status checks
//! - Error classification

use crate::config::HttpConfig;
use crate::HarvestError;
use reqwest::{header::LOCATION, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum number of redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL of the final response, after any redirects
    pub url: Url,

    /// Status code of the final response
    pub status: StatusCode,

    /// Every URL that answered with a redirect, in order
    pub redirects: Vec<Url>,

    /// Response body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// The body decoded as UTF-8, with invalid sequences replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client itself; [`HttpFetcher`]
/// follows them so that the hop history is available to the redirect guard.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests and classifies their outcome
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &HttpConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an existing client
    ///
    /// The client must not follow redirects on its own, otherwise the
    /// redirect guard never sees a hop.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL and classifies the outcome
    ///
    /// # Request Flow
    ///
    /// 1. Append `query` to the URL
    /// 2. Send GET, following `Location` headers manually (max 10 hops)
    /// 3. Classify the outcome, in this order:
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Connect/timeout/send/body/decompression failure | `Transient` |
    /// | Any redirect hop, whatever the final status | `RedirectDetected` |
    /// | Non-2xx status | `HttpStatus` |
    /// | Otherwise | `Ok(RawResponse)` |
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `query` - Query parameters to append, may be empty
    pub async fn fetch(&self, url: &Url, query: &[(&str, &str)]) -> Result<RawResponse, HarvestError> {
        let mut url = url.clone();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let response = self.send_following_redirects(url).await?;
        check_for_redirect(&response)?;
        check_status(&response)?;

        Ok(response)
    }

    /// Sends GET requests until a non-redirect response or the hop limit
    async fn send_following_redirects(&self, url: Url) -> Result<RawResponse, HarvestError> {
        let mut current = url;
        let mut redirects = Vec::new();

        loop {
            tracing::debug!("GET {}", current);
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| classify_error(&current, e))?;

            let status = response.status();
            let location = if status.is_redirection() {
                response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| current.join(v).ok())
            } else {
                None
            };

            let body = response
                .bytes()
                .await
                .map_err(|e| classify_error(&current, e))?
                .to_vec();

            match location {
                Some(next) if redirects.len() < MAX_REDIRECTS => {
                    tracing::debug!("{} redirected to {}", current, next);
                    redirects.push(std::mem::replace(&mut current, next));
                }
                Some(_) => {
                    tracing::debug!("Redirect limit reached at {}", current);
                    redirects.push(current.clone());
                    return Ok(RawResponse {
                        url: current,
                        status,
                        redirects,
                        body,
                    });
                }
                None => {
                    return Ok(RawResponse {
                        url: current,
                        status,
                        redirects,
                        body,
                    });
                }
            }
        }
    }
}

/// Fails with `RedirectDetected` when the response was reached via redirects
///
/// The origin answers requests for missing books with a redirect to a
/// generic page instead of a 404, so any hop means "no such resource".
/// This check runs before the status check.
pub fn check_for_redirect(response: &RawResponse) -> Result<(), HarvestError> {
    match response.redirects.first() {
        Some(first) => Err(HarvestError::RedirectDetected {
            url: first.to_string(),
            location: response.url.to_string(),
        }),
        None => Ok(()),
    }
}

/// Fails with `HttpStatus` on any non-2xx status
pub fn check_status(response: &RawResponse) -> Result<(), HarvestError> {
    if response.status.is_success() {
        Ok(())
    } else {
        Err(HarvestError::HttpStatus {
            url: response.url.to_string(),
            status: response.status.as_u16(),
        })
    }
}

/// Maps a transport error to the harvester's taxonomy
///
/// Connection, timeout, send and body failures are transient, and so is a
/// body that fails to decompress. Anything else (builder problems) is
/// unexpected.
fn classify_error(url: &Url, error: reqwest::Error) -> HarvestError {
    if error.is_connect()
        || error.is_timeout()
        || error.is_request()
        || error.is_body()
        || error.is_decode()
    {
        HarvestError::Transient {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        HarvestError::Http(error)
    }
}
