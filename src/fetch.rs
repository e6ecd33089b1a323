//! The HTTP boundary: a shared [`Session`] wrapping one [`reqwest::Client`].
//!
//! Every request of a crawl goes through one `Session`, so cookies, the
//! user agent and the connection pool are shared. The crawl core passes
//! the session through without inspecting or mutating it; timeout policy
//! lives in the client, and there is no retry at this layer.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;

use crate::error::ScrapeError;

/// The cookie/user-agent/proxy state shared by all requests of a crawl.
///
/// Cheap to clone; clones share the same connection pool and cookie
/// store, which is what the concurrent sub-fetches of a page-step rely
/// on. Session mutation (e.g. login) happens before a crawl starts, not
/// through this type.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Wrap an already configured client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a session with a cookie-enabled default client.
    ///
    /// A `timeout` of `0` disables the request timeout.
    ///
    /// # Errors
    ///
    /// If the underlying client cannot be built, this function will return an error.
    pub fn build(timeout: u64) -> reqwest::Result<Self> {
        let client_builder = Client::builder().cookie_store(true);
        let client_builder = if timeout > 0 {
            client_builder.timeout(Duration::from_secs(timeout))
        } else {
            client_builder
        };
        Ok(Self::new(client_builder.build()?))
    }

    /// Fetch `url` and return the response body as text.
    ///
    /// # Errors
    ///
    /// Any network failure or non-2xx status is a
    /// [`ScrapeError::Transport`].
    pub async fn text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ScrapeError::transport(url, source))?;
        response
            .text()
            .await
            .map_err(|source| ScrapeError::transport(url, source))
    }

    /// Fetch `url` and return the raw response bytes.
    ///
    /// # Errors
    ///
    /// Any network failure or non-2xx status is a
    /// [`ScrapeError::Transport`].
    pub async fn bytes(&self, url: &str) -> Result<Bytes, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ScrapeError::transport(url, source))?;
        response
            .bytes()
            .await
            .map_err(|source| ScrapeError::transport(url, source))
    }
}
