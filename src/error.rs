//! The error taxonomy shared by the whole crate.
//!
//! The core never retries: the first error of a page-step aborts the
//! step and surfaces unchanged to the caller. Retry, if desired, is
//! layered by the caller around the whole crawl.

use thiserror::Error;

/// Errors surfaced by the crawl core.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Network or HTTP failure from the [`Session`](crate::fetch::Session).
    ///
    /// Non-2xx statuses are transport failures too.
    #[error("transport error for {url}")]
    Transport {
        /// The URL the request was issued against.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A remote document did not have the expected structure.
    ///
    /// An *empty* listing page is not an extraction error: it is the
    /// end-of-blog signal.
    #[error("could not extract: {message}")]
    Extraction {
        /// What was being extracted and how the markup was off.
        message: String,
    },

    /// The crawl options were rejected, before any network activity.
    #[error("invalid crawl configuration: {message}")]
    Configuration {
        /// Which option was rejected and why.
        message: String,
    },
}

impl ScrapeError {
    pub(crate) fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
