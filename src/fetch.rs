//! Source image fetching.
//!
//! One GET against the primary URL; when that response is not successful
//! and a fallback URL was supplied, one GET against the (percent-decoded)
//! fallback, whose response is used regardless of outcome. No retries
//! beyond that. The client carries a request timeout even though the
//! original behavior had none; an image origin that never answers should
//! not pin a request task forever.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::ServiceError;

#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::ConfigError(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch raw image bytes from `url`, falling back to `fallback_url`
    /// on a non-success status.
    pub async fn fetch(
        &self,
        url: &str,
        fallback_url: Option<&str>,
    ) -> Result<Bytes, ServiceError> {
        let mut response = self.client.get(url).send().await.map_err(|e| {
            ServiceError::FetchFailed {
                status: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            if let Some(fallback) = fallback_url {
                let decoded = urlencoding::decode(fallback)
                    .map(|cow| cow.into_owned())
                    .map_err(|e| ServiceError::FetchFailed {
                        status: format!("malformed fallback URL: {e}"),
                    })?;
                warn!(url, status = %response.status(), fallback = %decoded, "primary fetch failed, trying fallback");
                response = self.client.get(&decoded).send().await.map_err(|e| {
                    ServiceError::FetchFailed {
                        status: e.to_string(),
                    }
                })?;
            }
        }

        if !response.status().is_success() {
            return Err(ServiceError::FetchFailed {
                status: response.status().to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::FetchFailed {
                status: e.to_string(),
            })?;
        debug!(url, size = bytes.len(), "fetched source image");
        Ok(bytes)
    }
}
