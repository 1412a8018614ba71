//! HTTP access to the USAspending API.
//!
//! [`SpendingSource`] is the seam between the fetch logic and the network;
//! [`HttpSource`] is the reqwest-backed implementation used by the CLI.

use crate::error::ApiError;
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Public USAspending API root.
pub const DEFAULT_BASE_URL: &str = "https://api.usaspending.gov";

/// Path of an agency sub-resource, e.g. `/api/v2/agency/097/awards/`.
pub fn agency_path(agency_code: &str, suffix: &str) -> String {
    format!("/api/v2/agency/{}/{}/", agency_code, suffix)
}

/// Anything that can answer `GET {path}?fiscal_year={year}` with JSON.
pub trait SpendingSource {
    /// Fetch one JSON body. Any status other than 200 is an error.
    fn get_json(
        &self,
        path: &str,
        fiscal_year: i32,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// reqwest-backed [`SpendingSource`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Build a client for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spendscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Underlying client, shared with the directory loader.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl SpendingSource for HttpSource {
    async fn get_json(&self, path: &str, fiscal_year: i32) -> Result<Value, ApiError> {
        let url = self.endpoint(path);
        debug!("GET {}?fiscal_year={}", url, fiscal_year);

        let response = self
            .client
            .get(&url)
            .query(&[("fiscal_year", fiscal_year)])
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| ApiError::Transport { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agency_path() {
        assert_eq!(agency_path("097", "awards"), "/api/v2/agency/097/awards/");
        assert_eq!(
            agency_path("012", "sub_agency"),
            "/api/v2/agency/012/sub_agency/"
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let source = HttpSource::new("https://api.usaspending.gov/", Duration::from_secs(5)).unwrap();
        assert_eq!(source.base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            source.endpoint("/api/v2/agency/097/awards/"),
            "https://api.usaspending.gov/api/v2/agency/097/awards/"
        );
    }
}
