//! Live HTTP client for the upstream open-data endpoints.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::FetchError;
use crate::client::{HttpClient, Response};

const USER_AGENT: &str = concat!("zam/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`HttpClient`]. Every request carries the configured
/// timeout; timeouts and connection failures surface as
/// [`FetchError::Transport`].
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn transport(url: &str, err: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        info!(url = %url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| transport(url, e))?;
        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "response");
        Ok(Response::new(status.as_u16(), body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_timeout() {
        assert!(ReqwestClient::new(Duration::from_secs(5)).is_ok());
    }
}
