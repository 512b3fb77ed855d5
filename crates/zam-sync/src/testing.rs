//! In-memory [`HttpClient`] for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::FetchError;
use crate::client::{HttpClient, Response};

/// Serves canned responses from a URL map. Unknown URLs answer 404; URLs
/// registered with [`StaticClient::failing`] raise a transport error.
#[derive(Default)]
pub struct StaticClient {
    responses: HashMap<String, Response>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, status, body);
        self
    }

    pub fn ok(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.with(url, 200, body)
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn insert(&mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.responses.insert(url.to_string(), Response::new(status, body));
    }

    pub fn remove(&mut self, url: &str) {
        self.responses.remove(url);
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for StaticClient {
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        if self.failing.contains(url) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".into(),
            });
        }
        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, Vec::new())))
    }
}
