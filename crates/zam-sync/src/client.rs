//! The HTTP seam. Adapters only ever see [`HttpClient`], so tests substitute
//! [`crate::testing::StaticClient`] and the binary plugs in the reqwest client.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::FetchError;

/// A fully buffered upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url`. Any status is a successful response; only transport
    /// failures (connection, timeout) are errors.
    async fn get(&self, url: &str) -> Result<Response, FetchError>;
}

/// GET `url` and require a 2xx status: 404 maps to [`FetchError::NotFound`],
/// other statuses to [`FetchError::Status`].
pub async fn get_ok(client: &dyn HttpClient, url: &str) -> Result<Response, FetchError> {
    let resp = client.get(url).await?;
    match resp.status {
        404 => Err(FetchError::NotFound { url: url.to_string() }),
        status if !resp.is_success() => Err(FetchError::Status {
            url: url.to_string(),
            status,
        }),
        _ => Ok(resp),
    }
}

/// Keeps successful responses in memory, keyed by URL, for the lifetime of
/// the client. Used so a prefetch pass makes the real run cheap.
pub struct CachedClient<C> {
    inner: C,
    cache: Mutex<HashMap<String, Response>>,
}

impl<C: HttpClient> CachedClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for CachedClient<C> {
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let hit = self
            .cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(url).cloned());
        if let Some(resp) = hit {
            debug!(url = %url, "http cache hit");
            return Ok(resp);
        }
        let resp = self.inner.get(url).await?;
        if resp.is_success() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(url.to_string(), resp.clone());
            }
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticClient;

    #[tokio::test]
    async fn get_ok_maps_statuses() {
        let client = StaticClient::new()
            .with("http://x/ok", 200, "fine")
            .with("http://x/boom", 503, "");
        assert_eq!(get_ok(&client, "http://x/ok").await.unwrap().text(), "fine");
        assert!(matches!(
            get_ok(&client, "http://x/missing").await,
            Err(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            get_ok(&client, "http://x/boom").await,
            Err(FetchError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn cache_serves_repeated_gets() {
        let cached = CachedClient::new(StaticClient::new().with("http://x/a", 200, "a"));
        cached.get("http://x/a").await.unwrap();
        cached.get("http://x/a").await.unwrap();
        cached.get("http://x/missing").await.unwrap();
        assert_eq!(cached.inner.requests(), vec!["http://x/a", "http://x/missing"]);
        assert_eq!(cached.len(), 1);
    }
}
