//! Everything a fetch needs besides the store, built once and passed in.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::FetchError;
use crate::client::{CachedClient, HttpClient};
use crate::config::SyncConfig;
use crate::opendata::{OrganeDirectory, SenateurDirectory};

pub struct FetchContext {
    pub client: Box<dyn HttpClient>,
    pub config: SyncConfig,
    pub organes: OrganeDirectory,
    pub senateurs: SenateurDirectory,
    running: Arc<Mutex<HashSet<i64>>>,
}

impl FetchContext {
    pub fn new(client: Box<dyn HttpClient>, config: SyncConfig) -> Self {
        Self {
            client,
            config,
            organes: OrganeDirectory::default(),
            senateurs: SenateurDirectory::default(),
            running: Arc::default(),
        }
    }

    pub fn with_organes(mut self, organes: OrganeDirectory) -> Self {
        self.organes = organes;
        self
    }

    pub fn with_senateurs(mut self, senateurs: SenateurDirectory) -> Self {
        self.senateurs = senateurs;
        self
    }

    /// Build the production context: live client (cached when configured)
    /// and the open-data files named in the config.
    #[cfg(feature = "http")]
    pub fn from_config(config: SyncConfig) -> Result<Self, FetchError> {
        let live = crate::http::ReqwestClient::new(config.timeout())?;
        let client: Box<dyn HttpClient> = if config.http_cache {
            Box::new(CachedClient::new(live))
        } else {
            Box::new(live)
        };
        let organes = match &config.organes_path {
            Some(path) => OrganeDirectory::load(path)?,
            None => OrganeDirectory::default(),
        };
        let senateurs = match &config.senateurs_path {
            Some(path) => SenateurDirectory::load(path)?,
            None => SenateurDirectory::default(),
        };
        tracing::info!(
            an = %config.an_base_url(),
            senat = %config.senat_base_url(),
            cache = config.http_cache,
            "fetch context ready"
        );
        Ok(Self::new(client, config)
            .with_organes(organes)
            .with_senateurs(senateurs))
    }

    /// Wrap an arbitrary client in the URL cache.
    pub fn cached<C: HttpClient + 'static>(client: C, config: SyncConfig) -> Self {
        Self::new(Box::new(CachedClient::new(client)), config)
    }

    pub fn client(&self) -> &dyn HttpClient {
        self.client.as_ref()
    }

    /// Mark `lecture_id` as being fetched until the guard is dropped.
    pub fn lock_lecture(&self, lecture_id: i64) -> Result<RunGuard, FetchError> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| FetchError::AlreadyRunning(lecture_id))?;
        if !running.insert(lecture_id) {
            return Err(FetchError::AlreadyRunning(lecture_id));
        }
        Ok(RunGuard {
            running: Arc::clone(&self.running),
            lecture_id,
        })
    }
}

/// Releases the per-lecture run lock on drop.
pub struct RunGuard {
    running: Arc<Mutex<HashSet<i64>>>,
    lecture_id: i64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Ok(mut running) = self.running.lock() {
            running.remove(&self.lecture_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticClient;

    #[test]
    fn one_run_per_lecture() {
        let ctx = FetchContext::new(Box::new(StaticClient::new()), SyncConfig::default());
        let guard = ctx.lock_lecture(1).unwrap();
        assert!(matches!(ctx.lock_lecture(1), Err(FetchError::AlreadyRunning(1))));
        assert!(ctx.lock_lecture(2).is_ok());
        drop(guard);
        assert!(ctx.lock_lecture(1).is_ok());
    }
}
