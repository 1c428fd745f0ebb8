//! Periodically refreshed shared state.
//!
//! A [`SharedCache`] is read by handlers as a cheap snapshot and replaced
//! wholesale by a background task. Readers never wait on the refresh.

use crate::error::ModuleError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Snapshot-read, replace-on-write cell.
#[derive(Debug)]
pub struct SharedCache<T> {
    value: RwLock<Arc<T>>,
}

impl<T: Default> Default for SharedCache<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> SharedCache<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.value.read())
    }

    pub fn replace(&self, value: T) {
        *self.value.write() = Arc::new(value);
    }
}

/// Something a refresher can pull fresh values from.
#[async_trait]
pub trait Source<T>: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<T, ModuleError>;
}

/// Keep `cache` fed from `source`: refetch every `interval`, or after
/// `retry` when a fetch fails. Failures are logged and never reach readers,
/// who keep the last good snapshot.
pub fn spawn_refresh<T, S>(
    cache: Arc<SharedCache<T>>,
    source: S,
    interval: Duration,
    retry: Duration,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    S: Source<T> + 'static,
{
    tokio::spawn(async move {
        loop {
            let delay = match source.fetch().await {
                Ok(value) => {
                    cache.replace(value);
                    debug!(source = %source.name(), "cache refreshed");
                    interval
                }
                Err(e) => {
                    warn!(source = %source.name(), error = %e, "cache refresh failed, retrying");
                    retry
                }
            };
            tokio::time::sleep(delay).await;
        }
    })
}
