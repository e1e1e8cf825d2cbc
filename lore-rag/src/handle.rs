//! Lazily opened, resettable [`Assistant`] owned by the hosting process.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::assistant::Assistant;
use crate::config::LoreConfig;
use crate::error::Result;

/// Holds at most one [`Assistant`], opened on first use.
///
/// Opening reads the whole index, so callers share one instance through
/// [`get_or_init`](Self::get_or_init). After re-ingesting, call
/// [`reset`](Self::reset) so the next request reopens the new index.
/// A failed open is not cached.
pub struct AssistantHandle {
    config: LoreConfig,
    cell: Mutex<Option<Arc<Assistant>>>,
}

impl AssistantHandle {
    /// Create an empty handle for `config`.
    pub fn new(config: LoreConfig) -> Self {
        Self { config, cell: Mutex::new(None) }
    }

    /// The configuration assistants are opened with.
    pub fn config(&self) -> &LoreConfig {
        &self.config
    }

    /// Return the open assistant, opening it with [`Assistant::from_config`]
    /// if needed.
    ///
    /// # Errors
    ///
    /// Propagates the open error; the next call tries again.
    pub async fn get_or_init(&self) -> Result<Arc<Assistant>> {
        self.get_or_init_with(|config| {
            let config = config.clone();
            async move { Assistant::from_config(&config).await }
        })
        .await
    }

    /// Like [`get_or_init`](Self::get_or_init) with a custom opener.
    pub async fn get_or_init_with<F, Fut>(&self, open: F) -> Result<Arc<Assistant>>
    where
        F: FnOnce(&LoreConfig) -> Fut,
        Fut: Future<Output = Result<Assistant>>,
    {
        let mut cell = self.cell.lock().await;
        if let Some(assistant) = cell.as_ref() {
            return Ok(Arc::clone(assistant));
        }
        debug!("opening assistant");
        let assistant = Arc::new(open(&self.config).await?);
        *cell = Some(Arc::clone(&assistant));
        Ok(assistant)
    }

    /// Drop the cached assistant.
    pub async fn reset(&self) {
        debug!("resetting assistant");
        self.cell.lock().await.take();
    }

    /// Whether an assistant is currently open.
    pub async fn is_initialized(&self) -> bool {
        self.cell.lock().await.is_some()
    }
}
