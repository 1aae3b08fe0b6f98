use super::error::ApiError;
use crate::config::DeskConfig;
use crate::imaging::{CompressionConfig, RustBackend};
use crate::store::{FileStore, StoreError};
use std::path::Path;
use std::sync::Arc;

/// Everything a request handler needs. Built once at startup and shared
/// behind an `Arc`; dropped when the server stops.
pub struct AppState {
    pub config: DeskConfig,
    pub store: FileStore,
    pub backend: RustBackend,
    pub compression: CompressionConfig,
    /// `None` disables the admin API.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(config: DeskConfig, admin_token: Option<String>) -> Result<Arc<Self>, StoreError> {
        let store = FileStore::open(&config.storage.data_dir)?;
        std::fs::create_dir_all(&config.storage.media_dir)?;
        let compression = CompressionConfig::from_images_config(&config.images);
        Ok(Arc::new(Self {
            config,
            store,
            backend: RustBackend::new(),
            compression,
            admin_token: admin_token.filter(|t| !t.trim().is_empty()),
        }))
    }

    pub fn media_dir(&self) -> &Path {
        &self.config.storage.media_dir
    }

    /// Run `f` on the blocking pool. The store does synchronous file I/O
    /// under a mutex and must stay off the async workers.
    pub async fn run_blocking<R, F>(self: &Arc<Self>, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&AppState) -> Result<R, ApiError> + Send + 'static,
        R: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&state)).await?
    }
}
