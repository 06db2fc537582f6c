//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::gemini::{ContentGenerator, GeminiClient, GeminiError};
use crate::services::uploads::UploadStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    generator: Arc<dyn ContentGenerator>,
    uploads: UploadStore,
}

impl AppState {
    /// Create application state backed by the Gemini API.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Result<Self, GeminiError> {
        let client = GeminiClient::new(&config.gemini)?;
        Ok(Self::with_generator(config, pool, Arc::new(client)))
    }

    /// Create application state with an explicit content generator.
    #[must_use]
    pub fn with_generator(
        config: ServerConfig,
        pool: SqlitePool,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let uploads = UploadStore::from_config(&config);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                generator,
                uploads,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get the content generator used for advice.
    #[must_use]
    pub fn generator(&self) -> &dyn ContentGenerator {
        self.inner.generator.as_ref()
    }

    /// Get the upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }
}
