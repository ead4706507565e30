//! Application state shared across handlers.

use std::sync::Arc;

use booklist_core::GradeCatalogue;
use sqlx::PgPool;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Grades tracked by the ledger and day-end reports.
    #[must_use]
    pub fn grades(&self) -> &GradeCatalogue {
        &self.inner.config.grades
    }
}
