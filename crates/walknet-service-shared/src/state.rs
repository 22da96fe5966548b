//! Application state shared by axum handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use walknet_lib::{EngineConfig, Error as LibError, SqliteStore, WalkEngine};

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// Network catalog file not found.
    DatabaseNotFound(PathBuf),

    /// The catalog opened but the initial graph build failed.
    Engine(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseNotFound(path) => {
                write!(f, "network catalog not found: {}", path.display())
            }
            Self::Engine(e) => write!(f, "failed to load walking network: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::DatabaseNotFound(_) => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        match err {
            LibError::DatabaseNotFound { path } => Self::DatabaseNotFound(path),
            other => Self::Engine(other),
        }
    }
}

/// Shared application state.
///
/// Cheap to clone; every clone points at the same engine, so a rebuild
/// triggered through one handler is visible to all of them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<WalkEngine>,
}

impl AppState {
    /// Open the SQLite catalog at `db_path` and build the first snapshot.
    pub fn load(db_path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, AppStateError> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(AppStateError::DatabaseNotFound(db_path.to_path_buf()));
        }

        tracing::info!(path = %db_path.display(), "opening network catalog");
        let store = SqliteStore::open(db_path)?;
        let engine = WalkEngine::open(Arc::new(store), config)?;
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: WalkEngine) -> Self {
        Self {
            inner: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &WalkEngine {
        &self.inner
    }

    /// Run `work` against the engine on tokio's blocking pool.
    ///
    /// Graph searches and rebuilds are CPU-bound and must not stall the
    /// async workers. A panicking task surfaces as a store error.
    pub async fn run<T, F>(&self, work: F) -> Result<T, LibError>
    where
        F: FnOnce(&WalkEngine) -> Result<T, LibError> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || work(&engine))
            .await
            .unwrap_or_else(|join_error| {
                Err(LibError::Store {
                    message: format!("engine task failed: {join_error}"),
                })
            })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ready", &self.inner.is_ready())
            .field("resolver", &self.inner.config().resolver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;

    #[test]
    fn test_app_state_clone_shares_engine() {
        let state1 = test_state();
        let state2 = state1.clone();
        assert!(std::ptr::eq(state1.engine(), state2.engine()));
    }

    #[test]
    fn test_app_state_debug() {
        let debug = format!("{:?}", test_state());
        assert!(debug.contains("AppState"));
        assert!(debug.contains("ready: true"));
    }

    #[test]
    fn test_app_state_load_nonexistent() {
        let result = AppState::load("/nonexistent/walknet.db", EngineConfig::default());
        match result.unwrap_err() {
            AppStateError::DatabaseNotFound(path) => {
                assert!(path.display().to_string().contains("nonexistent"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_executes_on_blocking_pool() {
        let state = test_state();
        let stats = state.run(|engine| engine.stats()).await.unwrap();
        assert!(stats.node_count > 0);
    }

    #[tokio::test]
    async fn test_run_propagates_library_errors() {
        let state = test_state();
        let err = state
            .run(|_| -> Result<(), LibError> { Err(LibError::RebuildInProgress) })
            .await
            .unwrap_err();
        assert!(matches!(err, LibError::RebuildInProgress));
    }
}
