//! Subcommand handlers.
//!
//! Each handler takes a ready [`WalkEngine`] and prints its result in the
//! requested format; `main.rs` only parses arguments and opens the catalog.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use walknet_lib::{EngineConfig, SqliteStore, WalkEngine};

pub mod loops;
pub mod route;
pub mod stats;

/// Open the SQLite catalog at `database` and build the initial snapshot.
pub fn open_engine(database: &Path, config: EngineConfig) -> Result<WalkEngine> {
    let store = SqliteStore::open(database)
        .with_context(|| format!("failed to open network catalog {}", database.display()))?;
    WalkEngine::open(Arc::new(store), config).with_context(|| {
        format!(
            "failed to build the walking network from {}",
            database.display()
        )
    })
}
