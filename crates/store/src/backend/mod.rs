//! Engine implementations and the config-driven factory.

mod file;
mod memory;

use std::sync::Arc;

use feedarchive_types::config::{BackendKind, EngineConfig};

pub use file::RedbEngine;
pub use memory::InMemoryEngine;

use crate::engine::KvEngine;
use crate::error::{Error, Result};

/// Builds the engine described by `config`.
///
/// # Errors
///
/// Returns [`Error::Unavailable`] if the redb backend has no path, or
/// [`Error::Open`] if the database file cannot be opened.
pub fn open_engine(config: &EngineConfig) -> Result<Arc<dyn KvEngine>> {
    match config.backend {
        BackendKind::InMemory => {
            tracing::debug!("Opening in-memory engine");
            Ok(Arc::new(InMemoryEngine::new()))
        },
        BackendKind::Redb => {
            let Some(path) = config.path.as_deref() else {
                return Err(Error::Unavailable {
                    reason: "redb backend requires engine.path".to_string(),
                });
            };
            let engine = RedbEngine::open(path, config.scan_batch_size)?;
            tracing::info!(
                path = %path.display(),
                scan_batch_size = config.scan_batch_size,
                "Opened redb engine"
            );
            Ok(Arc::new(engine))
        },
    }
}
