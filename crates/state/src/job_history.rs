//! Archive job history.

use feedarchive_store::KvEngine;
use feedarchive_types::{JobHistory, decode, encode, validation::validate_name};
use snafu::ResultExt;
use tracing::debug;

use crate::error::{CodecSnafu, EngineSnafu, InvalidIdentitySnafu, NotFoundSnafu, Result};
use crate::keys::Key;

/// Job history storage, keyed by the job's external string id.
pub struct JobHistoryStore;

impl JobHistoryStore {
    /// Fetches the history of job `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no history is stored.
    pub fn get<E: KvEngine + ?Sized>(engine: &E, id: &str) -> Result<JobHistory> {
        validate_name("id", id).context(InvalidIdentitySnafu)?;
        match engine.get(&Key::job_history(id).encode()).context(EngineSnafu)? {
            Some(bytes) => decode(&bytes).context(CodecSnafu),
            None => NotFoundSnafu { kind: "archive history", id }.fail(),
        }
    }

    /// Stores `job`, replacing any previous history for its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for an empty or malformed id, and
    /// engine or codec errors from the write.
    pub fn save<E: KvEngine + ?Sized>(engine: &E, job: &JobHistory) -> Result<()> {
        validate_name("id", &job.id).context(InvalidIdentitySnafu)?;
        let value = encode(job).context(CodecSnafu)?;
        engine.put(&Key::job_history(job.id.as_str()).encode(), &value).context(EngineSnafu)?;
        debug!(job = %job.id, status = ?job.status, "Stored archive history");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use feedarchive_store::InMemoryEngine;
    use feedarchive_types::JobStatus;

    use super::*;

    #[test]
    fn test_save_then_get() {
        let engine = InMemoryEngine::new();
        let job = JobHistory {
            id: "foobar".to_string(),
            status: JobStatus::Running,
            entries_archived: 120,
            state: vec![1, 2, 3],
            ..JobHistory::default()
        };
        JobHistoryStore::save(&engine, &job).unwrap();
        assert_eq!(JobHistoryStore::get(&engine, "foobar").unwrap(), job);
    }

    #[test]
    fn test_missing_history() {
        let engine = InMemoryEngine::new();
        let err = JobHistoryStore::get(&engine, "foobar").unwrap_err();
        assert_eq!(err.to_string(), "archive history foobar not found");
    }

    #[test]
    fn test_empty_id_rejected() {
        let engine = InMemoryEngine::new();
        assert!(JobHistoryStore::save(&engine, &JobHistory::default()).is_err());
        assert!(engine.is_empty());
    }
}
