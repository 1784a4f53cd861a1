use crate::{
    coordinator::next_generated_at, GeneratedArtifact, Identity, PipelineError, SearchHistoryEntry, UserRecord, UserStore,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Appends new sheets and searches to a user's record.
pub struct HistoryRecorder {
    store: Arc<dyn UserStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Load the user's record, creating and persisting a fresh one when the
    /// user has none yet.
    pub async fn ensure_user(&self, identity: &Identity) -> Result<UserRecord, PipelineError> {
        if let Some(record) = self
            .store
            .get(identity.key())
            .await
            .map_err(PipelineError::Store)?
        {
            return Ok(record);
        }

        let record = UserRecord::new(identity, Utc::now());
        self.store
            .put(identity.key(), record.clone())
            .await
            .map_err(PipelineError::Store)?;
        debug!(user = identity.key(), "created user record");
        Ok(record)
    }

    /// Append `artifact` and a search entry for `query_title`, then write the
    /// whole record back. The appended artifact is the last entry of the
    /// returned record's `generated_sheets`; its `generated_at` is moved past
    /// the record's latest key when another generation got there first.
    ///
    /// One read-modify-write against the store with no concurrency check:
    /// two concurrent calls for the same user may lose one update. Store
    /// failures are logged and the updated record is still returned. When
    /// the read fails nothing is written, so the stored document is never
    /// replaced by a partial one.
    pub async fn record(
        &self,
        identity: &Identity,
        mut artifact: GeneratedArtifact,
        query_title: &str,
    ) -> UserRecord {
        let (mut record, writable) = match self.store.get(identity.key()).await {
            Ok(Some(record)) => (record, true),
            Ok(None) => (UserRecord::new(identity, Utc::now()), true),
            Err(error) => {
                warn!(user = identity.key(), error = %error, "failed to read user record, history not persisted");
                (UserRecord::new(identity, Utc::now()), false)
            }
        };

        if let Some(latest) = record
            .latest_generated_at()
            .filter(|latest| artifact.generated_at <= *latest)
        {
            artifact.generated_at = next_generated_at(Some(latest));
            debug!(
                user = identity.key(),
                generated_at = %artifact.generated_at,
                "re-stamped colliding cheat sheet key"
            );
        }
        record.generated_sheets.push(artifact);
        record.recent_searches.push(SearchHistoryEntry {
            title: query_title.to_string(),
            time: Utc::now(),
        });

        if writable {
            match self.store.put(identity.key(), record.clone()).await {
                Ok(()) => debug!(
                    user = identity.key(),
                    sheets = record.generated_sheets.len(),
                    "persisted cheat sheet"
                ),
                Err(error) => {
                    warn!(user = identity.key(), error = %error, "failed to persist user record");
                }
            }
        }

        record
    }
}
