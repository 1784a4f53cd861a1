use crate::{errors::BoxedError, UserRecord};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Persistent per-user document store keyed by identity.
/// `put` replaces the whole document; there is no partial update and no
/// optimistic concurrency check.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<UserRecord>, BoxedError>;
    async fn put(&self, key: &str, record: UserRecord) -> Result<(), BoxedError>;
}

/// Process-local [`UserStore`]. Useful for tests and demos.
#[derive(Default)]
pub struct InMemoryUserStore {
    records: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, key: &str) -> Result<Option<UserRecord>, BoxedError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, record: UserRecord) -> Result<(), BoxedError> {
        self.records.lock().await.insert(key.to_string(), record);
        Ok(())
    }
}
