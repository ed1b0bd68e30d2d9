//! Document store seam. The runtime writes through it and reads from it only when hydrating.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

pub const KIND_BIRTH_DATA: &str = "birth_data";
pub const KIND_CHART: &str = "birth_chart";
pub const KIND_TRANSIT: &str = "transit_state";
pub const KIND_GROUP: &str = "group";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("persistence backend failed: {0}")]
    Backend(String),
    #[error("stored {kind}/{id} is malformed: {source}")]
    Malformed {
        kind: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn get(&self, kind: &str, id: &str) -> Result<Option<Value>, PersistenceError>;

    async fn put(&self, kind: &str, id: &str, document: Value) -> Result<(), PersistenceError>;

    /// Ids stored under `kind`, in ascending order.
    async fn list(&self, kind: &str) -> Result<Vec<String>, PersistenceError>;
}

/// In-process store, for tests and the daemon's default.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    documents: RwLock<BTreeMap<(String, String), Value>>,
    failing: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with [`PersistenceError::Backend`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend("memory store switched to failing mode".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn get(&self, kind: &str, id: &str) -> Result<Option<Value>, PersistenceError> {
        self.check()?;
        let documents = self.documents.read().await;
        Ok(documents.get(&(kind.to_string(), id.to_string())).cloned())
    }

    async fn put(&self, kind: &str, id: &str, document: Value) -> Result<(), PersistenceError> {
        self.check()?;
        self.documents
            .write()
            .await
            .insert((kind.to_string(), id.to_string()), document);
        Ok(())
    }

    async fn list(&self, kind: &str) -> Result<Vec<String>, PersistenceError> {
        self.check()?;
        let documents = self.documents.read().await;
        Ok(documents
            .keys()
            .filter(|(k, _)| k == kind)
            .map(|(_, id)| id.clone())
            .collect())
    }
}
