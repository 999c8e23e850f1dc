//! Configuration sink capability.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("invalid sink address: {0}")]
    Address(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A key-value store that configuration fragments are written into.
#[async_trait]
pub trait ConfigSink: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> Result<(), SinkError>;

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}

/// In-process sink, used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<DashMap<String, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort();
        entries
    }
}

#[async_trait]
impl ConfigSink for MemorySink {
    async fn put(&self, key: &str, value: &str) -> Result<(), SinkError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
