//! Mock graph sync for testing
//!
//! Records every request in memory instead of calling the catalog.
//! Useful for unit tests, CI pipelines and demos without credentials.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sync = MockSync::new();
//! sync.sync(&request).await?;
//! assert_eq!(sync.request_count().await, 1);
//!
//! // Simulate a rejected sync
//! let sync = MockSync::new().with_failure(SyncError::Rejected("quota".into()));
//! ```

use crate::sync::{GraphSync, SyncError, SyncRequest, SyncSummary};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock graph sync that records requests
pub struct MockSync {
    /// Requests received, in order
    requests: Arc<RwLock<Vec<SyncRequest>>>,

    /// Error returned from every sync, if set
    failure: Option<SyncError>,

    /// Simulated latency (milliseconds)
    latency_ms: u64,
}

impl MockSync {
    /// Create a mock that accepts every request
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            failure: None,
            latency_ms: 0,
        }
    }

    /// Fail every sync with the given error
    pub fn with_failure(mut self, error: SyncError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Delay every sync
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of accepted requests
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// The most recent accepted request
    pub async fn last_request(&self) -> Option<SyncRequest> {
        self.requests.read().await.last().cloned()
    }

    /// Forget all recorded requests
    pub async fn clear(&self) {
        self.requests.write().await.clear();
    }
}

impl Default for MockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockSync {
    fn clone(&self) -> Self {
        Self {
            requests: Arc::clone(&self.requests),
            failure: self.failure.clone(),
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl GraphSync for MockSync {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn sync(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        self.requests.write().await.push(request.clone());
        Ok(SyncSummary::for_request(self.name(), request))
    }
}
