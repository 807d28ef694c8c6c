//! Sync request and the `GraphSync` trait

use cubegraph_core::OutputGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "CUBEGRAPH_API_KEY";

/// Environment variable holding the organization
pub const ORG_VAR: &str = "CUBEGRAPH_ORG";

/// Environment variable holding the API base URL
pub const API_URL_VAR: &str = "CUBEGRAPH_API_URL";

/// Credentials for the graph catalog API, passed through untouched
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiCredentials {
    /// API key
    pub api_key: String,

    /// Organization label
    pub org: String,

    /// Base URL of the API (client default when empty)
    pub base_url: Option<String>,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            org: org.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Read credentials from `CUBEGRAPH_API_KEY`, `CUBEGRAPH_ORG` and `CUBEGRAPH_API_URL`
    pub fn from_env() -> Result<Self, SyncError> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| SyncError::ConfigError(format!("{} is not set", API_KEY_VAR)))?;
        let org = std::env::var(ORG_VAR)
            .map_err(|_| SyncError::ConfigError(format!("{} is not set", ORG_VAR)))?;

        Ok(Self {
            api_key,
            org,
            base_url: std::env::var(API_URL_VAR).ok(),
        })
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("org", &self.org)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Everything the sync API receives
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// API credentials
    pub credentials: ApiCredentials,

    /// Workspace name mapping (graph workspace -> catalog workspace name)
    pub workspaces: BTreeMap<String, String>,

    /// The finished graph
    pub graph: OutputGraph,

    /// Extra client options, passed through verbatim
    pub options: Vec<serde_json::Value>,
}

impl SyncRequest {
    pub fn new(
        credentials: ApiCredentials,
        workspaces: BTreeMap<String, String>,
        graph: OutputGraph,
    ) -> Self {
        Self {
            credentials,
            workspaces,
            graph,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<serde_json::Value>) -> Self {
        self.options = options;
        self
    }
}

/// What a sync handed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Where the graph went (sink name or path)
    pub target: String,

    /// Number of components sent
    pub components: usize,

    /// Number of references sent
    pub references: usize,
}

impl SyncSummary {
    pub fn for_request(target: impl Into<String>, request: &SyncRequest) -> Self {
        Self {
            target: target.into(),
            components: request.graph.components.len(),
            references: request.graph.references.len(),
        }
    }
}

/// Errors that can occur while syncing a graph
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Rejected by the catalog: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Trait for clients that hand a finished graph to the catalog
#[async_trait::async_trait]
pub trait GraphSync: Send + Sync {
    /// Get the client name (e.g., "File", "Mock")
    fn name(&self) -> &'static str;

    /// Synchronize the request's graph
    ///
    /// The graph, workspace mapping and options must be forwarded unmodified.
    async fn sync(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError>;
}
