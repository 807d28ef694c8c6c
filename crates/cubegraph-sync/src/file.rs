//! File-backed graph sync
//!
//! Writes the sync payload as pretty JSON so it can be reviewed or handed to
//! the catalog client out of band. The API key is never written.

use crate::sync::{GraphSync, SyncError, SyncRequest, SyncSummary};
use cubegraph_core::OutputGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Payload written to disk
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncPayload<'a> {
    org: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<&'a str>,
    workspaces: &'a BTreeMap<String, String>,
    graph: &'a OutputGraph,
    options: &'a [serde_json::Value],
}

/// Graph sync that writes the payload to a file
#[derive(Debug, Clone)]
pub struct FileSync {
    path: PathBuf,
}

impl FileSync {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(request: &SyncRequest) -> Result<String, SyncError> {
        let payload = SyncPayload {
            org: &request.credentials.org,
            base_url: request.credentials.base_url.as_deref(),
            workspaces: &request.workspaces,
            graph: &request.graph,
            options: &request.options,
        };

        serde_json::to_string_pretty(&payload)
            .map_err(|e| SyncError::SerializeError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl GraphSync for FileSync {
    fn name(&self) -> &'static str {
        "File"
    }

    async fn sync(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        let json = Self::render(request)?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| SyncError::IoError(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!(path = %self.path.display(), components = request.graph.components.len(), "Wrote sync payload");
        Ok(SyncSummary::for_request(self.path.display().to_string(), request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ApiCredentials;

    #[test]
    fn payload_omits_api_key() {
        let request = SyncRequest::new(
            ApiCredentials::new("secret-key", "acme"),
            BTreeMap::from([("cubes".to_string(), "Cube Model".to_string())]),
            OutputGraph::default(),
        );

        let json = FileSync::render(&request).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(json.contains("\"org\": \"acme\""));
        assert!(json.contains("Cube Model"));
        assert!(!json.contains("baseUrl"));
    }
}
