//! Graph synchronization seam
//!
//! The remote graph catalog API is an external collaborator. This crate
//! defines the request it receives, the `GraphSync` trait implemented by
//! clients, and two local implementations:
//! - `MockSync` - records requests in memory, can simulate failures
//! - `FileSync` - writes the sync payload to a JSON file
//!
//! ## Example
//!
//! ```rust,ignore
//! use cubegraph_sync::{ApiCredentials, FileSync, GraphSync, SyncRequest};
//!
//! let request = SyncRequest::new(ApiCredentials::from_env()?, workspaces, graph);
//! let summary = FileSync::new("payload.json").sync(&request).await?;
//! ```

pub mod sync;
pub mod mock;
pub mod file;

pub use sync::{ApiCredentials, GraphSync, SyncError, SyncRequest, SyncSummary};
pub use mock::MockSync;
pub use file::FileSync;
