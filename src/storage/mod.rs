//! Object store access
//!
//! This module contains:
//! - `gcs` - Anonymous access to a Google Cloud Storage bucket over its JSON API
//! - `memory` - An in-memory store for tests and offline runs
//! - `listing` - Lazy, classified listing of a job's artifacts
//!
//! The store is an explicit value handed to the components that need it; there
//! is no process-wide client.

pub mod gcs;
pub mod listing;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use gcs::GcsStore;
pub use listing::{list_artifacts, list_objects, relative_path, ArtifactObject};
pub use memory::MemoryStore;

/// Step completion marker
pub const FINISHED_FILENAME: &str = "finished.json";
/// Build log written next to each step's completion marker
pub const BUILD_LOG_FILENAME: &str = "build-log.txt";
/// JUnit report produced by the job's own test run
pub const EMBEDDED_REPORT_FILENAME: &str = "e2e-report.xml";

/// A listed object, identified by its full name in the bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectInfo>,
    /// Token for the following page; `None` once the listing is exhausted
    pub next_page_token: Option<String>,
}

/// Role of an artifact, decided by its filename suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    CompletionMarker,
    BuildLog,
    EmbeddedReport,
}

impl ArtifactRole {
    pub fn classify(name: &str) -> Option<Self> {
        if name.ends_with(FINISHED_FILENAME) {
            Some(Self::CompletionMarker)
        } else if name.ends_with(EMBEDDED_REPORT_FILENAME) {
            Some(Self::EmbeddedReport)
        } else if name.ends_with(BUILD_LOG_FILENAME) {
            Some(Self::BuildLog)
        } else {
            None
        }
    }
}

/// Read-only access to a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects whose names start with `prefix`
    async fn list_page(&self, prefix: &str, page_token: Option<String>) -> Result<ObjectPage>;

    /// Read an object's full contents
    async fn read(&self, name: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            ArtifactRole::classify("logs/1/artifacts/e2e/build/finished.json"),
            Some(ArtifactRole::CompletionMarker)
        );
        assert_eq!(
            ArtifactRole::classify("logs/1/artifacts/e2e/test/artifacts/e2e-report.xml"),
            Some(ArtifactRole::EmbeddedReport)
        );
        assert_eq!(
            ArtifactRole::classify("logs/1/artifacts/e2e/test/build-log.txt"),
            Some(ArtifactRole::BuildLog)
        );
        assert_eq!(ArtifactRole::classify("logs/1/artifacts/e2e/test/started.json"), None);
        assert_eq!(ArtifactRole::classify("logs/1/finished.json.tmp"), None);
    }
}
