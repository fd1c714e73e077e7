//! # CI JUnit Report
//!
//! Consolidates the results of a CI job run into a single JUnit report.
//!
//! Each step of a job leaves a `finished.json` completion marker in object
//! storage; failed steps also leave a `build-log.txt`. The job's own test run
//! may publish an `e2e-report.xml`. This crate turns all of that into one
//! `junit.xml`:
//!
//! - every completion marker becomes a test case of a synthesized suite
//! - failed steps carry their build log as `system-err`
//! - steps whose path names a gather step link to their browsable artifacts
//! - an embedded report, when present, contributes its own suites and totals
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ci_junit_report::{ReportConfig, ReportPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReportConfig::default()
//!         .with_overrides(Some("0c4e5ad1-job-id".to_string()), Some("/tmp/artifacts".into()));
//!
//!     let summary = ReportPipeline::from_config(config)?.run().await?;
//!     println!("{} tests, {} failures", summary.tests, summary.failures);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod junit;
pub mod pipeline;
pub mod report;
pub mod storage;

pub use config::{RendererConfig, ReportConfig};
pub use error::{ReportError, Result};
pub use job::{HttpJobSource, JobDescriptor, JobSource, ProwJob};
pub use junit::{TestCase, TestSuite, TestSuites};
pub use pipeline::{ReportPipeline, RunSummary};
pub use report::{CommandRenderer, NoopRenderer, Renderer, ReportAggregator};
pub use storage::{ArtifactRole, GcsStore, MemoryStore, ObjectStore};
