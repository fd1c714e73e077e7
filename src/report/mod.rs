//! Report synthesis
//!
//! This module contains:
//! - `marker` - Step completion markers (`finished.json`)
//! - `aggregator` - Builds the synthesized suite and folds in an embedded report
//! - `writer` - Writes the aggregate report to disk
//! - `render` - External HTML rendering of the written report

pub mod aggregator;
pub mod marker;
pub mod render;
pub mod writer;

pub use aggregator::ReportAggregator;
pub use marker::Finished;
pub use render::{CommandRenderer, NoopRenderer, Renderer};
pub use writer::{write_report, JUNIT_FILENAME, SUMMARY_FILENAME};
