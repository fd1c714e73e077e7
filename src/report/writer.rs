//! Report output

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::junit::TestSuites;

/// Aggregate report, written under the artifact directory
pub const JUNIT_FILENAME: &str = "junit.xml";
/// HTML summary rendered from the aggregate report
pub const SUMMARY_FILENAME: &str = "junit-summary.html";

/// Encode `report` and write it to `path`
///
/// Nothing is written if encoding fails. A failed write may leave a partial
/// file behind.
pub async fn write_report(report: &TestSuites, path: &Path) -> Result<()> {
    let xml = report.to_xml()?;
    tokio::fs::write(path, xml).await?;
    info!(path = %path.display(), "Wrote report");
    Ok(())
}
