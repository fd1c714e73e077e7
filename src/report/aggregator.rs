//! Aggregate report construction
//!
//! Every completion marker becomes one test case of the synthesized suite.
//! At most one embedded report may be folded in; its suites come first in the
//! finished report and the synthesized suite is appended last.

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info};

use super::Finished;
use crate::error::{ReportError, Result};
use crate::junit::{TestCase, TestSuite, TestSuites};
use crate::storage::{ArtifactObject, ObjectStore, BUILD_LOG_FILENAME, FINISHED_FILENAME};

const BROWSE_SUFFIX: &str = "artifacts";

pub struct ReportAggregator {
    suite: TestSuite,
    embedded: Option<TestSuites>,
    browse_url_prefix: String,
    gather_marker: String,
}

impl ReportAggregator {
    pub fn new(suite_name: &str, browse_url_prefix: &str, gather_marker: &str) -> Self {
        let mut suite = TestSuite::new(suite_name);
        suite.timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        Self {
            suite,
            embedded: None,
            browse_url_prefix: browse_url_prefix.to_string(),
            gather_marker: gather_marker.to_string(),
        }
    }

    /// The synthesized suite built so far
    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    /// Turn one completion marker into a test case
    pub async fn process_marker(
        &mut self,
        store: &dyn ObjectStore,
        marker: &ArtifactObject,
    ) -> Result<&TestCase> {
        let step = step_name(&marker.relative_path);
        let step_dir = marker
            .name
            .strip_suffix(FINISHED_FILENAME)
            .ok_or_else(|| {
                ReportError::InvariantViolation(format!("{} is not a completion marker", marker.name))
            })?;

        if !self.gather_marker.is_empty() && marker.relative_path.contains(&self.gather_marker) {
            let url = format!("{}{}{}", self.browse_url_prefix, step_dir, BROWSE_SUFFIX);
            debug!(step, url = %url, "Adding artifacts link");
            self.suite.add_property(step, &url);
        }

        let finished = Finished::from_slice(&store.read(&marker.name).await?)?;
        let passed = finished.passed()?;

        let case = if passed {
            info!("{} has passed", step);
            TestCase::passed(step)
        } else {
            info!(result = ?finished.result, "{} has failed", step);
            let log_name = format!("{}{}", step_dir, BUILD_LOG_FILENAME);
            let log = store.read(&log_name).await?;
            self.suite.failures += 1;
            TestCase::failed(
                step,
                &format!("{} has failed", step),
                &String::from_utf8_lossy(&log),
            )
        };
        self.suite.tests += 1;
        self.suite.test_cases.push(case);

        Ok(&self.suite.test_cases[self.suite.test_cases.len() - 1])
    }

    /// Fold an embedded JUnit report into the aggregate
    ///
    /// Only one embedded report is accepted per run.
    pub fn merge_embedded(&mut self, report: &[u8]) -> Result<()> {
        if self.embedded.is_some() {
            return Err(ReportError::InvariantViolation(
                "found more than one embedded report".to_string(),
            ));
        }

        let suites = TestSuites::from_xml(report)?;
        info!(
            suites = suites.test_suites.len(),
            tests = suites.tests,
            failures = suites.failures,
            "Merged embedded report"
        );
        self.embedded = Some(suites);
        Ok(())
    }

    /// Finish the aggregate: embedded suites first, synthesized suite last
    ///
    /// Top-level counters are the embedded report's totals plus the
    /// synthesized suite's. Totals that do not fit a `u32` are Malformed.
    pub fn finish(self) -> Result<TestSuites> {
        let mut report = self.embedded.unwrap_or_default();
        report.tests = add_counter("tests", report.tests, self.suite.tests)?;
        report.failures = add_counter("failures", report.failures, self.suite.failures)?;
        report.errors = add_counter("errors", report.errors, self.suite.errors)?;
        report.test_suites.push(self.suite);
        Ok(report)
    }
}

fn add_counter(name: &str, embedded: u32, synthesized: u32) -> Result<u32> {
    embedded.checked_add(synthesized).ok_or_else(|| {
        ReportError::Malformed(format!(
            "embedded report {} count {} overflows when adding {}",
            name, embedded, synthesized
        ))
    })
}

/// First path segment of a marker's relative path
fn step_name(relative_path: &str) -> &str {
    relative_path.split('/').next().unwrap_or(relative_path)
}
