//! End-to-end report run
//!
//! Resolve the job, list and classify its artifacts, aggregate them, write the
//! report and render it. The first error ends the run; if it happens before
//! the write step no output file is produced.

use std::path::PathBuf;
use std::sync::Arc;

use futures::TryStreamExt;
use tracing::info;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::job::{self, HttpJobSource, JobDescriptor, JobSource};
use crate::junit::TestSuites;
use crate::report::{
    write_report, CommandRenderer, Renderer, ReportAggregator, JUNIT_FILENAME, SUMMARY_FILENAME,
};
use crate::storage::{list_artifacts, ArtifactRole, GcsStore, ObjectStore};

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job: JobDescriptor,
    pub junit_path: PathBuf,
    pub summary_path: PathBuf,
    pub suites: usize,
    pub tests: u32,
    pub failures: u32,
}

pub struct ReportPipeline {
    config: ReportConfig,
    jobs: Arc<dyn JobSource>,
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn Renderer>,
}

impl ReportPipeline {
    pub fn new(
        config: ReportConfig,
        jobs: Arc<dyn JobSource>,
        store: Arc<dyn ObjectStore>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            jobs,
            store,
            renderer,
        }
    }

    /// Pipeline talking to the configured job service, bucket and renderer
    pub fn from_config(config: ReportConfig) -> Result<Self> {
        let jobs = Arc::new(HttpJobSource::new(&config.job_service_url));
        let store = Arc::new(GcsStore::new(&config.storage_api_url, &config.bucket)?);
        let renderer = Arc::new(CommandRenderer::from_config(&config.renderer));
        Ok(Self::new(config, jobs, store, renderer))
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let job_id = self.config.job_id()?;
        let job = job::resolve(self.jobs.as_ref(), job_id, &self.config.bucket).await?;

        let report = self.collect(&job.prefix).await?;

        let artifact_dir = self.config.artifact_dir();
        let junit_path = artifact_dir.join(JUNIT_FILENAME);
        let summary_path = artifact_dir.join(SUMMARY_FILENAME);

        write_report(&report, &junit_path).await?;
        self.renderer.render(&junit_path, &summary_path).await?;

        Ok(RunSummary {
            job,
            junit_path,
            summary_path,
            suites: report.test_suites.len(),
            tests: report.tests,
            failures: report.failures,
        })
    }

    /// Build the aggregate report for the artifacts under `prefix`
    ///
    /// Listing and processing together must finish within the configured
    /// deadline.
    pub async fn collect(&self, prefix: &str) -> Result<TestSuites> {
        let deadline = self.config.deadline();
        info!(prefix, ?deadline, "Collecting artifacts");

        tokio::time::timeout(deadline, self.aggregate(prefix))
            .await
            .map_err(|_| ReportError::Deadline(deadline))?
    }

    async fn aggregate(&self, prefix: &str) -> Result<TestSuites> {
        let store = self.store.as_ref();
        let mut aggregator = ReportAggregator::new(
            &self.config.suite_name,
            &self.config.browse_url_prefix,
            &self.config.gather_marker,
        );

        let artifacts = list_artifacts(store, prefix);
        futures::pin_mut!(artifacts);

        while let Some(artifact) = artifacts.try_next().await? {
            info!(path = %artifact.relative_path, "Processing artifact");
            match artifact.role {
                ArtifactRole::CompletionMarker => {
                    aggregator.process_marker(store, &artifact).await?;
                }
                ArtifactRole::EmbeddedReport => {
                    let report = store.read(&artifact.name).await?;
                    aggregator.merge_embedded(&report)?;
                }
                // Build logs are read alongside their step's marker.
                ArtifactRole::BuildLog => {}
            }
        }

        aggregator.finish()
    }
}
