//! Report configuration
//!
//! Defaults target the OpenShift CI deployment. Any of them can be overridden
//! from a YAML file:
//!
//! ```yaml
//! job_service_url: "https://prow.example.com"
//! bucket: my-ci-bucket
//! deadline_secs: 30
//! renderer:
//!   command: junit2html
//!   install: "go install -mod=mod github.com/psturc/junit2html@experiment"
//! ```
//!
//! The job identifier and artifact directory normally come from the
//! environment (`PROW_JOB_ID`, `ARTIFACT_DIR`) through the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

pub const DEFAULT_ARTIFACT_DIR: &str = "/tmp";

/// External HTML renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Program reading JUnit XML on stdin and writing HTML on stdout
    #[serde(default = "default_renderer_command")]
    pub command: String,

    /// Shell command run once before rendering (e.g. installing the renderer)
    #[serde(default = "default_renderer_install")]
    pub install: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: default_renderer_command(),
            install: default_renderer_install(),
        }
    }
}

fn default_renderer_command() -> String {
    "junit2html".to_string()
}

fn default_renderer_install() -> Option<String> {
    Some("go install -mod=mod github.com/psturc/junit2html@experiment".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Base URL of the job-tracking service
    #[serde(default = "default_job_service_url")]
    pub job_service_url: String,

    /// Base URL of the object store JSON API
    #[serde(default = "default_storage_api_url")]
    pub storage_api_url: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Prefix joined with an object path to browse its artifacts
    #[serde(default = "default_browse_url_prefix")]
    pub browse_url_prefix: String,

    /// Budget for the whole listing and processing phase
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Name of the synthesized suite
    #[serde(default = "default_suite_name")]
    pub suite_name: String,

    /// Steps whose marker path contains this get a browse-URL property
    #[serde(default = "default_gather_marker")]
    pub gather_marker: String,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub job_id: Option<String>,

    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,
}

fn default_job_service_url() -> String {
    "https://prow.ci.openshift.org".to_string()
}

fn default_storage_api_url() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_bucket() -> String {
    "origin-ci-test".to_string()
}

fn default_browse_url_prefix() -> String {
    "https://gcsweb-ci.apps.ci.l2s4.p1.openshiftapps.com/gcs/origin-ci-test/".to_string()
}

fn default_deadline_secs() -> u64 {
    10
}

fn default_suite_name() -> String {
    "openshift-ci job".to_string()
}

fn default_gather_marker() -> String {
    "gather".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            job_service_url: default_job_service_url(),
            storage_api_url: default_storage_api_url(),
            bucket: default_bucket(),
            browse_url_prefix: default_browse_url_prefix(),
            deadline_secs: default_deadline_secs(),
            suite_name: default_suite_name(),
            gather_marker: default_gather_marker(),
            renderer: RendererConfig::default(),
            job_id: None,
            artifact_dir: None,
        }
    }
}

impl ReportConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| ReportError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply values taken from the command line or environment
    pub fn with_overrides(mut self, job_id: Option<String>, artifact_dir: Option<PathBuf>) -> Self {
        if job_id.is_some() {
            self.job_id = job_id;
        }
        if artifact_dir.is_some() {
            self.artifact_dir = artifact_dir;
        }
        self
    }

    pub fn job_id(&self) -> Result<&str> {
        match self.job_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(ReportError::Config(
                "job id is not set (use --job-id or PROW_JOB_ID)".to_string(),
            )),
        }
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR))
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.bucket, "origin-ci-test");
        assert_eq!(config.deadline(), Duration::from_secs(10));
        assert_eq!(config.artifact_dir(), PathBuf::from("/tmp"));
        assert_eq!(config.renderer.command, "junit2html");
        assert!(config.job_id().is_err());
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
bucket: other-bucket
deadline_secs: 3
renderer:
  install: null
"#;
        let config: ReportConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bucket, "other-bucket");
        assert_eq!(config.deadline_secs, 3);
        assert_eq!(config.suite_name, "openshift-ci job");
        assert_eq!(config.renderer.command, "junit2html");
        assert!(config.renderer.install.is_none());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let yaml = r#"
job_id: from-file
artifact_dir: /from/file
"#;
        let config: ReportConfig = serde_yaml::from_str(yaml).unwrap();
        let config = config.with_overrides(Some("from-cli".to_string()), None);
        assert_eq!(config.job_id().unwrap(), "from-cli");
        assert_eq!(config.artifact_dir(), PathBuf::from("/from/file"));
    }

    #[test]
    fn test_blank_job_id_rejected() {
        let config = ReportConfig::default().with_overrides(Some("  ".to_string()), None);
        assert!(matches!(config.job_id(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.yaml");
        std::fs::write(&path, "deadline_secs: [not, a, number]").unwrap();

        let err = ReportConfig::load(&path).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
