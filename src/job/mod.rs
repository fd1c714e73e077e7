//! Job descriptor resolution
//!
//! This module contains:
//! - `model` - The job document returned by the job-tracking service
//! - `source` - Where job documents come from (`JobSource`, `HttpJobSource`)
//!
//! `resolve` turns a job identifier into a [`JobDescriptor`]: the target the
//! job ran and the object-store prefix holding that target's artifacts.

pub mod model;
pub mod source;

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{ReportError, Result};

pub use model::{Container, PodSpec, ProwJob, ProwJobSpec, ProwJobStatus};
pub use source::{HttpJobSource, JobSource};

/// A resolved CI job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub id: String,
    /// Named execution configuration passed as `--target=<value>`
    pub target: String,
    /// Result location inside the object store
    pub url: String,
    /// Object-store prefix of the target's artifacts
    pub prefix: String,
}

/// Fetch the job document and derive its descriptor
pub async fn resolve(source: &dyn JobSource, job_id: &str, bucket: &str) -> Result<JobDescriptor> {
    let job = source.fetch(job_id).await?;
    let target = determine_target(&job)?;
    let url = job.status.url.clone();
    let prefix = object_prefix(&url, bucket, &target)?;

    info!(job_id, target = %target, prefix = %prefix, "Resolved job");

    Ok(JobDescriptor {
        id: job_id.to_string(),
        target,
        url,
        prefix,
    })
}

fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^--target=([^=]+)$").expect("valid target pattern"))
}

/// Find the `--target=<value>` argument of the job's first container
pub fn determine_target(job: &ProwJob) -> Result<String> {
    let container = job
        .spec
        .pod_spec
        .containers
        .first()
        .ok_or_else(|| ReportError::NotFound("job spec has no containers".to_string()))?;

    for arg in &container.args {
        if !arg.contains("--target") {
            continue;
        }
        debug!(arg = %arg, "Found target argument");
        return target_pattern()
            .captures(arg)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ReportError::malformed("target argument", arg));
    }

    Err(ReportError::NotFound(
        "failed to determine job target: no --target argument".to_string(),
    ))
}

/// Object-store prefix for a job's result URL
///
/// The URL must contain the bucket name exactly once. Everything after it,
/// stripped of leading slashes, is followed by `/artifacts/<target>`.
pub fn object_prefix(url: &str, bucket: &str, target: &str) -> Result<String> {
    if bucket.is_empty() {
        return Err(ReportError::Config("bucket name is empty".to_string()));
    }
    if url.matches(bucket).count() != 1 {
        return Err(ReportError::malformed(
            "failed to determine object prefix from job url",
            url,
        ));
    }
    let (_, rest) = url
        .split_once(bucket)
        .ok_or_else(|| ReportError::malformed("job url", url))?;

    Ok(format!("{}/artifacts/{}", rest.trim_start_matches('/'), target))
}
