//! Job document types
//!
//! Only the fields needed to locate a job's artifacts are modelled; everything
//! else in the document is ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProwJob {
    #[serde(default)]
    pub spec: ProwJobSpec,
    #[serde(default)]
    pub status: ProwJobStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProwJobSpec {
    #[serde(default)]
    pub pod_spec: PodSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProwJobStatus {
    /// Link to the job's results, pointing into the object store
    #[serde(default)]
    pub url: String,
}
