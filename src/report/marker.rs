//! Step completion markers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ReportError, Result};

/// Contents of a step's `finished.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Finished {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl Finished {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ReportError::malformed("completion marker", e))
    }

    /// The step's outcome; a marker without one cannot be trusted either way
    pub fn passed(&self) -> Result<bool> {
        self.passed.ok_or_else(|| {
            ReportError::Malformed("completion marker has no passed field".to_string())
        })
    }
}
