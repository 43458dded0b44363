use serde::{Deserialize, Serialize};

/// Host resource inventory, gathered independently of the virtualization
/// verdict. Values are rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemResources {
    #[serde(rename = "ramGB")]
    pub ram_gb: f64,
    #[serde(rename = "diskSpaceGB")]
    pub disk_space_gb: f64,
    #[serde(rename = "cpuCores")]
    pub cpu_cores: usize,
}

/// Which detection tier produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Structured system inventory (DMI strings, cpu flags) matched.
    Inventory,
    /// Platform command fallback answered.
    SystemCommand,
    /// No tier produced a definitive answer.
    Unknown,
}

/// Result of the one-shot environment probe run at session start.
///
/// A total detection failure yields `is_virtual: false` with `error` set —
/// the probe records that it could not tell, it never fabricates a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDetection {
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<String>,
    pub detection_method: DetectionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_resources: Option<SystemResources>,
}

impl VmDetection {
    /// The "could not tell" result carrying the failure reason.
    pub fn unknown(error: impl Into<String>) -> Self {
        Self {
            is_virtual: false,
            virtual_host: None,
            detection_method: DetectionMethod::Unknown,
            error: Some(error.into()),
            system_resources: None,
        }
    }
}
