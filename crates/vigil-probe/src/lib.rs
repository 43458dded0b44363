//! One-shot, best-effort environment probe: is this host a virtual
//! machine, and what hardware does it report?
//!
//! Detection is tiered. A structured inventory scan runs first; if it is
//! inconclusive a platform command is invoked as a last resort, with a
//! bounded wait so a hung utility cannot stall session start. Total
//! failure yields `is_virtual: false` with the error recorded — the probe
//! never fabricates a verdict. Resource inventory is gathered
//! independently and cannot invalidate the virtualization answer.

mod commands;
mod inventory;
pub mod resources;
mod signatures;

use thiserror::Error;
use tracing::warn;

use vigil_core::types::{DetectionMethod, VmDetection};

pub use signatures::HYPERVISOR_SIGNATURES;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe command failed: {0}")]
    Command(String),
    #[error("probe command timed out")]
    Timeout,
    #[error("no inventory source available on this platform")]
    NoInventory,
    #[error("probe io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the full probe. Never fails; the worst case is an Unknown verdict
/// with the last error recorded.
pub async fn detect_environment() -> VmDetection {
    let mut result = detect_virtualization().await;

    match tokio::task::spawn_blocking(resources::gather_resources).await {
        Ok(Ok(resources)) => result.system_resources = Some(resources),
        Ok(Err(err)) => warn!("system resource probe failed: {err}"),
        Err(err) => warn!("system resource probe panicked: {err}"),
    }

    result
}

async fn detect_virtualization() -> VmDetection {
    let inventory_verdict = tokio::task::spawn_blocking(inventory::detect).await;

    match inventory_verdict {
        Ok(Ok(detection)) if detection.detection_method != DetectionMethod::Unknown => detection,
        Ok(Ok(_inconclusive)) => command_tier().await,
        Ok(Err(err)) => {
            warn!("inventory probe failed, trying platform command: {err}");
            command_tier().await
        }
        Err(err) => {
            warn!("inventory probe panicked, trying platform command: {err}");
            command_tier().await
        }
    }
}

async fn command_tier() -> VmDetection {
    match commands::detect_via_command().await {
        Ok(detection) => detection,
        Err(err) => {
            warn!("all virtualization probes failed: {err}");
            VmDetection::unknown(err.to_string())
        }
    }
}
