//! Last-resort tier: one platform utility per host OS, with a bounded
//! wait so a wedged utility cannot hang the session-start path.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use vigil_core::types::{DetectionMethod, VmDetection};

use crate::ProbeError;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn detect_via_command() -> Result<VmDetection, ProbeError> {
    let attempt = async {
        match std::env::consts::OS {
            "linux" => detect_linux().await,
            "macos" => detect_macos().await,
            "windows" => detect_windows().await,
            other => Err(ProbeError::Command(format!(
                "unsupported platform: {other}"
            ))),
        }
    };
    timeout(COMMAND_TIMEOUT, attempt)
        .await
        .map_err(|_| ProbeError::Timeout)?
}

async fn run(program: &str, args: &[&str]) -> Result<String, ProbeError> {
    let output = Command::new(program).args(args).output().await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn detect_linux() -> Result<VmDetection, ProbeError> {
    // Exits non-zero when not virtualized, but still prints "none";
    // the stdout is the answer either way.
    let stdout = run("systemd-detect-virt", &[]).await?;
    parse_detect_virt(&stdout).ok_or_else(|| {
        ProbeError::Command("systemd-detect-virt produced no output".to_string())
    })
}

async fn detect_macos() -> Result<VmDetection, ProbeError> {
    let stdout = run("system_profiler", &["SPHardwareDataType"]).await?;
    Ok(model_verdict(
        hardware_model_mentions_virtual(&stdout, "Model Name"),
        "macOS Virtual Machine",
    ))
}

async fn detect_windows() -> Result<VmDetection, ProbeError> {
    let stdout = run("systeminfo", &[]).await?;
    Ok(model_verdict(
        hardware_model_mentions_virtual(&stdout, "System Model"),
        "Windows Virtual Machine",
    ))
}

fn model_verdict(is_virtual: bool, label: &str) -> VmDetection {
    VmDetection {
        is_virtual,
        virtual_host: is_virtual.then(|| label.to_string()),
        detection_method: DetectionMethod::SystemCommand,
        error: None,
        system_resources: None,
    }
}

/// Parse `systemd-detect-virt` output: "none" means bare metal, anything
/// else names the hypervisor.
fn parse_detect_virt(stdout: &str) -> Option<VmDetection> {
    let virt = stdout.trim();
    if virt.is_empty() {
        return None;
    }
    let is_virtual = virt != "none";
    Some(VmDetection {
        is_virtual,
        virtual_host: is_virtual.then(|| virt.to_string()),
        detection_method: DetectionMethod::SystemCommand,
        error: None,
        system_resources: None,
    })
}

/// Whether the hardware-model line of a profiler dump mentions "virtual".
fn hardware_model_mentions_virtual(stdout: &str, field: &str) -> bool {
    stdout
        .lines()
        .filter(|line| line.contains(field))
        .any(|line| line.to_lowercase().contains("virtual"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_virt_none_is_bare_metal() {
        let verdict = parse_detect_virt("none\n").unwrap();
        assert!(!verdict.is_virtual);
        assert_eq!(verdict.virtual_host, None);
        assert_eq!(verdict.detection_method, DetectionMethod::SystemCommand);
    }

    #[test]
    fn detect_virt_names_the_hypervisor() {
        let verdict = parse_detect_virt("kvm\n").unwrap();
        assert!(verdict.is_virtual);
        assert_eq!(verdict.virtual_host.as_deref(), Some("kvm"));
    }

    #[test]
    fn detect_virt_empty_output_is_inconclusive() {
        assert!(parse_detect_virt("   \n").is_none());
    }

    #[test]
    fn model_line_scan_only_looks_at_the_named_field() {
        let dump = "\
Host Name: DESKTOP-123
System Model: Virtual Machine
System Type: x64-based PC";
        assert!(hardware_model_mentions_virtual(dump, "System Model"));

        let physical = "\
Hardware Overview:
  Model Name: MacBook Pro
  Chip: Apple M3";
        assert!(!hardware_model_mentions_virtual(physical, "Model Name"));

        // "virtual" elsewhere in the dump must not trip the verdict.
        let tricky = "\
System Model: Precision 5570
Hyper-V Requirements: Virtualization Enabled In Firmware: Yes";
        assert!(!hardware_model_mentions_virtual(tricky, "System Model"));
    }
}
