//! Structured inventory tier: DMI/SMBIOS strings and cpu flags.

use vigil_core::types::{DetectionMethod, VmDetection};

use crate::signatures::scan_inventory_strings;
use crate::ProbeError;

/// DMI identity files exposed by the kernel on Linux. Values on a VM carry
/// the hypervisor's vendor strings.
const DMI_FIELDS: &[&str] = &[
    "sys_vendor",
    "product_name",
    "product_version",
    "board_vendor",
    "board_name",
    "bios_vendor",
    "bios_version",
    "chassis_vendor",
];

/// Gather inventory strings synchronously (runs on the blocking pool).
fn gather_strings() -> Vec<String> {
    let mut strings = Vec::new();

    for field in DMI_FIELDS {
        let path = format!("/sys/class/dmi/id/{field}");
        if let Ok(value) = std::fs::read_to_string(path) {
            let value = value.trim();
            if !value.is_empty() {
                strings.push(value.to_string());
            }
        }
    }

    strings
}

/// The cpuinfo `hypervisor` flag is set by every hypervisor that exposes
/// CPUID leaves, even when vendor strings are scrubbed.
fn cpu_reports_hypervisor() -> bool {
    let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") else {
        return false;
    };
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("flags"))
        .any(|line| line.split_whitespace().any(|flag| flag == "hypervisor"))
}

/// Tier 1 + 2: read what the firmware reports, then pattern-match it.
/// Returns an Unknown-method result when nothing matched (the caller falls
/// through to the command tier), or an error when there was nothing to
/// scan at all.
pub fn detect() -> Result<VmDetection, ProbeError> {
    let strings = gather_strings();
    let has_cpu_flag = cpu_reports_hypervisor();

    if strings.is_empty() && !has_cpu_flag {
        return Err(ProbeError::NoInventory);
    }

    if let Some(label) = scan_inventory_strings(&strings) {
        return Ok(VmDetection {
            is_virtual: true,
            virtual_host: Some(label.to_string()),
            detection_method: DetectionMethod::Inventory,
            error: None,
            system_resources: None,
        });
    }

    if has_cpu_flag {
        // Definitely virtualized, hypervisor unnamed.
        return Ok(VmDetection {
            is_virtual: true,
            virtual_host: None,
            detection_method: DetectionMethod::Inventory,
            error: None,
            system_resources: None,
        });
    }

    Ok(VmDetection {
        is_virtual: false,
        virtual_host: None,
        detection_method: DetectionMethod::Unknown,
        error: None,
        system_resources: None,
    })
}
