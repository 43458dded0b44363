//! Host resource inventory: RAM, total disk across all volumes, logical
//! core count.

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use vigil_core::types::SystemResources;

use crate::ProbeError;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Synchronous; callers run it on the blocking pool.
pub fn gather_resources() -> Result<SystemResources, ProbeError> {
    let system = System::new_with_specifics(
        RefreshKind::new()
            .with_memory(MemoryRefreshKind::everything())
            .with_cpu(CpuRefreshKind::everything()),
    );

    let cpu_cores = system.cpus().len();
    if cpu_cores == 0 {
        return Err(ProbeError::Command(
            "cpu inventory reported zero cores".to_string(),
        ));
    }

    let disks = Disks::new_with_refreshed_list();
    let total_disk_bytes: u64 = disks.iter().map(|disk| disk.total_space()).sum();

    Ok(SystemResources {
        ram_gb: round2(system.total_memory() as f64 / BYTES_PER_GB),
        disk_space_gb: round2(total_disk_bytes as f64 / BYTES_PER_GB),
        cpu_cores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round2(15.9999), 16.0);
        assert_eq!(round2(7.8912), 7.89);
        assert_eq!(round2(0.005), 0.01);
    }

    #[test]
    fn gather_reports_plausible_values_on_this_host() {
        let resources = gather_resources().expect("resource probe should work on the host");
        assert!(resources.cpu_cores >= 1);
        assert!(resources.ram_gb >= 0.0);
        assert!(resources.disk_space_gb >= 0.0);
    }
}
