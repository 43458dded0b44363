//! Known hypervisor markers found in vendor/model/firmware strings.

/// (lowercase marker, canonical hypervisor label).
///
/// Order matters: more specific markers come before generic ones so a
/// "VirtualBox" board does not report as a generic "Virtual Machine".
pub const HYPERVISOR_SIGNATURES: &[(&str, &str)] = &[
    ("virtualbox", "VirtualBox"),
    ("vbox", "VirtualBox"),
    ("vmware", "VMware"),
    ("hyper-v", "Hyper-V"),
    ("hyperv", "Hyper-V"),
    ("microsoft hv", "Hyper-V"),
    ("qemu", "QEMU"),
    ("kvm", "KVM"),
    ("xen", "Xen"),
    ("parallels", "Parallels"),
    ("bhyve", "bhyve"),
    ("virtual machine", "Virtual Machine"),
];

/// Scan a set of inventory strings for any known hypervisor marker.
pub fn scan_inventory_strings<S: AsRef<str>>(strings: &[S]) -> Option<&'static str> {
    for raw in strings {
        let lower = raw.as_ref().to_lowercase();
        for (marker, label) in HYPERVISOR_SIGNATURES {
            if lower.contains(marker) {
                return Some(label);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_vendor_strings() {
        assert_eq!(
            scan_inventory_strings(&["innotek GmbH", "VirtualBox"]),
            Some("VirtualBox")
        );
        assert_eq!(
            scan_inventory_strings(&["VMware, Inc.", "VMware7,1"]),
            Some("VMware")
        );
        assert_eq!(scan_inventory_strings(&["QEMU Standard PC (i440FX)"]), Some("QEMU"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(scan_inventory_strings(&["PARALLELS Software"]), Some("Parallels"));
    }

    #[test]
    fn specific_markers_win_over_generic_ones() {
        // A VirtualBox string containing "virtual" must not degrade to the
        // generic label.
        assert_eq!(
            scan_inventory_strings(&["Oracle VirtualBox Virtual Machine"]),
            Some("VirtualBox")
        );
    }

    #[test]
    fn physical_vendor_strings_do_not_match() {
        assert_eq!(
            scan_inventory_strings(&["Dell Inc.", "XPS 13 9310", "American Megatrends"]),
            None
        );
        assert_eq!(scan_inventory_strings::<&str>(&[]), None);
    }
}
