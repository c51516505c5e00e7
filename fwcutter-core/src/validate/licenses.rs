//! License-file registry
//!
//! Maps a license name to evidence of an actual license text resource.
//! Only the catalog-integrity pass consults it; reserved license names
//! ("Redistributable", "Unknown") never reach the registry.

use std::path::{Path, PathBuf};

pub trait LicenseRegistry {
    /// Whether a license text exists for `name`
    fn contains(&self, name: &str) -> bool;
}

/// Registry backed by license files in the source tree, addressed by
/// their catalog identifier (e.g. "LICENCE.rtlwifi_firmware.txt")
pub struct FsLicenseRegistry {
    root: PathBuf,
}

impl FsLicenseRegistry {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl LicenseRegistry for FsLicenseRegistry {
    fn contains(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }
}
