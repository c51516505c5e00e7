//! WHENCE.yaml data model
//!
//! Field names follow the on-disk WHENCE schema. All types are owned by
//! the [`Catalog`] and treated as immutable once loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// License names that mark "no license file" rather than a file identifier
pub const RESERVED_LICENSES: &[&str] = &["Redistributable", "Unknown"];

/// Catalog-wide metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// WHENCE format version (gated against the supported version at load)
    pub format_version: String,

    /// Version of the firmware collection this catalog describes
    pub firmware_version: String,
}

/// License attached to an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    /// Reserved marker ("Redistributable", "Unknown") or a license-file
    /// identifier relative to the source root
    pub name: String,

    /// Copyright statement
    #[serde(default)]
    pub copyright: Option<String>,

    /// Free text (SPDX identifier, distribution rationale)
    #[serde(default)]
    pub info: Option<String>,
}

impl License {
    /// Whether `name` refers to a license file in the source tree
    pub fn requires_file(&self) -> bool {
        !RESERVED_LICENSES.contains(&self.name.as_str())
    }
}

/// A single firmware file within an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    /// Relative path under the source root; unique within the entry
    pub name: String,

    /// Firmware version string, informational only
    #[serde(default)]
    pub version: Option<String>,

    /// Free text
    #[serde(default)]
    pub info: Option<String>,

    /// Bundled driver source references; documentation only, never installed
    #[serde(default)]
    pub source: Vec<String>,

    /// Relative paths installed as symlinks to this file
    #[serde(default)]
    pub links: Vec<String>,

    /// Whether the installer may compress this file
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn default_compress() -> bool {
    true
}

/// A named group of firmware files sharing a vendor and license
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Unique entry name across the whole catalog
    pub name: String,

    /// Description of the device family
    #[serde(default)]
    pub description: Option<String>,

    /// Driver subsystem paths (e.g. "drivers/net/wireless/realtek")
    #[serde(rename = "category", default)]
    pub categories: Vec<String>,

    /// Vendor name
    #[serde(default)]
    pub vendor: Option<String>,

    /// License covering every file of the entry
    pub license: License,

    /// Provenance note
    #[serde(default)]
    pub info: Option<String>,

    /// Files belonging to the entry; must be non-empty in a valid catalog
    pub files: Vec<File>,
}

/// The full WHENCE catalog: metadata plus ordered entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: Metadata,
    pub entries: Vec<Entry>,

    /// Lookup tables built once at load time
    #[serde(skip)]
    pub(crate) index: CatalogIndex,
}

/// Indexed lookups over the catalog (path → owning entry names).
///
/// Built once after parsing so the validator never rescans the entry list.
/// Duplicates are recorded rather than rejected; flagging them is the
/// validator's job.
#[derive(Debug, Clone, Default)]
pub(crate) struct CatalogIndex {
    /// File path → names of entries declaring it
    pub(crate) file_owners: HashMap<String, Vec<String>>,

    /// Link path → names of entries declaring it
    pub(crate) link_owners: HashMap<String, Vec<String>>,

    /// Entry name → number of occurrences
    pub(crate) name_counts: HashMap<String, usize>,
}

impl Catalog {
    pub(crate) fn build_index(&mut self) {
        let mut index = CatalogIndex::default();
        for entry in &self.entries {
            *index.name_counts.entry(entry.name.clone()).or_insert(0) += 1;
            for file in &entry.files {
                index
                    .file_owners
                    .entry(file.name.clone())
                    .or_default()
                    .push(entry.name.clone());
                for link in &file.links {
                    index
                        .link_owners
                        .entry(link.clone())
                        .or_default()
                        .push(entry.name.clone());
                }
            }
        }
        self.index = index;
    }
}
