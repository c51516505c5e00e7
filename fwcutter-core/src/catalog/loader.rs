//! Catalog loading and parse-time validation
//!
//! Only structural rules are enforced here: the format version gate and
//! File.name uniqueness within a single entry. Catalog-wide checks
//! (duplicate entries, cross-entry file collisions) belong to
//! [`crate::validate`].

use anyhow::Context;
use std::collections::HashSet;
use std::path::Path;

use super::model::Catalog;
use crate::error::{FwcutterError, Result};

/// WHENCE format version this build understands
pub const SUPPORTED_FORMAT_VERSION: &str = "3";

impl Catalog {
    /// Load a catalog from a WHENCE.yaml file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read WHENCE file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a catalog from YAML and run parse-time checks
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut catalog: Catalog = serde_yaml_ng::from_str(content)?;

        if catalog.metadata.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(FwcutterError::FormatVersion {
                expected: SUPPORTED_FORMAT_VERSION.to_string(),
                found: catalog.metadata.format_version.clone(),
            });
        }

        for entry in &catalog.entries {
            let mut seen = HashSet::new();
            for file in &entry.files {
                if !seen.insert(file.name.as_str()) {
                    return Err(FwcutterError::DuplicateFile {
                        entry: entry.name.clone(),
                        name: file.name.clone(),
                    });
                }
            }
        }

        catalog.build_index();
        Ok(catalog)
    }
}
