//! Catalog and source-tree validation
//!
//! Findings accumulate into a [`ValidationReport`]; no pass stops at the
//! first problem, so one run surfaces everything a maintainer has to fix.
//! The check as a whole fails only when at least one error-severity issue
//! exists; warnings never fail the run.
//!
//! Three passes:
//! 1. Catalog integrity - duplicate entry names, cross-entry duplicate
//!    files, link/file collisions, empty entries, unknown license names.
//!    Always runs over the whole catalog regardless of the query.
//! 2. Filesystem check - every file and source reference of the matched
//!    subset must exist under the source root (pre-compressed variants
//!    count as present).
//! 3. Source-tree coverage - with an unconstrained query, every file on
//!    disk must be accounted for by the catalog.

use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::catalog::{Catalog, Query};
use crate::install::{resolve_source, Compression};

mod licenses;

pub use licenses::{FsLicenseRegistry, LicenseRegistry};

/// Repository infrastructure that legitimately lives in a firmware tree
/// without being listed in the catalog. Matched against the end of the
/// relative path, so ".asc" covers detached signatures anywhere.
const KNOWN_PATHS: &[&str] = &[
    ".asc",
    "ChangeLog",
    "Dockerfile",
    "Makefile",
    "NOTICE.txt",
    "README.md",
    "WHENCE.yaml",
    "configure",
    "copy-firmware.sh",
];

/// Severity levels for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Catalog or tree is broken; the check fails
    Error,
    /// Suspicious but tolerated
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: Severity,
    /// Entry the finding belongs to, when attributable
    pub entry: Option<String>,
    /// Offending file or link path, when attributable
    pub path: Option<String>,
    /// Human-readable description
    pub message: String,
}

/// Accumulated findings from all validation passes
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    fn error(&mut self, entry: Option<&str>, path: Option<&str>, message: String) {
        self.push(Severity::Error, entry, path, message);
    }

    fn warning(&mut self, entry: Option<&str>, path: Option<&str>, message: String) {
        self.push(Severity::Warning, entry, path, message);
    }

    fn push(&mut self, severity: Severity, entry: Option<&str>, path: Option<&str>, message: String) {
        self.issues.push(Issue {
            severity,
            entry: entry.map(str::to_string),
            path: path.map(str::to_string),
            message,
        });
    }
}

/// Validate the catalog and the source tree behind it.
///
/// The integrity pass always covers the whole catalog; the filesystem
/// pass only the subset matched by `query`; the coverage pass only runs
/// when `query` is unconstrained.
pub fn check(
    catalog: &Catalog,
    source_root: &Path,
    query: &Query,
    registry: &dyn LicenseRegistry,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_integrity(catalog, registry, &mut report);
    check_files(catalog, source_root, query, &mut report);
    if query.is_unconstrained() {
        check_coverage(catalog, source_root, &mut report);
    }

    report
}

fn check_integrity(catalog: &Catalog, registry: &dyn LicenseRegistry, report: &mut ValidationReport) {
    let index = &catalog.index;

    let mut duplicate_names: Vec<_> = index
        .name_counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .collect();
    duplicate_names.sort();
    for (name, count) in duplicate_names {
        report.error(
            Some(name.as_str()),
            None,
            format!("entry name appears {count} times in the catalog"),
        );
    }

    let mut duplicate_files: Vec<_> = index
        .file_owners
        .iter()
        .filter(|(_, owners)| owners.len() > 1)
        .collect();
    duplicate_files.sort();
    for (path, owners) in duplicate_files {
        report.error(
            None,
            Some(path.as_str()),
            format!("file is listed by multiple entries: {}", owners.join(", ")),
        );
    }

    let mut links: Vec<_> = index.link_owners.iter().collect();
    links.sort();
    for (path, owners) in links {
        if let Some(file_owners) = index.file_owners.get(path) {
            report.error(
                Some(owners[0].as_str()),
                Some(path.as_str()),
                format!(
                    "link collides with a file listed by: {}",
                    file_owners.join(", ")
                ),
            );
        }
        if owners.len() > 1 {
            report.error(
                None,
                Some(path.as_str()),
                format!("link is declared by multiple entries: {}", owners.join(", ")),
            );
        }
    }

    for entry in &catalog.entries {
        if entry.files.is_empty() {
            report.error(Some(entry.name.as_str()), None, "entry has no files".to_string());
        }
        if entry.categories.is_empty() {
            report.warning(Some(entry.name.as_str()), None, "entry has no categories".to_string());
        }
        if entry.license.requires_file() && !registry.contains(&entry.license.name) {
            report.error(
                Some(entry.name.as_str()),
                Some(entry.license.name.as_str()),
                "license file does not exist".to_string(),
            );
        }
    }
}

fn check_files(
    catalog: &Catalog,
    source_root: &Path,
    query: &Query,
    report: &mut ValidationReport,
) {
    for entry in catalog.select(query) {
        for file in &entry.files {
            if resolve_source(source_root, &file.name).is_none() {
                report.error(
                    Some(entry.name.as_str()),
                    Some(file.name.as_str()),
                    "file does not exist in the source tree".to_string(),
                );
            }
            for source in &file.source {
                if !source_root.join(source).exists() {
                    report.error(
                        Some(entry.name.as_str()),
                        Some(source.as_str()),
                        "source reference does not exist in the source tree".to_string(),
                    );
                }
            }
        }
    }
}

/// Every regular file under the source root must be accounted for by the
/// catalog: as a file (possibly pre-compressed on disk), a license file,
/// part of a source reference, or known repository infrastructure.
fn check_coverage(catalog: &Catalog, source_root: &Path, report: &mut ValidationReport) {
    let mut expected: HashSet<String> = HashSet::new();

    for entry in &catalog.entries {
        if entry.license.requires_file() {
            expected.insert(entry.license.name.clone());
        }
        for file in &entry.files {
            expected.insert(file.name.clone());
            for source in &file.source {
                let full = source_root.join(source);
                if full.is_dir() {
                    expected.extend(list_dir(&full, source_root));
                } else {
                    expected.insert(source.clone());
                }
            }
        }
    }

    debug!("Coverage scan over {}", source_root.display());
    for path in list_dir(source_root, source_root) {
        if KNOWN_PATHS.iter().any(|known| path.ends_with(known)) {
            continue;
        }
        // Accept a compressed on-disk variant of a listed file
        let stripped = match Compression::from_path(&path).extension() {
            Some(ext) => path
                .strip_suffix(&format!(".{ext}"))
                .unwrap_or(&path)
                .to_string(),
            None => path.clone(),
        };
        if !expected.contains(&path) && !expected.contains(&stripped) {
            report.error(
                None,
                Some(path.as_str()),
                "file is not listed in the catalog".to_string(),
            );
        }
    }
}

/// Relative paths of all regular files under `directory`, skipping dot
/// files and dot directories, sorted for deterministic reports
fn list_dir(directory: &Path, relative_to: &Path) -> Vec<String> {
    let mut paths: Vec<String> = WalkDir::new(directory)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(relative_to)
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect();
    paths.sort();
    paths
}
