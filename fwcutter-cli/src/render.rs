//! Human-readable rendering for check and info output

use anyhow::Result;
use std::path::Path;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use fwcutter_core::catalog::Entry;
use fwcutter_core::install::resolve_source;
use fwcutter_core::validate::{Severity, ValidationReport};

/// Print every finding, then a one-line summary.
///
/// Findings go to stderr; the exit-code decision stays with the caller.
pub fn print_report(report: &ValidationReport) {
    for issue in &report.issues {
        let severity = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match (&issue.entry, &issue.path) {
            (Some(entry), Some(path)) => {
                eprintln!("{severity}: [{entry}] {path}: {}", issue.message)
            }
            (Some(entry), None) => eprintln!("{severity}: [{entry}] {}", issue.message),
            (None, Some(path)) => eprintln!("{severity}: {path}: {}", issue.message),
            (None, None) => eprintln!("{severity}: {}", issue.message),
        }
    }
    eprintln!(
        "{} errors, {} warnings",
        report.error_count(),
        report.warning_count()
    );
}

/// Print one entry in the long info format
pub fn print_entry(entry: &Entry, source: &Path) {
    println!("Entry: {}", entry.name);
    if let Some(description) = &entry.description {
        println!("Description: {description}");
    }
    if !entry.categories.is_empty() {
        println!("Categories:");
        for category in &entry.categories {
            println!("  - {category}");
        }
    }
    if let Some(vendor) = &entry.vendor {
        println!("Vendor: {vendor}");
    }
    println!("License:");
    println!("  Name: {}", entry.license.name);
    if let Some(copyright) = &entry.license.copyright {
        println!("  Copyright: {copyright}");
    }
    if let Some(info) = &entry.license.info {
        println!("  Info: {info}");
    }
    if let Some(info) = &entry.info {
        println!("Info:\n{info}");
    }
    println!("Size: {} bytes", entry_size(entry, source));
    println!("Files:");
    for file in &entry.files {
        println!("  - Name: {}", file.name);
        if let Some(version) = &file.version {
            println!("    Version: {version}");
        }
        if !file.links.is_empty() {
            println!("    Links:");
            for link in &file.links {
                println!("      - {link}");
            }
        }
    }
    println!("--------");
}

/// Best-effort on-disk size of an entry's files; missing files count zero
fn entry_size(entry: &Entry, source: &Path) -> u64 {
    entry
        .files
        .iter()
        .filter_map(|file| resolve_source(source, &file.name))
        .filter_map(|(path, _)| std::fs::metadata(path).ok())
        .map(|metadata| metadata.len())
        .sum()
}

pub fn print_json(entries: &[&Entry]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

/// Table row for the compact info format
#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "License")]
    license: String,
    #[tabled(rename = "Files")]
    files: usize,
}

pub fn print_table(entries: &[&Entry]) {
    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|entry| EntryRow {
            name: entry.name.clone(),
            vendor: entry.vendor.clone().unwrap_or_default(),
            license: entry.license.name.clone(),
            files: entry.files.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
}
