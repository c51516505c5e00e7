//! fwcutter - query info and install firmware files from a WHENCE catalog

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fwcutter_core::catalog::{Catalog, ListField, Query};
use fwcutter_core::install::{Compression, Installer};
use fwcutter_core::validate::{self, FsLicenseRegistry};

mod render;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "fwcutter",
    about = "Query info and install firmware files from a WHENCE catalog",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Path to the WHENCE.yaml catalog
    #[clap(short, long, default_value = "WHENCE.yaml", global = true)]
    whence: PathBuf,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check catalog integrity and compare it against the source tree
    Check {
        /// Source directory of the firmware tree
        #[clap(short, long, default_value = ".")]
        source: PathBuf,

        #[clap(flatten)]
        filters: FilterArgs,
    },

    /// Show entries matching the filtered query
    Info {
        /// Source directory of the firmware tree (used for size reporting)
        #[clap(short, long, default_value = ".")]
        source: PathBuf,

        /// Print entry names only
        #[clap(short, long)]
        terse: bool,

        /// Output matched entries as JSON
        #[clap(long, conflicts_with = "table")]
        json: bool,

        /// Display matched entries in a compact table format
        #[clap(long)]
        table: bool,

        #[clap(flatten)]
        filters: FilterArgs,
    },

    /// Install firmware files matching the filtered query
    Install {
        /// Source directory of the firmware tree
        #[clap(short, long, default_value = ".")]
        source: PathBuf,

        /// Destination directory
        #[clap(short, long, default_value = "/lib/firmware")]
        destination: PathBuf,

        /// Compression codec (none, gzip, xz, zstd)
        #[clap(short = 'C', long, default_value = "none")]
        compress: String,

        #[clap(flatten)]
        filters: FilterArgs,
    },

    /// List unique values of one catalog field
    List {
        /// Field to project
        #[clap(value_enum, default_value = "names")]
        field: Field,

        #[clap(flatten)]
        filters: FilterArgs,
    },
}

/// Filter options shared by every command (comma-separated value lists)
#[derive(Args, Debug)]
struct FilterArgs {
    /// Entry names to match
    #[clap(short, long, value_delimiter = ',')]
    names: Vec<String>,

    /// Vendor names to match
    #[clap(short, long, value_delimiter = ',')]
    vendors: Vec<String>,

    /// Categories to match
    #[clap(short, long, value_delimiter = ',')]
    categories: Vec<String>,

    /// License names to match
    #[clap(short, long, value_delimiter = ',')]
    licenses: Vec<String>,

    /// File names to match
    #[clap(short, long, value_delimiter = ',')]
    files: Vec<String>,
}

impl From<FilterArgs> for Query {
    fn from(args: FilterArgs) -> Self {
        Query {
            names: args.names,
            vendors: args.vendors,
            categories: args.categories,
            licenses: args.licenses,
            files: args.files,
        }
    }
}

/// Catalog field projected by the list command
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Field {
    Names,
    Vendors,
    Categories,
    Licenses,
    Files,
}

impl From<Field> for ListField {
    fn from(field: Field) -> Self {
        match field {
            Field::Names => ListField::Names,
            Field::Vendors => ListField::Vendors,
            Field::Categories => ListField::Categories,
            Field::Licenses => ListField::Licenses,
            Field::Files => ListField::Files,
        }
    }
}

/// Initialize tracing from the --log-level flag.
///
/// Logs go to stderr so stdout stays machine-consumable.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    let catalog = Catalog::from_file(&cli.whence)
        .with_context(|| format!("Failed to load catalog: {}", cli.whence.display()))?;
    tracing::debug!(
        "Loaded {} entries from {}",
        catalog.entries.len(),
        cli.whence.display()
    );

    match cli.command {
        Command::Check { source, filters } => {
            let query = Query::from(filters);
            let registry = FsLicenseRegistry::new(&source);
            let report = validate::check(&catalog, &source, &query, &registry);
            render::print_report(&report);
            if report.has_errors() {
                std::process::exit(1);
            }
        }

        Command::Info {
            source,
            terse,
            json,
            table,
            filters,
        } => {
            let entries = catalog.select(&Query::from(filters));
            if json {
                render::print_json(&entries)?;
            } else if table {
                render::print_table(&entries);
            } else if terse {
                for entry in &entries {
                    println!("{}", entry.name);
                }
            } else {
                println!("format_version: {}", catalog.metadata.format_version);
                println!("firmware_version: {}", catalog.metadata.firmware_version);
                println!();
                for entry in &entries {
                    render::print_entry(entry, &source);
                }
            }
        }

        Command::Install {
            source,
            destination,
            compress,
            filters,
        } => {
            let codec = Compression::from_name(&compress)?;
            let installer = Installer::new(&source, &destination, codec);
            let report = installer.install(&catalog, &Query::from(filters))?;
            println!(
                "Installed {} files ({} bytes, {} links) from {} entries",
                report.files_copied,
                report.bytes_written,
                report.links_created,
                report.entries_processed
            );
        }

        Command::List { field, filters } => {
            for value in catalog.list(&Query::from(filters), field.into()) {
                println!("{value}");
            }
        }
    }

    Ok(())
}
