pub mod catalog;
pub mod init;
pub mod process;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::policy::{DebitMode, Period};
use crate::settings::{load_settings, shellexpand_path};

#[derive(Parser)]
#[command(
    name = "diot",
    version,
    about = "Build the monthly DIOT third-party operations extract from accounting exports."
)]
pub struct Cli {
    /// Log the detected delimiter, column mapping and run counts.
    #[arg(long, global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose where the vendor catalog and exports live.
    Init {
        /// Vendor catalog file (default: ~/Documents/diot/catalogo.json)
        #[arg(long)]
        catalog: Option<String>,
        /// Directory for --export output (default: ~/Documents/diot/exports)
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
    },
    /// Aggregate a CSV/XLSX export into DIOT records for one period.
    Process(ProcessArgs),
    /// Inspect and edit the vendor catalog.
    Catalog {
        /// Catalog file to use instead of the configured one
        #[arg(long, global = true)]
        catalog: Option<String>,
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Show the configured paths and catalog size.
    Status,
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Accounting export (CSV, TXT or XLSX)
    pub file: PathBuf,
    /// Reporting period: YYYY-MM
    #[arg(long)]
    pub period: Period,
    /// How a bare debit is read: `total` (VAT included) or `vat` (VAT only)
    #[arg(long = "debit-mode", value_name = "total|vat")]
    pub debit_mode: DebitMode,
    /// Catalog file to use instead of the configured one
    #[arg(long)]
    pub catalog: Option<String>,
    /// Write the DIOT records to this CSV file
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Write the pending vendors to this CSV file
    #[arg(long = "pending-output")]
    pub pending_output: Option<PathBuf>,
    /// Write both files to the export directory as DIOT_<period>.csv and pendientes.csv
    #[arg(long)]
    pub export: bool,
    /// Hide a pending vendor (by detected name or key) for this run
    #[arg(long, value_name = "NAME")]
    pub dismiss: Vec<String>,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List catalog entries.
    List,
    /// Add an RFC or enrich an existing entry, then save the catalog.
    Add {
        /// Vendor RFC
        rfc: String,
        /// Legal name (only fills a blank name on existing entries)
        #[arg(long)]
        name: Option<String>,
        /// Name variant as it appears in the accounting export
        #[arg(long)]
        alias: Option<String>,
        /// Third-party type code (04 national, 05 foreign, 15 global)
        #[arg(long = "third-party")]
        third_party: Option<String>,
        /// Operation type code (85 other, 03 services, 06 leasing)
        #[arg(long)]
        operation: Option<String>,
    },
    /// Look up a vendor by RFC, then by name alias.
    Find {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        rfc: Option<String>,
    },
}

/// The catalog named on the command line, else the configured one.
pub(crate) fn resolve_catalog_path(catalog: Option<&str>) -> PathBuf {
    match catalog {
        Some(path) => PathBuf::from(shellexpand_path(path)),
        None => load_settings().catalog_path(),
    }
}
