use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No header row found in the source file")]
    NoHeader,

    #[error("No vendor column (Proveedor/Nombre/Concepto) found in the header: {0}")]
    MissingVendorColumn(String),

    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Invalid RFC: {0}")]
    InvalidIdentifier(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DiotError>;
