/// Error types for the IWFM model crates
use thiserror::Error;

/// Main error type for reading IWFM and CASGEM inputs
#[derive(Error, Debug)]
pub enum IwfmError {
    /// Reading an input file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to parse a JSON configuration file
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// A required column is absent from a tabular input
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A header flag could not be located in a hydrograph file
    #[error("Section flag {0:?} not found in hydrograph file")]
    MissingSection(String),

    /// Layer boundaries are not strictly decreasing
    #[error("Invalid stratigraphy: {0}")]
    InvalidStratigraphy(String),

    /// No stratigraphy is known for a location
    #[error("No stratigraphy available at ({x}, {y})")]
    StratigraphyNotFound { x: f64, y: f64 },
}

/// Type alias for Results using IwfmError
pub type Result<T> = std::result::Result<T, IwfmError>;
