// Error types for loading and exporting.
//
// Loading and exporting fail in different ways and callers report them
// differently, so each gets its own enum. Filtering and aggregation never
// fail and have no error type at all.
use std::path::PathBuf;

/// Errors raised while reading and normalizing the sales file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Failed to open or read the source file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected the input (bad quoting, unequal row lengths...).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The configured encoding label is not known to `encoding_rs`.
    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// A required header is absent. Column names are case-sensitive.
    #[error("Missing required column \"{0}\"")]
    MissingColumn(String),

    /// A row carries a Date value none of the accepted formats can parse.
    #[error("Line {line}: cannot parse Date {value:?}")]
    InvalidDate { line: u64, value: String },

    /// A non-date field (Time or a numeric column) could not be parsed.
    #[error("Line {line}: cannot parse {column} {value:?}")]
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// Errors raised while writing or re-reading exported aggregates.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An exported file does not have the `key,value` shape.
    #[error("Malformed export: {0}")]
    MalformedExport(String),
}
