// errors.rs
use thiserror::Error;

/// Errors raised by the durable store (SQLite) and the queries on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("interest with hash {0} already exists")]
    DuplicateHash(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

/// A single row that cannot be turned into an interest record.
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("row has no recognised fields")]
    EmptyRow,

    #[error("value {0:?} is nested, not a cell")]
    InvalidValue(String),

    #[error("mnis_id {0:?} is nested, not a cell")]
    InvalidId(String),
}

/// Errors raised while writing report files.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Configuration problems detected before any I/O happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("category {0} is not configured")]
    UnknownCategory(String),

    #[error("unknown category label {0:?}")]
    UnknownLabel(String),
}

/// Errors that end a whole sync run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to set up directories: {0}")]
    Setup(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
