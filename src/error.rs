use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovsetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: no coverage line records found")]
    NoLineRecords { path: String },

    #[error("{path}: input looks like binary data, not gcov text")]
    BinaryInput { path: String },

    #[error("{path}: line count mismatch (have {existing} lines, new data has {incoming})")]
    LineCountMismatch {
        path: String,
        existing: usize,
        incoming: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage format")]
    UnknownFormat,
}

pub type Result<T> = std::result::Result<T, CovsetError>;
