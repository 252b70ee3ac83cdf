use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MipError {
    #[error("malformed alignment block in {path} at line {line}: {reason}")]
    MalformedBlock {
        path: Utf8PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid chain descriptor: {0}")]
    InvalidChainDescriptor(String),

    #[error("shard file not found: {0}")]
    ShardNotFound(Utf8PathBuf),

    #[error("failed to decode shard {path}: {message}")]
    ShardDecode { path: Utf8PathBuf, message: String },

    #[error("refusing to write empty table to {0}")]
    EmptyTable(Utf8PathBuf),

    #[error("threshold {0} outside valid range 0.0..=1.0")]
    InvalidThreshold(f64),

    #[error("worker count must be positive, got {0}")]
    InvalidWorkerCount(usize),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to write CSV: {0}")]
    CsvWrite(String),
}
