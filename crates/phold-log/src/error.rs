use std::io;
use std::path::PathBuf;

/// Errors produced by the record log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The backing file could not be opened, created, or inspected.
    #[error("cannot open record log {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while appending, replaying, or replacing the log.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A line matched neither record shape. Fatal to the load.
    #[error("malformed record on line {line}: {reason} ({content:?})")]
    Malformed {
        line: u64,
        content: String,
        reason: String,
    },

    /// The file ends in an incomplete record and the tail policy rejects it.
    #[error("incomplete trailing record at offset {offset} ({bytes} bytes)")]
    TruncatedTail { offset: u64, bytes: u64 },

    /// A record could not be framed as a single line.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A thread panicked while holding the log lock.
    #[error("record log lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the log crate.
pub type Result<T> = std::result::Result<T, LogError>;
