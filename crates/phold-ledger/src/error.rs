//! Error types for the ledger crate.

use phold_log::LogError;

/// Errors that can occur during placeholder ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Opening, replaying, appending to, or compacting the backing log failed.
    #[error(transparent)]
    Log(#[from] LogError),

    /// A path cannot be stored as a single record.
    #[error("invalid placeholder path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// `list_all` was called while an earlier snapshot is still uncommitted.
    #[error("a placeholder snapshot is already outstanding; commit it before listing again")]
    SnapshotAlreadyOutstanding,

    /// `commit_reconciled` was called without a preceding `list_all`.
    #[error("no placeholder snapshot is outstanding")]
    NoSnapshotOutstanding,

    /// The ledger configuration could not be read or parsed.
    #[error("invalid ledger config: {0}")]
    Config(String),
}

impl LedgerError {
    /// Returns `true` for misuse of the list/commit protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::SnapshotAlreadyOutstanding | LedgerError::NoSnapshotOutstanding
        )
    }
}

/// Convenience alias for ledger results.
pub type LedgerResult<T> = Result<T, LedgerError>;
