use serde::{Deserialize, Serialize};

/// Flush/sync strategy for appended records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append.
    #[default]
    EveryWrite,
    /// Flush to the OS and rely on page-cache writeback.
    OsDefault,
}

/// What to do with an incomplete trailing line found at open.
///
/// A line without its terminator can only come from an append that was cut
/// short by a crash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Drop the partial line by truncating the file to the last complete line.
    #[default]
    Truncate,
    /// Refuse to open the log.
    Reject,
}

/// Configuration for a [`RecordLog`](crate::RecordLog).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub sync_mode: SyncMode,
    pub tail_policy: TailPolicy,
}
