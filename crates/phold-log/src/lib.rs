//! Append-only record log.
//!
//! A [`RecordLog`] owns one text file holding one record per line. Records
//! are either adds (`key -> value`) or removes (`key`); their payload format
//! is supplied by a [`RecordCodec`]. The log never folds records itself:
//! [`RecordLog::load`] replays them in file order and the caller decides what
//! a later record means for an earlier one.
//!
//! Every mutation runs under a single lock together with a caller-supplied
//! side effect on the caller's state `S`, so "bytes written" and "bookkeeping
//! updated" are observed as one step. Compaction goes through
//! [`RecordLog::replace_all`], which swaps in a fully written temp file.

pub mod codec;
pub mod config;
pub mod error;
pub mod log;

pub use codec::{LogRecord, RecordCodec};
pub use config::{LogConfig, SyncMode, TailPolicy};
pub use error::{LogError, Result};
pub use log::{LoadSummary, RecordLog, RecordSink, ReplaceSummary};
