//! Placeholder ledger for a git-aware virtual file system.
//!
//! Tracks which paths have been materialized as placeholders and which git
//! object each one stands in for. Mutations are appended to a
//! [`phold_log::RecordLog`]; a reconciliation pass takes a snapshot with
//! [`PlaceholderLedger::list_all`] and persists its outcome with
//! [`PlaceholderLedger::commit_reconciled`], which compacts the log without
//! losing mutations made while the snapshot was out.
//!
//! # Key Types
//!
//! - [`PlaceholderLedger`] -- The add/remove/list/commit surface
//! - [`PlaceholderCodec`] -- On-disk payload format for placeholder records
//! - [`LedgerConfig`] -- Log durability settings and path comparison

pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;

pub use codec::PlaceholderCodec;
pub use config::{LedgerConfig, PathCase};
pub use error::{LedgerError, LedgerResult};
pub use ledger::PlaceholderLedger;
pub use phold_types::{ContentHash, PlaceholderRecord};
