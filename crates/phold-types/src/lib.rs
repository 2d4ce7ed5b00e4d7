//! Foundation types for the placeholder ledger.
//!
//! A placeholder is a virtual-filesystem entry whose content has not been
//! materialized yet. The ledger records each placeholder's path together with
//! the content hash it stands in for.
//!
//! # Key Types
//!
//! - [`ContentHash`] — Fixed-length SHA-1 digest; [`ContentHash::ZERO`] marks folders
//! - [`PlaceholderRecord`] — A reconciled `path -> hash` entry

pub mod error;
pub mod hash;
pub mod record;

pub use error::TypeError;
pub use hash::{ContentHash, HASH_HEX_LEN};
pub use record::PlaceholderRecord;
