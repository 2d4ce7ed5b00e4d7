//! On-disk payloads for placeholder records.
//!
//! An add payload is `<path>\0<40 hex chars>`. Paths never contain NUL and
//! the hash has a fixed width, so the separator is unambiguous no matter
//! what else the path holds. A remove payload is the bare path.

use phold_log::RecordCodec;
use phold_types::{ContentHash, HASH_HEX_LEN};

/// [`RecordCodec`] for `path -> ContentHash` records.
pub struct PlaceholderCodec;

impl RecordCodec for PlaceholderCodec {
    type Key = String;
    type Value = ContentHash;

    fn encode_add(path: &String, hash: &ContentHash) -> String {
        let mut payload = String::with_capacity(path.len() + 1 + HASH_HEX_LEN);
        payload.push_str(path);
        payload.push('\0');
        payload.push_str(&hash.to_hex());
        payload
    }

    fn encode_remove(path: &String) -> String {
        path.clone()
    }

    fn decode_add(payload: &str) -> Result<(String, ContentHash), String> {
        let (path, hash) = payload
            .split_once('\0')
            .ok_or("missing NUL separator")?;
        if hash.contains('\0') {
            return Err("more than one NUL separator".to_string());
        }
        if path.is_empty() {
            return Err("empty path".to_string());
        }
        let hash = ContentHash::from_hex(hash).map_err(|e| e.to_string())?;
        Ok((path.to_string(), hash))
    }

    fn decode_remove(payload: &str) -> Result<String, String> {
        if payload.is_empty() {
            return Err("empty path".to_string());
        }
        if payload.contains('\0') {
            return Err("NUL in removed path".to_string());
        }
        Ok(payload.to_string())
    }
}
