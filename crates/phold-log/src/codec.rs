//! Record shapes and single-line framing.
//!
//! On disk every record is one `\n`-terminated line with a leading tag:
//!
//! ```text
//! A <add payload>
//! D <remove payload>
//! ```
//!
//! The tag decides which decoder gets the payload, so a key never has to be
//! guessed from the payload's shape.

/// Tag prefix for add records.
const ADD_TAG: &str = "A ";
/// Tag prefix for remove records.
const REMOVE_TAG: &str = "D ";

/// One physical record in the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogRecord<K, V> {
    /// `key` now maps to `value`.
    Add(K, V),
    /// `key` is no longer present.
    Remove(K),
}

impl<K, V> LogRecord<K, V> {
    /// The key this record is about.
    pub fn key(&self) -> &K {
        match self {
            LogRecord::Add(key, _) | LogRecord::Remove(key) => key,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, LogRecord::Add(..))
    }
}

/// Payload encoding for the two record kinds.
///
/// Encoded payloads must not contain `\n`; the log rejects them before
/// touching the file. Decoders return a human-readable reason on failure,
/// which ends up in [`LogError::Malformed`](crate::LogError::Malformed).
pub trait RecordCodec {
    type Key;
    type Value;

    fn encode_add(key: &Self::Key, value: &Self::Value) -> String;

    fn encode_remove(key: &Self::Key) -> String;

    fn decode_add(payload: &str) -> Result<(Self::Key, Self::Value), String>;

    fn decode_remove(payload: &str) -> Result<Self::Key, String>;
}

/// Frame a record as a complete, terminated line.
pub(crate) fn encode_line<C: RecordCodec>(
    record: &LogRecord<C::Key, C::Value>,
) -> Result<String, String> {
    let (tag, payload) = match record {
        LogRecord::Add(key, value) => (ADD_TAG, C::encode_add(key, value)),
        LogRecord::Remove(key) => (REMOVE_TAG, C::encode_remove(key)),
    };
    if payload.contains('\n') {
        return Err(format!("payload contains a line break: {payload:?}"));
    }

    let mut line = String::with_capacity(tag.len() + payload.len() + 1);
    line.push_str(tag);
    line.push_str(&payload);
    line.push('\n');
    Ok(line)
}

/// Decode one line (without its terminator).
pub(crate) fn decode_line<C: RecordCodec>(
    line: &str,
) -> Result<LogRecord<C::Key, C::Value>, String> {
    if let Some(payload) = line.strip_prefix(ADD_TAG) {
        let (key, value) = C::decode_add(payload)?;
        Ok(LogRecord::Add(key, value))
    } else if let Some(payload) = line.strip_prefix(REMOVE_TAG) {
        C::decode_remove(payload).map(LogRecord::Remove)
    } else {
        Err("unknown record tag".to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::test_codec::KvCodec;
    use super::*;

    #[test]
    fn add_line_is_tagged_and_terminated() {
        let line = encode_line::<KvCodec>(&LogRecord::Add("a".into(), 7)).unwrap();
        assert_eq!(line, "A a=7\n");
    }

    #[test]
    fn remove_line_is_tagged_and_terminated() {
        let line = encode_line::<KvCodec>(&LogRecord::Remove("a".into())).unwrap();
        assert_eq!(line, "D a\n");
    }

    #[test]
    fn line_break_in_payload_is_rejected() {
        let err = encode_line::<KvCodec>(&LogRecord::Remove("a\nb".into())).unwrap_err();
        assert!(err.contains("line break"));
    }

    #[test]
    fn decode_dispatches_on_tag() {
        assert_eq!(
            decode_line::<KvCodec>("A x=3").unwrap(),
            LogRecord::Add("x".to_string(), 3)
        );
        assert_eq!(
            decode_line::<KvCodec>("D x").unwrap(),
            LogRecord::Remove("x".to_string())
        );
    }

    #[test]
    fn remove_payload_shaped_like_add_stays_a_remove() {
        assert_eq!(
            decode_line::<KvCodec>("D x=3").unwrap(),
            LogRecord::Remove("x=3".to_string())
        );
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert!(decode_line::<KvCodec>("X x").is_err());
        assert!(decode_line::<KvCodec>("").is_err());
    }

    #[test]
    fn record_key_accessor() {
        let add: LogRecord<String, u32> = LogRecord::Add("k".into(), 1);
        assert_eq!(add.key(), "k");
        assert!(add.is_add());
        assert!(!LogRecord::<String, u32>::Remove("k".into()).is_add());
    }
}
