//! Shared encoding helpers.
//!
//! Canonical byte strings in this crate are built from length-prefixed
//! fields (u32 big-endian length followed by the bytes) so that no two
//! distinct field sequences produce the same encoding.

/// Appends `bytes` to `buf` with a u32 big-endian length prefix.
///
/// Every caller passes fields bounded well below `u32::MAX` (certificate
/// fields, digests, JSON parts capped by `MAX_ENVELOPE_SIZE`).
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn put_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

/// Base64 serialization for binary data in JSON.
pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
