//! Content fingerprints used for duplicate detection.
//!
//! All hashes are lowercase hex SHA-256 digests. Multi-field inputs are joined
//! with the ASCII unit separator (`0x1F`) so that `("ab", "c")` and
//! `("a", "bc")` never collide.

use sha2::{Digest, Sha256};

const FIELD_SEPARATOR: &[u8] = &[0x1f];

/// Hashes raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hashes an ordered sequence of text fields.
pub fn hash_fields<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            hasher.update(FIELD_SEPARATOR);
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Hashes a participant set independent of the order names were observed in.
pub fn hash_participants<'a, I>(participants: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<&str> = participants.into_iter().collect();
    names.sort_unstable();
    names.dedup();
    hash_fields(names)
}
