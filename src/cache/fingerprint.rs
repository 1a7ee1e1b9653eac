//! Content fingerprints for the transform cache
//!
//! A fingerprint is the SHA-1 of the transform-parameter identifier and the
//! raw source bytes. Same source + same parameters = same cache entry, no
//! matter which icon key the source was found under.

use sha1::{Digest, Sha1};
use std::fmt;

/// Suffix of every cache entry file
pub const ENTRY_SUFFIX: &str = ".json.gzip";

/// 160-bit content hash used as the cache lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    /// Hash `source` under the given parameter `identifier`
    ///
    /// The identifier is length-prefixed so that no (identifier, source)
    /// pair can produce the same byte stream as a different pair.
    pub fn compute(source: &[u8], identifier: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update((identifier.len() as u64).to_le_bytes());
        hasher.update(identifier.as_bytes());
        hasher.update(source);
        Self(hasher.finalize().into())
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// File name of the cache entry for this fingerprint
    pub fn file_name(&self) -> String {
        format!("{}{}", self.to_hex(), ENTRY_SUFFIX)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
