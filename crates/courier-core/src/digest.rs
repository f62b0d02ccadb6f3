//! Content addressing for attachments.
//!
//! A [`Digest`] is the 32-byte BLAKE3 hash of an attachment's bytes. It is
//! the key under which the attachment lives in the node's store, and the
//! correlation key the recipient uses to recognise the transaction it is
//! waiting for. Equality is byte-wise; a digest never changes once computed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The content address of an attachment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Hash a byte slice, returning its digest.
    ///
    /// Pure and deterministic. The empty byte sequence hashes to the
    /// BLAKE3 empty-input vector, not an error.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap raw digest bytes received from the node.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Byte-wise equality check against an expected digest.
    pub fn matches(&self, expected: &Digest) -> bool {
        self.0 == expected.0
    }

    /// Full lowercase hex rendering (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form for logs — the full hash is rarely useful in a trace.
        write!(f, "Digest({}…)", &self.to_hex()[..16])
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("digest must be exactly 64 hex characters")]
pub struct ParseDigestError;

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ParseDigestError)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| ParseDigestError)?;
        Ok(Self(bytes))
    }
}

// On the wire and in config files a digest is a hex string.

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Incremental hasher for content that arrives in pieces.
///
/// # Example
/// ```
/// use courier_core::digest::{Digest, Hasher};
/// let mut h = Hasher::new();
/// h.update(b"hello ");
/// h.update(b"world");
/// assert_eq!(h.finalize(), Digest::of(b"hello world"));
/// ```
pub struct Hasher(blake3::Hasher);

impl Hasher {
    pub fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> Digest {
        Digest(*self.0.finalize().as_bytes())
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
