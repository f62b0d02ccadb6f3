//! Party identity — who can be named as a counterparty.
//!
//! An [`Identity`] is the membership directory's record for one network
//! party: a legal name, the Ed25519 public key the party signs with, and
//! the network address its node answers on. The sender resolves exactly one
//! identity for the counterparty key before requesting finality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// An Ed25519 verifying key, as carried in the membership directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}…)", &self.to_hex()[..16])
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("public key must be exactly 64 hex characters")]
pub struct ParsePublicKeyError;

impl FromStr for PublicKey {
    type Err = ParsePublicKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ParsePublicKeyError)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| ParsePublicKeyError)?;
        Ok(Self(bytes))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A resolved membership record: (public key, network address) plus the
/// party's legal name for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub public_key: PublicKey,
    pub address: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, public_key: PublicKey, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_key,
            address: address.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}…)", self.name, &self.public_key.to_hex()[..16])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
