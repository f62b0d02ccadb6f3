//! Signing primitives for Courier.
//!
//! Transactions must carry at least one signature before the ledger will
//! finalize them, so every party holds a long-term Ed25519 keypair.
//! Keypairs are managed via ed25519-dalek; exported key material is wrapped
//! in `Zeroizing` so copies are wiped from memory when dropped.

use std::fmt;
use std::path::Path;

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::identity::PublicKey;

/// A party's long-term Ed25519 signing keypair.
///
/// Generated once and stored persistently. The public key appears in the
/// membership directory; the private key never leaves this struct except
/// through [`Keypair::private_bytes`] for storage.
pub struct Keypair {
    signing: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        Self {
            signing: ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Reconstruct a keypair from stored private key bytes.
    /// The public key is derived deterministically from the private key.
    pub fn from_private(private_bytes: [u8; 32]) -> Self {
        Self {
            signing: ed25519_dalek::SigningKey::from_bytes(&private_bytes),
        }
    }

    /// Serialize the private key for persistent storage.
    ///
    /// Store these bytes securely (mode 0600). The public key need not be
    /// stored — it is always derived on load.
    pub fn private_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing.to_bytes())
    }

    /// The verifying half, as it appears in the membership directory.
    pub fn public(&self) -> PublicKey {
        PublicKey::from_bytes(self.signing.verifying_key().to_bytes())
    }

    /// Sign a message, typically a transaction id.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing.sign(message).to_bytes())
    }

    /// Load a keypair from `path`, generating and persisting a fresh one if
    /// the file does not exist. The file holds the private key as hex.
    pub fn load_or_generate(path: &Path) -> Result<Self, CryptoError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let bytes = hex::decode(text.trim()).map_err(|_| CryptoError::BadKeyFile)?;
                let bytes: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::BadKeyFile)?;
                Ok(Self::from_private(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let keypair = Self::generate();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, hex::encode(*keypair.private_bytes()))?;
                Ok(keypair)
            }
            Err(e) => Err(CryptoError::Io(e)),
        }
    }
}

/// A detached Ed25519 signature over a transaction id.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Verify this signature over `message` against `signer`.
    pub fn verify(&self, signer: &PublicKey, message: &[u8]) -> Result<(), CryptoError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(signer.as_bytes())
            .map_err(|_| CryptoError::BadPublicKey)?;
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify(message, &sig)
            .map_err(|_| CryptoError::BadSignature)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}…)", &hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let bytes: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature must be 128 hex characters"))?;
        Ok(Self(bytes))
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key file is not a 32-byte hex private key")]
    BadKeyFile,

    #[error("public key bytes are not a valid Ed25519 point")]
    BadPublicKey,

    #[error("signature does not verify")]
    BadSignature,

    #[error("key storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
