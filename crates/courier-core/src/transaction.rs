//! Transaction drafts and signed transactions.
//!
//! An attachment exchange rides on a deliberately minimal transaction: no
//! state inputs or outputs, a list of attachment references, an optional
//! notary, and at least one signature to satisfy the ledger's
//! well-formedness rule. The draft is mutable until signed; signing
//! produces an immutable [`SignedTransaction`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{Keypair, Signature};
use crate::digest::{Digest, Hasher};
use crate::identity::{Identity, PublicKey};

/// A transaction draft under construction by the sender.
#[derive(Debug, Clone, Default)]
pub struct PendingTransaction {
    attachments: Vec<Digest>,
    notary: Option<Identity>,
}

impl PendingTransaction {
    /// Start an attachment-only draft with no notary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a draft that names a notary. Not used by the attachment
    /// exchange itself, where transactions carry no states to order.
    pub fn with_notary(notary: Identity) -> Self {
        Self {
            attachments: Vec::new(),
            notary: Some(notary),
        }
    }

    /// Reference an attachment by its digest.
    pub fn add_attachment(&mut self, digest: Digest) {
        self.attachments.push(digest);
    }

    pub fn attachments(&self) -> &[Digest] {
        &self.attachments
    }

    /// The transaction id: a digest over the canonical body encoding.
    ///
    ///   id = BLAKE3(count || attachment digests || notary marker [|| key])
    ///
    /// Signatures sign these bytes, so the id is fixed before signing and
    /// unchanged by it.
    pub fn id(&self) -> Digest {
        let mut h = Hasher::new();
        h.update(&(self.attachments.len() as u32).to_le_bytes());
        for digest in &self.attachments {
            h.update(digest.as_bytes());
        }
        match &self.notary {
            Some(notary) => {
                h.update(&[1]);
                h.update(notary.public_key.as_bytes());
            }
            None => h.update(&[0]),
        }
        h.finalize()
    }

    /// Sign the draft, freezing it. The one signature produced here is what
    /// satisfies the ledger's ≥1-signature rule for attachment-only
    /// transactions.
    pub fn sign(self, keypair: &Keypair) -> SignedTransaction {
        let id = self.id();
        let signature = TransactionSignature {
            signer: keypair.public(),
            signature: keypair.sign(id.as_bytes()),
        };
        SignedTransaction {
            attachments: self.attachments,
            notary: self.notary,
            signatures: vec![signature],
        }
    }
}

/// One party's signature over a transaction id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// An immutable, signed transaction ready for finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub attachments: Vec<Digest>,
    pub notary: Option<Identity>,
    pub signatures: Vec<TransactionSignature>,
}

impl SignedTransaction {
    /// The id of the underlying body — same bytes the signatures cover.
    pub fn id(&self) -> Digest {
        let draft = PendingTransaction {
            attachments: self.attachments.clone(),
            notary: self.notary.clone(),
        };
        draft.id()
    }

    /// Check well-formedness and every signature.
    ///
    /// A transaction with no signatures is rejected outright; a signature
    /// that fails to verify names its signer in the error.
    pub fn verify_signatures(&self) -> Result<(), TransactionError> {
        if self.signatures.is_empty() {
            return Err(TransactionError::NoSignatures);
        }
        let id = self.id();
        for sig in &self.signatures {
            sig.signature
                .verify(&sig.signer, id.as_bytes())
                .map_err(|_| TransactionError::InvalidSignature(sig.signer))?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("a transaction must carry at least one signature")]
    NoSignatures,

    #[error("signature from {0} does not verify")]
    InvalidSignature(PublicKey),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
