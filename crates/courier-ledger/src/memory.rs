//! In-process ledger network.
//!
//! [`MemoryLedger`] models the whole network — attachment store, membership
//! directory, and finality — behind the same traits the HTTP client
//! implements, so the exchange protocol runs unmodified against it. Used by
//! the test suites and by loopback demos. Not a consensus implementation:
//! `submit` validates signatures and dependencies, records the transaction,
//! and broadcasts the event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;

use courier_core::{Digest, Identity, PublicKey, SignedTransaction};

use crate::boundary::{
    AttachmentStore, EventSubscription, FinalityAck, FinalityService, PartyDirectory,
    TransactionEvent, TransactionEvents,
};
use crate::error::LedgerError;

/// Shared state for an in-process network of parties.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    /// Content-addressed attachment store: digest -> bytes.
    attachments: Arc<DashMap<Digest, Bytes>>,
    /// Membership directory: public key -> identity.
    parties: Arc<DashMap<PublicKey, Identity>>,
    /// Live event subscribers.
    subscribers: Arc<Mutex<Vec<mpsc::Sender<TransactionEvent>>>>,
    /// Finalized transactions, in submission order.
    finalized: Arc<Mutex<Vec<SignedTransaction>>>,
    /// Number of upload calls that actually stored new content.
    uploads: Arc<AtomicUsize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a party and return its node handle.
    pub fn join(&self, identity: Identity) -> MemoryNode {
        self.parties.insert(identity.public_key, identity.clone());
        MemoryNode {
            network: self.clone(),
            me: identity,
        }
    }

    /// How many uploads stored new content (idempotent re-uploads excluded).
    pub fn stored_uploads(&self) -> usize {
        self.uploads.load(Ordering::Relaxed)
    }

    /// Finalized transactions so far.
    pub fn finalized(&self) -> Vec<SignedTransaction> {
        self.finalized.lock().unwrap().clone()
    }

    fn broadcast(&self, event: TransactionEvent) {
        // Clone the senders out so no lock is held while sending.
        let senders: Vec<_> = {
            let mut subs = self.subscribers.lock().unwrap();
            subs.retain(|s| !s.is_closed());
            subs.clone()
        };
        for sender in senders {
            // A full or closed subscriber misses the event; it was not
            // listening.
            let _ = sender.try_send(event.clone());
        }
    }
}

/// One party's view of a [`MemoryLedger`] — what an RPC connection to that
/// party's node would expose.
#[derive(Clone)]
pub struct MemoryNode {
    network: MemoryLedger,
    me: Identity,
}

impl MemoryNode {
    pub fn identity(&self) -> &Identity {
        &self.me
    }
}

#[async_trait]
impl AttachmentStore for MemoryNode {
    async fn exists(&self, digest: &Digest) -> Result<bool, LedgerError> {
        Ok(self.network.attachments.contains_key(digest))
    }

    async fn upload(&self, content: Bytes) -> Result<Digest, LedgerError> {
        let digest = Digest::of(&content);
        // Content addressing makes duplicate upload a no-op, never a
        // conflicting write.
        if self
            .network
            .attachments
            .insert(digest, content)
            .is_none()
        {
            self.network.uploads.fetch_add(1, Ordering::Relaxed);
        }
        Ok(digest)
    }

    async fn fetch(&self, digest: &Digest) -> Result<Option<Bytes>, LedgerError> {
        Ok(self.network.attachments.get(digest).map(|b| b.clone()))
    }
}

#[async_trait]
impl PartyDirectory for MemoryNode {
    async fn own_identity(&self) -> Result<Identity, LedgerError> {
        Ok(self.me.clone())
    }

    async fn resolve(&self, key: &PublicKey) -> Result<Option<Identity>, LedgerError> {
        Ok(self.network.parties.get(key).map(|p| p.clone()))
    }

    async fn list_others(&self, me: &Identity) -> Result<Vec<Identity>, LedgerError> {
        let mut others: Vec<Identity> = self
            .network
            .parties
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|p| p.public_key != me.public_key)
            .collect();
        others.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(others)
    }
}

#[async_trait]
impl FinalityService for MemoryNode {
    async fn submit(
        &self,
        transaction: SignedTransaction,
        counterparties: &[Identity],
    ) -> Result<FinalityAck, LedgerError> {
        transaction
            .verify_signatures()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        for party in counterparties {
            if !self.network.parties.contains_key(&party.public_key) {
                return Err(LedgerError::Rejected(format!(
                    "unknown counterparty: {party}"
                )));
            }
        }

        // Dependency resolution: every referenced attachment must already
        // be in the store before the transaction is accepted.
        for digest in &transaction.attachments {
            if !self.network.attachments.contains_key(digest) {
                return Err(LedgerError::Rejected(format!(
                    "transaction references unknown attachment {digest}"
                )));
            }
        }

        let event = TransactionEvent {
            tx_id: transaction.id(),
            attachments: transaction.attachments.clone(),
        };
        self.network.finalized.lock().unwrap().push(transaction);
        self.network.broadcast(event.clone());

        tracing::debug!(tx_id = %event.tx_id, "transaction finalized");
        Ok(FinalityAck { tx_id: event.tx_id })
    }
}

#[async_trait]
impl TransactionEvents for MemoryNode {
    async fn subscribe(&self) -> Result<EventSubscription, LedgerError> {
        let (tx, rx) = mpsc::channel(64);
        self.network.subscribers.lock().unwrap().push(tx);
        Ok(EventSubscription::new(rx))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
