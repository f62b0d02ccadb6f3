//! Boundary traits for the ledger node's RPC surface.
//!
//! Intentionally minimal: these are the four collaborators the exchange
//! protocol consumes, specified at the interface level only. Implementations
//! are injected as `Arc<dyn …>` so the protocol is testable with fakes.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use courier_core::{Digest, Identity, PublicKey, SignedTransaction};

use crate::error::LedgerError;

/// One finalized transaction as seen by a subscriber.
///
/// By the time an event is emitted, the node's dependency resolution has
/// already fetched any referenced attachments into the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub tx_id: Digest,
    pub attachments: Vec<Digest>,
}

/// The node's acknowledgement that every required counterparty accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityAck {
    pub tx_id: Digest,
}

/// Content-addressed attachment store, reachable only through the node.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn exists(&self, digest: &Digest) -> Result<bool, LedgerError>;

    /// Upload content; the node returns the digest it stored under.
    /// Uploading identical content twice is a no-op, not an error.
    async fn upload(&self, content: Bytes) -> Result<Digest, LedgerError>;

    async fn fetch(&self, digest: &Digest) -> Result<Option<Bytes>, LedgerError>;
}

/// Membership directory mapping public keys to network identities.
#[async_trait]
pub trait PartyDirectory: Send + Sync {
    async fn own_identity(&self) -> Result<Identity, LedgerError>;

    /// Resolve a public key to its identity, if the current membership view
    /// has one.
    async fn resolve(&self, key: &PublicKey) -> Result<Option<Identity>, LedgerError>;

    /// Every identity in the membership view other than `me`. Possibly
    /// empty.
    async fn list_others(&self, me: &Identity) -> Result<Vec<Identity>, LedgerError>;
}

/// Two-party transaction finalization.
#[async_trait]
pub trait FinalityService: Send + Sync {
    /// Submit a signed transaction, naming the counterparties whose
    /// acknowledgement is required. Resolves when all have accepted.
    async fn submit(
        &self,
        transaction: SignedTransaction,
        counterparties: &[Identity],
    ) -> Result<FinalityAck, LedgerError>;
}

/// The node's stream of verified, finalized transactions.
#[async_trait]
pub trait TransactionEvents: Send + Sync {
    /// Open a fresh subscription. Each subscription is an independent,
    /// restartable cursor over the stream.
    async fn subscribe(&self) -> Result<EventSubscription, LedgerError>;
}

/// A live subscription handle.
///
/// Dropping the handle releases the subscription on every exit path: the
/// receiver closes, and any background feed task is aborted. Consumers that
/// abandon an exchange leak nothing.
pub struct EventSubscription {
    rx: mpsc::Receiver<TransactionEvent>,
    feed: Option<JoinHandle<()>>,
}

impl EventSubscription {
    /// A subscription fed directly through a channel.
    pub fn new(rx: mpsc::Receiver<TransactionEvent>) -> Self {
        Self { rx, feed: None }
    }

    /// A subscription whose channel is pumped by a background task. The
    /// task is aborted when the subscription is dropped.
    pub fn with_feed_task(rx: mpsc::Receiver<TransactionEvent>, feed: JoinHandle<()>) -> Self {
        Self {
            rx,
            feed: Some(feed),
        }
    }

    /// Next event, or `None` when the stream has terminated.
    pub async fn next(&mut self) -> Option<TransactionEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
