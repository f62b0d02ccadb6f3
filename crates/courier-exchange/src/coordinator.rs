//! Exchange orchestration — one blocking entry point per role.

use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;

use courier_core::config::ObserverPolicy;
use courier_core::crypto::Keypair;
use courier_core::Digest;
use courier_ledger::{AttachmentStore, FinalityService, PartyDirectory, TransactionEvents};

use crate::error::ExchangeError;
use crate::initiator::FinalityInitiator;
use crate::observer::FinalityObserver;
use crate::upload::AttachmentUploader;

/// Which side of the exchange this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Recipient,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sender" => Ok(Role::Sender),
            "recipient" => Ok(Role::Recipient),
            other => Err(format!("unknown role: {other} (expected sender|recipient)")),
        }
    }
}

/// Wires the exchange components against one node connection and exposes
/// the role entry points.
pub struct ExchangeCoordinator {
    directory: Arc<dyn PartyDirectory>,
    store: Arc<dyn AttachmentStore>,
    finality: Arc<dyn FinalityService>,
    events: Arc<dyn TransactionEvents>,
    keypair: Arc<Keypair>,
    policy: ObserverPolicy,
}

impl ExchangeCoordinator {
    /// Build from a single node connection implementing all four boundary
    /// traits — the common case for both the RPC client and the memory
    /// node.
    pub fn new<N>(node: N, keypair: Keypair, policy: ObserverPolicy) -> Self
    where
        N: AttachmentStore
            + PartyDirectory
            + FinalityService
            + TransactionEvents
            + Clone
            + 'static,
    {
        Self {
            directory: Arc::new(node.clone()),
            store: Arc::new(node.clone()),
            finality: Arc::new(node.clone()),
            events: Arc::new(node),
            keypair: Arc::new(keypair),
            policy,
        }
    }

    /// Build from individually injected boundaries.
    pub fn with_parts(
        directory: Arc<dyn PartyDirectory>,
        store: Arc<dyn AttachmentStore>,
        finality: Arc<dyn FinalityService>,
        events: Arc<dyn TransactionEvents>,
        keypair: Keypair,
        policy: ObserverPolicy,
    ) -> Self {
        Self {
            directory,
            store,
            finality,
            events,
            keypair: Arc::new(keypair),
            policy,
        }
    }

    /// Sender role: upload the artifact, reference it from a signed
    /// transaction, and block until the counterparty acknowledges
    /// finality.
    ///
    /// `expected` is the digest both parties agreed on; `None` derives it
    /// from the content. The counterparty is discovered as any identity in
    /// the membership view other than self.
    pub async fn run_sender(
        &self,
        content: Bytes,
        expected: Option<Digest>,
    ) -> Result<bool, ExchangeError> {
        let expected = expected.unwrap_or_else(|| Digest::of(&content));
        let counterparty = self.discover_counterparty().await?;
        tracing::info!(party = %counterparty, digest = %expected, "running sender role");

        let uploader = AttachmentUploader::new(self.store.clone());
        uploader.ensure_uploaded(content, expected).await?;

        let initiator = FinalityInitiator::new(
            self.directory.clone(),
            self.store.clone(),
            self.finality.clone(),
            self.keypair.clone(),
        );
        let signal = initiator
            .initiate(expected, &counterparty.public_key)
            .await?;
        signal.wait().await
    }

    /// Recipient role: block until the observer resolves for `expected`.
    pub async fn run_recipient(&self, expected: Digest) -> Result<bool, ExchangeError> {
        tracing::info!(digest = %expected, "running recipient role");
        let observer =
            FinalityObserver::with_policy(self.events.clone(), self.store.clone(), self.policy);
        let signal = observer.observe(expected).await?;
        signal.wait().await
    }

    /// Out-of-band discovery: any identity other than self. First match
    /// wins; an empty view means there is no one to exchange with.
    async fn discover_counterparty(&self) -> Result<courier_core::Identity, ExchangeError> {
        let me = self.directory.own_identity().await?;
        let others = self.directory.list_others(&me).await?;
        others
            .into_iter()
            .next()
            .ok_or(ExchangeError::NoCounterparty)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
