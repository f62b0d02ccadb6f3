//! Sender role — build, sign, and finalize the attachment transaction.

use std::sync::Arc;

use courier_core::crypto::Keypair;
use courier_core::{Digest, PendingTransaction, PublicKey};
use courier_ledger::{AttachmentStore, FinalityService, PartyDirectory};

use crate::error::ExchangeError;
use crate::signal::CompletionSignal;

/// Initiates two-party finalization of a transaction referencing one
/// artifact.
pub struct FinalityInitiator {
    directory: Arc<dyn PartyDirectory>,
    store: Arc<dyn AttachmentStore>,
    finality: Arc<dyn FinalityService>,
    keypair: Arc<Keypair>,
}

impl FinalityInitiator {
    pub fn new(
        directory: Arc<dyn PartyDirectory>,
        store: Arc<dyn AttachmentStore>,
        finality: Arc<dyn FinalityService>,
        keypair: Arc<Keypair>,
    ) -> Self {
        Self {
            directory,
            store,
            finality,
            keypair,
        }
    }

    /// Run the sender sequence for `artifact` against `counterparty`.
    ///
    /// Precondition checks run before any network side effect: the
    /// counterparty must resolve in the membership view and the artifact
    /// must already be in the local store. The submission itself runs on
    /// its own task; the returned signal resolves `true` on the finality
    /// acknowledgement or carries the propagated failure.
    pub async fn initiate(
        &self,
        artifact: Digest,
        counterparty: &PublicKey,
    ) -> Result<CompletionSignal, ExchangeError> {
        let party = self
            .directory
            .resolve(counterparty)
            .await?
            .ok_or(ExchangeError::UnknownParty(*counterparty))?;

        if !self
            .store
            .exists(&artifact)
            .await
            .map_err(ExchangeError::StoreUnavailable)?
        {
            return Err(ExchangeError::ArtifactNotStored(artifact));
        }

        // A transaction that exists purely to carry the artifact reference:
        // no states, one signature to satisfy well-formedness.
        let mut draft = PendingTransaction::new();
        draft.add_attachment(artifact);
        let signed = draft.sign(&self.keypair);
        let tx_id = signed.id();

        tracing::info!(tx_id = %tx_id, party = %party, "submitting transaction for finalization");

        let (resolver, signal) = CompletionSignal::new();
        let finality = self.finality.clone();
        tokio::spawn(async move {
            match finality.submit(signed, &[party]).await {
                Ok(ack) => {
                    tracing::info!(tx_id = %ack.tx_id, "finality acknowledged");
                    resolver.resolve(Ok(true));
                }
                Err(e) => {
                    tracing::warn!(tx_id = %tx_id, error = %e, "finalization failed");
                    resolver.resolve(Err(ExchangeError::FinalityFailed(e)));
                }
            }
        });

        Ok(signal)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
