//! HTTP client for a ledger node's control API.
//!
//! Implements the boundary traits over plain request/response endpoints,
//! plus a long-polled cursor feed for the transaction event stream. The
//! node authenticates the channel; this client only speaks the protocol.
//!
//! Endpoints:
//!   GET  /attachments/{digest}/exists      -> { "exists": bool }
//!   POST /attachments  (octet-stream body) -> { "digest": hex }
//!   GET  /attachments/{digest}             -> bytes | 404
//!   GET  /network/identity                 -> Identity
//!   GET  /network/parties                  -> { "parties": [Identity] }
//!   GET  /network/parties/{key}            -> Identity | 404
//!   POST /transactions/finalize            -> { "tx_id": hex }
//!   GET  /transactions/events?after={seq}  -> { "events": [...] }

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use courier_core::{Digest, Identity, PublicKey, SignedTransaction};

use crate::boundary::{
    AttachmentStore, EventSubscription, FinalityAck, FinalityService, PartyDirectory,
    TransactionEvent, TransactionEvents,
};
use crate::error::LedgerError;

/// Pause between event polls that returned nothing.
const IDLE_POLL_DELAY: Duration = Duration::from_millis(250);

/// RPC connection to one ledger node.
#[derive(Clone)]
pub struct RpcNode {
    base: String,
    http: reqwest::Client,
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Deserialize)]
struct UploadResponse {
    digest: Digest,
}

#[derive(Deserialize)]
struct PartiesResponse {
    parties: Vec<Identity>,
}

#[derive(Serialize)]
struct FinalizeRequest<'a> {
    transaction: &'a SignedTransaction,
    counterparties: &'a [Identity],
}

#[derive(Deserialize)]
struct SequencedEvent {
    seq: u64,
    #[serde(flatten)]
    event: TransactionEvent,
}

#[derive(Deserialize)]
struct EventsResponse {
    events: Vec<SequencedEvent>,
}

// ── Client ────────────────────────────────────────────────────────────────────

impl RpcNode {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, LedgerError> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(transport)?;
        ok_or_rejected(resp).await?.json().await.map_err(transport)
    }
}

fn transport(e: reqwest::Error) -> LedgerError {
    LedgerError::Unavailable(e.to_string())
}

/// Non-2xx responses become `Rejected` with the node's own words.
async fn ok_or_rejected(resp: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(LedgerError::Rejected(format!("{status}: {body}")))
}

#[async_trait]
impl AttachmentStore for RpcNode {
    async fn exists(&self, digest: &Digest) -> Result<bool, LedgerError> {
        let resp: ExistsResponse = self
            .get_json(&format!("/attachments/{digest}/exists"))
            .await?;
        Ok(resp.exists)
    }

    async fn upload(&self, content: Bytes) -> Result<Digest, LedgerError> {
        let resp = self
            .http
            .post(self.url("/attachments"))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await
            .map_err(transport)?;
        let resp: UploadResponse = ok_or_rejected(resp).await?.json().await.map_err(transport)?;
        Ok(resp.digest)
    }

    async fn fetch(&self, digest: &Digest) -> Result<Option<Bytes>, LedgerError> {
        let resp = self
            .http
            .get(self.url(&format!("/attachments/{digest}")))
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = ok_or_rejected(resp).await?.bytes().await.map_err(transport)?;
        Ok(Some(bytes))
    }
}

#[async_trait]
impl PartyDirectory for RpcNode {
    async fn own_identity(&self) -> Result<Identity, LedgerError> {
        self.get_json("/network/identity").await
    }

    async fn resolve(&self, key: &PublicKey) -> Result<Option<Identity>, LedgerError> {
        let resp = self
            .http
            .get(self.url(&format!("/network/parties/{key}")))
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let identity = ok_or_rejected(resp).await?.json().await.map_err(transport)?;
        Ok(Some(identity))
    }

    async fn list_others(&self, me: &Identity) -> Result<Vec<Identity>, LedgerError> {
        let resp: PartiesResponse = self.get_json("/network/parties").await?;
        Ok(resp
            .parties
            .into_iter()
            .filter(|p| p.public_key != me.public_key)
            .collect())
    }
}

#[async_trait]
impl FinalityService for RpcNode {
    async fn submit(
        &self,
        transaction: SignedTransaction,
        counterparties: &[Identity],
    ) -> Result<FinalityAck, LedgerError> {
        let resp = self
            .http
            .post(self.url("/transactions/finalize"))
            .json(&FinalizeRequest {
                transaction: &transaction,
                counterparties,
            })
            .send()
            .await
            .map_err(transport)?;
        ok_or_rejected(resp).await?.json().await.map_err(transport)
    }
}

#[async_trait]
impl TransactionEvents for RpcNode {
    async fn subscribe(&self) -> Result<EventSubscription, LedgerError> {
        let (tx, rx) = mpsc::channel(64);
        let client = self.clone();

        // Cursor feed: poll from seq 0 upward, forwarding each event.
        // Transport failure ends the feed — the subscriber sees a closed
        // stream and decides whether to resubscribe.
        let feed = tokio::spawn(async move {
            let mut after = 0u64;
            loop {
                let batch: EventsResponse = match client
                    .get_json(&format!("/transactions/events?after={after}"))
                    .await
                {
                    Ok(batch) => batch,
                    Err(e) => {
                        tracing::warn!(error = %e, "event feed terminated");
                        return;
                    }
                };

                if batch.events.is_empty() {
                    tokio::time::sleep(IDLE_POLL_DELAY).await;
                    continue;
                }

                for sequenced in batch.events {
                    after = after.max(sequenced.seq + 1);
                    if tx.send(sequenced.event).await.is_err() {
                        // Subscriber went away; stop polling.
                        return;
                    }
                }
            }
        });

        Ok(EventSubscription::with_feed_task(rx, feed))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
