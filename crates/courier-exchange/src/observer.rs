//! Recipient role — watch the finalized-transaction stream for the
//! expected artifact.

use std::sync::Arc;

use courier_core::config::ObserverPolicy;
use courier_core::Digest;
use courier_ledger::{AttachmentStore, EventSubscription, TransactionEvents};

use crate::error::ExchangeError;
use crate::signal::{CompletionSignal, Outcome};

/// Observes incoming finalized transactions and resolves a completion
/// signal when the expected digest shows up.
///
/// By the time the stream emits an event, upstream dependency resolution
/// has already fetched any referenced attachments into the local store —
/// the store check on a match is defensive, and its failure means that
/// guarantee broke.
pub struct FinalityObserver {
    events: Arc<dyn TransactionEvents>,
    store: Arc<dyn AttachmentStore>,
    policy: ObserverPolicy,
}

impl FinalityObserver {
    pub fn new(events: Arc<dyn TransactionEvents>, store: Arc<dyn AttachmentStore>) -> Self {
        Self::with_policy(events, store, ObserverPolicy::default())
    }

    pub fn with_policy(
        events: Arc<dyn TransactionEvents>,
        store: Arc<dyn AttachmentStore>,
        policy: ObserverPolicy,
    ) -> Self {
        Self {
            events,
            store,
            policy,
        }
    }

    /// Subscribe and resolve once for `expected`.
    ///
    /// Under [`ObserverPolicy::FirstEvent`] the first event decides: a
    /// match resolves `true`, anything else resolves `false`. Under
    /// [`ObserverPolicy::ScanUntilMatch`] non-matching events are skipped.
    /// Either way the signal resolves at most once and the subscription is
    /// released on every exit path.
    pub async fn observe(&self, expected: Digest) -> Result<CompletionSignal, ExchangeError> {
        let mut subscription = self.events.subscribe().await?;
        let (resolver, signal) = CompletionSignal::new();
        let store = self.store.clone();
        let policy = self.policy;

        tokio::spawn(async move {
            let outcome = drive(&mut subscription, &*store, policy, expected).await;
            resolver.resolve(outcome);
            // Subscription drops here, releasing the feed.
        });

        Ok(signal)
    }
}

async fn drive(
    subscription: &mut EventSubscription,
    store: &dyn AttachmentStore,
    policy: ObserverPolicy,
    expected: Digest,
) -> Outcome {
    loop {
        let Some(event) = subscription.next().await else {
            return Err(ExchangeError::StreamClosed);
        };

        if event.attachments.iter().any(|d| d.matches(&expected)) {
            let present = store
                .exists(&expected)
                .await
                .map_err(ExchangeError::StoreUnavailable)?;
            if !present {
                // The stream promised dependency resolution ran first.
                return Err(ExchangeError::VerificationFailed(expected));
            }
            tracing::info!(tx_id = %event.tx_id, digest = %expected, "expected attachment received");
            return Ok(true);
        }

        match policy {
            ObserverPolicy::FirstEvent => {
                tracing::info!(
                    tx_id = %event.tx_id,
                    references = event.attachments.len(),
                    "first observed transaction does not carry the expected attachment"
                );
                return Ok(false);
            }
            ObserverPolicy::ScanUntilMatch => {
                tracing::debug!(tx_id = %event.tx_id, "skipping non-matching transaction");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use courier_ledger::{LedgerError, TransactionEvent};

    /// Event source backed by a plain channel the test feeds directly.
    struct ChannelEvents {
        rx: std::sync::Mutex<Option<mpsc::Receiver<TransactionEvent>>>,
    }

    impl ChannelEvents {
        fn pair(buffer: usize) -> (mpsc::Sender<TransactionEvent>, Arc<Self>) {
            let (tx, rx) = mpsc::channel(buffer);
            (
                tx,
                Arc::new(Self {
                    rx: std::sync::Mutex::new(Some(rx)),
                }),
            )
        }
    }

    #[async_trait]
    impl TransactionEvents for ChannelEvents {
        async fn subscribe(&self) -> Result<EventSubscription, LedgerError> {
            let rx = self
                .rx
                .lock()
                .unwrap()
                .take()
                .expect("single subscription per test");
            Ok(EventSubscription::new(rx))
        }
    }

    /// Store with a fixed answer for every existence check.
    struct FixedStore(bool);

    #[async_trait]
    impl AttachmentStore for FixedStore {
        async fn exists(&self, _digest: &Digest) -> Result<bool, LedgerError> {
            Ok(self.0)
        }
        async fn upload(&self, content: Bytes) -> Result<Digest, LedgerError> {
            Ok(Digest::of(&content))
        }
        async fn fetch(&self, _digest: &Digest) -> Result<Option<Bytes>, LedgerError> {
            Ok(None)
        }
    }

    fn event(tx: &[u8], attachments: &[Digest]) -> TransactionEvent {
        TransactionEvent {
            tx_id: Digest::of(tx),
            attachments: attachments.to_vec(),
        }
    }

    #[tokio::test]
    async fn matching_first_event_resolves_true() {
        let (tx, events) = ChannelEvents::pair(4);
        let observer = FinalityObserver::new(events, Arc::new(FixedStore(true)));

        let expected = Digest::of(b"prospectus");
        let signal = observer.observe(expected).await.unwrap();

        tx.send(event(b"tx1", &[expected])).await.unwrap();
        assert!(matches!(signal.wait().await, Ok(true)));
    }

    #[tokio::test]
    async fn unrelated_first_event_resolves_false() {
        let (tx, events) = ChannelEvents::pair(4);
        let observer = FinalityObserver::new(events, Arc::new(FixedStore(true)));

        let signal = observer.observe(Digest::of(b"prospectus")).await.unwrap();

        // First event carries no attachment references at all.
        tx.send(event(b"tx1", &[])).await.unwrap();
        assert!(matches!(signal.wait().await, Ok(false)));
    }

    #[tokio::test]
    async fn closed_stream_surfaces_stream_closed() {
        let (tx, events) = ChannelEvents::pair(4);
        let observer = FinalityObserver::new(events, Arc::new(FixedStore(true)));

        let signal = observer.observe(Digest::of(b"prospectus")).await.unwrap();
        drop(tx);

        assert!(matches!(signal.wait().await, Err(ExchangeError::StreamClosed)));
    }

    #[tokio::test]
    async fn absent_artifact_on_match_is_verification_failure() {
        let (tx, events) = ChannelEvents::pair(4);
        // The store denies holding what the transaction references.
        let observer = FinalityObserver::new(events, Arc::new(FixedStore(false)));

        let expected = Digest::of(b"prospectus");
        let signal = observer.observe(expected).await.unwrap();

        tx.send(event(b"tx1", &[expected])).await.unwrap();
        assert!(matches!(
            signal.wait().await,
            Err(ExchangeError::VerificationFailed(d)) if d == expected
        ));
    }

    #[tokio::test]
    async fn scan_policy_skips_non_matching_events() {
        let (tx, events) = ChannelEvents::pair(4);
        let observer = FinalityObserver::with_policy(
            events,
            Arc::new(FixedStore(true)),
            ObserverPolicy::ScanUntilMatch,
        );

        let expected = Digest::of(b"prospectus");
        let signal = observer.observe(expected).await.unwrap();

        tx.send(event(b"tx1", &[])).await.unwrap();
        tx.send(event(b"tx2", &[Digest::of(b"unrelated")])).await.unwrap();
        tx.send(event(b"tx3", &[expected])).await.unwrap();

        assert!(matches!(signal.wait().await, Ok(true)));
    }

    #[tokio::test]
    async fn resolves_at_most_once_with_multiple_qualifying_events() {
        let (tx, events) = ChannelEvents::pair(4);
        let observer = FinalityObserver::new(events, Arc::new(FixedStore(true)));

        let expected = Digest::of(b"prospectus");
        let signal = observer.observe(expected).await.unwrap();

        // Two qualifying events; the first resolves, the second lands after
        // the subscription is already released.
        tx.send(event(b"tx1", &[expected])).await.unwrap();
        let _ = tx.send(event(b"tx2", &[expected])).await;

        assert!(matches!(signal.wait().await, Ok(true)));
    }
}
