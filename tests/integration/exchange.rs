//! End-to-end attachment exchange scenarios.

use std::sync::Arc;

use bytes::Bytes;

use courier_core::config::ObserverPolicy;
use courier_core::{Digest, PendingTransaction};
use courier_exchange::{ExchangeCoordinator, ExchangeError, FinalityInitiator};
use courier_ledger::{AttachmentStore, FinalityService, MemoryLedger};

use crate::{join, two_party_network};

/// Scenario A: sender uploads and finalizes, recipient observes the
/// matching event. Both sides report success.
#[tokio::test]
async fn sender_delivers_and_recipient_matches() {
    let (network, alice, bob) = two_party_network();

    let content = Bytes::from_static(b"the prospectus");
    let expected = Digest::of(&content);

    let recipient = ExchangeCoordinator::new(bob.node, bob.keypair, ObserverPolicy::FirstEvent);
    let recipient_task = tokio::spawn(async move { recipient.run_recipient(expected).await });
    // Let the observer's subscription register before anything is submitted.
    tokio::task::yield_now().await;

    let sender = ExchangeCoordinator::new(alice.node, alice.keypair, ObserverPolicy::FirstEvent);
    let sent = sender.run_sender(content, Some(expected)).await.unwrap();
    assert!(sent, "sender should see the finality acknowledgement");

    let received = recipient_task.await.unwrap().unwrap();
    assert!(received, "recipient should match the expected digest");

    let finalized = network.finalized();
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].attachments, vec![expected]);
    finalized[0].verify_signatures().unwrap();
}

/// Scenario B: initiating with a digest the local store does not hold
/// fails before anything reaches the ledger.
#[tokio::test]
async fn initiate_without_stored_artifact_submits_nothing() {
    let (network, alice, bob) = two_party_network();

    let node = Arc::new(alice.node);
    let initiator =
        FinalityInitiator::new(node.clone(), node.clone(), node, Arc::new(alice.keypair));

    let absent = Digest::of(b"never uploaded");
    let err = initiator
        .initiate(absent, &bob.node.identity().public_key)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::ArtifactNotStored(d) if d == absent));
    assert!(network.finalized().is_empty(), "no transaction may be submitted");
}

/// Scenario C: the recipient's first event references no attachments at
/// all — the exchange resolves false and the subscription is released.
#[tokio::test]
async fn attachmentless_first_event_resolves_false() {
    let (network, alice, bob) = two_party_network();
    let bob_identity = bob.node.identity().clone();

    let recipient = ExchangeCoordinator::new(bob.node, bob.keypair, ObserverPolicy::FirstEvent);
    let recipient_task =
        tokio::spawn(async move { recipient.run_recipient(Digest::of(b"the prospectus")).await });
    tokio::task::yield_now().await;

    // An unrelated attachment-free transaction is finalized first.
    let empty_tx = PendingTransaction::new().sign(&alice.keypair);
    alice.node.submit(empty_tx, &[bob_identity]).await.unwrap();

    let received = recipient_task.await.unwrap().unwrap();
    assert!(!received, "first event decides, and it did not match");
    assert_eq!(network.finalized().len(), 1);
}

/// The scan policy rides out unrelated transactions and still completes.
#[tokio::test]
async fn scan_policy_survives_unrelated_traffic() {
    let (_network, alice, bob) = two_party_network();

    let content = Bytes::from_static(b"the prospectus");
    let expected = Digest::of(&content);

    let recipient =
        ExchangeCoordinator::new(bob.node, bob.keypair, ObserverPolicy::ScanUntilMatch);
    let recipient_task = tokio::spawn(async move { recipient.run_recipient(expected).await });
    tokio::task::yield_now().await;

    // Noise first: an attachment-free transaction and an unrelated artifact.
    let noise_tx = PendingTransaction::new().sign(&alice.keypair);
    alice.node.submit(noise_tx, &[]).await.unwrap();

    let unrelated = alice
        .node
        .upload(Bytes::from_static(b"unrelated artifact"))
        .await
        .unwrap();
    let mut noise = PendingTransaction::new();
    noise.add_attachment(unrelated);
    alice
        .node
        .submit(noise.sign(&alice.keypair), &[])
        .await
        .unwrap();

    // Now the real exchange.
    let sender = ExchangeCoordinator::new(alice.node, alice.keypair, ObserverPolicy::FirstEvent);
    assert!(sender.run_sender(content, Some(expected)).await.unwrap());

    assert!(recipient_task.await.unwrap().unwrap());
}

/// Running the sender twice leaves the store with one stored copy — the
/// second run's existence check skips the upload.
#[tokio::test]
async fn repeated_send_uploads_once() {
    let (network, alice, _bob) = two_party_network();

    let content = Bytes::from_static(b"the prospectus");
    let expected = Digest::of(&content);

    let sender = ExchangeCoordinator::new(alice.node, alice.keypair, ObserverPolicy::FirstEvent);
    assert!(sender
        .run_sender(content.clone(), Some(expected))
        .await
        .unwrap());
    assert!(sender.run_sender(content, Some(expected)).await.unwrap());

    assert_eq!(network.stored_uploads(), 1);
    assert_eq!(network.finalized().len(), 2);
}

/// Three parties: discovery picks the first listed identity other than
/// self, and the exchange completes for the party that is observing.
#[tokio::test]
async fn discovery_prefers_first_listed_party() {
    let network = MemoryLedger::new();
    let alice = join(&network, "Alice");
    let bob = join(&network, "Bob");
    let _carol = join(&network, "Carol");

    let content = Bytes::from_static(b"the prospectus");
    let expected = Digest::of(&content);

    // Bob sorts before Carol, so Alice's discovery resolves Bob.
    let recipient = ExchangeCoordinator::new(bob.node, bob.keypair, ObserverPolicy::FirstEvent);
    let recipient_task = tokio::spawn(async move { recipient.run_recipient(expected).await });
    tokio::task::yield_now().await;

    let sender = ExchangeCoordinator::new(alice.node, alice.keypair, ObserverPolicy::FirstEvent);
    assert!(sender.run_sender(content, Some(expected)).await.unwrap());
    assert!(recipient_task.await.unwrap().unwrap());
    assert_eq!(network.finalized().len(), 1);
}
