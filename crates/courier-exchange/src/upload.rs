//! Idempotent attachment upload.

use std::sync::Arc;

use bytes::Bytes;

use courier_core::Digest;
use courier_ledger::AttachmentStore;

use crate::error::ExchangeError;

/// Ensures an artifact is present in the store exactly once, keyed by
/// digest.
///
/// Check-then-upload is not atomic against other uploaders; that race is
/// benign because uploading identical content twice is a no-op in a
/// content-addressed store. What is never tolerated is the store reporting
/// a different digest than the one the parties agreed on.
pub struct AttachmentUploader {
    store: Arc<dyn AttachmentStore>,
}

impl AttachmentUploader {
    pub fn new(store: Arc<dyn AttachmentStore>) -> Self {
        Self { store }
    }

    /// Make sure `content` is stored under `expected`, uploading only if
    /// absent. Transport failures are surfaced, not retried — a retry after
    /// a partial upload is the caller's decision.
    pub async fn ensure_uploaded(
        &self,
        content: Bytes,
        expected: Digest,
    ) -> Result<Digest, ExchangeError> {
        if self
            .store
            .exists(&expected)
            .await
            .map_err(ExchangeError::StoreUnavailable)?
        {
            tracing::debug!(digest = %expected, "attachment already stored");
            return Ok(expected);
        }

        let stored = self
            .store
            .upload(content)
            .await
            .map_err(ExchangeError::StoreUnavailable)?;

        if !stored.matches(&expected) {
            return Err(ExchangeError::DigestMismatch {
                expected,
                actual: stored,
            });
        }

        tracing::info!(digest = %stored, "attachment uploaded");
        Ok(stored)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use courier_ledger::LedgerError;

    /// Store fake that counts calls, so tests can observe exactly what the
    /// uploader did.
    #[derive(Default)]
    struct CountingStore {
        blobs: Mutex<HashMap<Digest, Bytes>>,
        exists_calls: AtomicUsize,
        upload_calls: AtomicUsize,
    }

    #[async_trait]
    impl AttachmentStore for CountingStore {
        async fn exists(&self, digest: &Digest) -> Result<bool, LedgerError> {
            self.exists_calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.blobs.lock().unwrap().contains_key(digest))
        }

        async fn upload(&self, content: Bytes) -> Result<Digest, LedgerError> {
            self.upload_calls.fetch_add(1, Ordering::Relaxed);
            let digest = Digest::of(&content);
            self.blobs.lock().unwrap().insert(digest, content);
            Ok(digest)
        }

        async fn fetch(&self, digest: &Digest) -> Result<Option<Bytes>, LedgerError> {
            Ok(self.blobs.lock().unwrap().get(digest).cloned())
        }
    }

    /// Store fake whose transport is down.
    struct DownStore;

    #[async_trait]
    impl AttachmentStore for DownStore {
        async fn exists(&self, _digest: &Digest) -> Result<bool, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".into()))
        }

        async fn upload(&self, _content: Bytes) -> Result<Digest, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".into()))
        }

        async fn fetch(&self, _digest: &Digest) -> Result<Option<Bytes>, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn uploads_when_absent() {
        let store = Arc::new(CountingStore::default());
        let uploader = AttachmentUploader::new(store.clone());

        let content = Bytes::from_static(b"prospectus");
        let expected = Digest::of(&content);

        let stored = uploader.ensure_uploaded(content, expected).await.unwrap();
        assert_eq!(stored, expected);
        assert_eq!(store.upload_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn skips_upload_when_present() {
        let store = Arc::new(CountingStore::default());
        let uploader = AttachmentUploader::new(store.clone());

        let content = Bytes::from_static(b"prospectus");
        let expected = Digest::of(&content);

        uploader
            .ensure_uploaded(content.clone(), expected)
            .await
            .unwrap();
        uploader.ensure_uploaded(content, expected).await.unwrap();

        // Second call saw the existence check succeed and never uploaded.
        assert_eq!(store.upload_calls.load(Ordering::Relaxed), 1);
        assert_eq!(store.exists_calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn mismatched_content_is_fatal() {
        let store = Arc::new(CountingStore::default());
        let uploader = AttachmentUploader::new(store.clone());

        let content = Bytes::from_static(b"actual content");
        let expected = Digest::of(b"agreed content");

        let err = uploader.ensure_uploaded(content, expected).await.unwrap_err();
        match err {
            ExchangeError::DigestMismatch { expected: e, actual } => {
                assert_eq!(e, expected);
                assert_eq!(actual, Digest::of(b"actual content"));
            }
            other => panic!("expected DigestMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_surfaces_without_retry() {
        let uploader = AttachmentUploader::new(Arc::new(DownStore));
        let err = uploader
            .ensure_uploaded(Bytes::from_static(b"x"), Digest::of(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::StoreUnavailable(_)));
    }
}
