// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use certblob_kernel::content::content_hash;
use certblob_kernel::{CertifiedBlock, Digest, StoreId, VerifyError};
use certblob_node::client::{CertifiedStorage, HEALTH_PROBE};
use certblob_node::service::{ExpirationPolicy, StorageReceipt, StorageService};
use certblob_node::transport::{LocalTransport, Transport};
use certblob_node::StorageError;

fn store() -> StoreId {
    "rrkah-fqaaa-aaaaa-aaaaq-cai".parse().unwrap()
}

fn local_storage(seed: u8) -> CertifiedStorage<LocalTransport> {
    let transport = LocalTransport::from_seed(store(), [seed; 32]);
    let verifier = transport.verifier();
    CertifiedStorage::new(transport, store(), verifier)
}

/// Passes calls through to a local store, letting the test rewrite fetched
/// blocks and count network round trips.
struct Tampered<F> {
    inner: LocalTransport,
    tamper: F,
    fetches: AtomicUsize,
}

impl<F> Tampered<F>
where
    F: Fn(&mut CertifiedBlock) + Send + Sync,
{
    fn new(tamper: F) -> Self {
        Self {
            inner: LocalTransport::from_seed(store(), [1; 32]),
            tamper,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<F> Transport for Tampered<F>
where
    F: Fn(&mut CertifiedBlock) + Send + Sync,
{
    fn name(&self) -> &'static str {
        "tampered"
    }

    async fn fetch(&self, hash: &Digest) -> Result<CertifiedBlock, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut block = self.inner.fetch(hash).await?;
        (self.tamper)(&mut block);
        Ok(block)
    }

    async fn store(&self, hash: &Digest, data: &[u8], hint: u64) -> Result<StorageReceipt, StorageError> {
        self.inner.store(hash, data, hint).await
    }
}

fn tampered_storage<F>(tamper: F) -> CertifiedStorage<Tampered<F>>
where
    F: Fn(&mut CertifiedBlock) + Send + Sync,
{
    let transport = Tampered::new(tamper);
    let verifier = transport.inner.verifier();
    CertifiedStorage::new(transport, store(), verifier)
}

/// Answers every fetch with the requested bytes but the certificate and
/// witness of a different blob.
struct Substituting {
    inner: LocalTransport,
    decoy: Digest,
    forged: Vec<u8>,
}

#[async_trait]
impl Transport for Substituting {
    fn name(&self) -> &'static str {
        "substituting"
    }

    async fn fetch(&self, _hash: &Digest) -> Result<CertifiedBlock, StorageError> {
        let mut block = self.inner.fetch(&self.decoy).await?;
        block.data = self.forged.clone();
        Ok(block)
    }

    async fn store(&self, hash: &Digest, data: &[u8], hint: u64) -> Result<StorageReceipt, StorageError> {
        self.inner.store(hash, data, hint).await
    }
}

struct Stalled;

#[async_trait]
impl Transport for Stalled {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn fetch(&self, hash: &Digest) -> Result<CertifiedBlock, StorageError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(StorageError::NotFound(*hash))
    }

    async fn store(&self, _hash: &Digest, _data: &[u8], _hint: u64) -> Result<StorageReceipt, StorageError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(StorageError::Transport("unreachable".into()))
    }
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let storage = local_storage(1);

    let receipt = storage.put(b"Test-Data", 0).await.unwrap();
    assert_eq!(receipt.leaf_hash, content_hash(b"Test-Data"));
    assert!(!receipt.root_hash.is_zero());

    let data = storage.get_by_hash(&receipt.leaf_hash).await.unwrap();
    assert_eq!(data, b"Test-Data");
}

#[tokio::test]
async fn test_get_among_many_blobs() {
    let storage = local_storage(1);
    let blobs: Vec<Vec<u8>> = (0u8..20).map(|i| vec![i; i as usize + 1]).collect();
    for blob in &blobs {
        storage.put(blob, 0).await.unwrap();
    }
    assert_eq!(storage.transport().len().await, 20);

    for blob in &blobs {
        let read = storage.get_by_hash(&content_hash(blob)).await.unwrap();
        assert_eq!(&read, blob);
    }
}

#[tokio::test]
async fn test_zero_hash_rejected_without_network() {
    let storage = tampered_storage(|_| {});
    let err = storage.get_by_hash(&Digest::ZERO).await.unwrap_err();

    assert!(matches!(err, StorageError::Verify(VerifyError::InvalidHash(_))));
    assert_eq!(storage.transport().fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_blob_is_not_found() {
    let storage = local_storage(1);
    let hash = content_hash(b"never stored");
    let err = storage.get_by_hash(&hash).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(h) if h == hash));
    assert!(!err.is_verification_failure());
}

#[tokio::test]
async fn test_truncated_witness_is_malformed() {
    let storage = tampered_storage(|block| {
        let half = block.witness.len() / 2;
        block.witness.truncate(half);
    });
    storage.put(b"Test-Data", 0).await.unwrap();

    let err = storage.get_by_hash(&content_hash(b"Test-Data")).await.unwrap_err();
    assert!(matches!(err, StorageError::Verify(VerifyError::MalformedWitness(_))));
    assert!(err.is_verification_failure());
}

#[tokio::test]
async fn test_altered_bytes_rejected() {
    let storage = tampered_storage(|block| block.data[0] ^= 0x01);
    storage.put(b"Test-Data", 0).await.unwrap();

    let err = storage.get_by_hash(&content_hash(b"Test-Data")).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Verify(VerifyError::ContentHashMismatch { .. })
    ));
}

#[tokio::test]
async fn test_rotated_root_key_rejected() {
    let transport = LocalTransport::from_seed(store(), [1; 32]);
    let stale_anchor = LocalTransport::from_seed(store(), [2; 32]).verifier();
    let storage = CertifiedStorage::new(transport, store(), stale_anchor);
    storage.put(b"Test-Data", 0).await.unwrap();

    let err = storage.get_by_hash(&content_hash(b"Test-Data")).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Verify(VerifyError::CertificateSignatureInvalid(_))
    ));
}

#[tokio::test]
async fn test_wrong_store_rejected() {
    let transport = LocalTransport::from_seed(store(), [1; 32]);
    let verifier = transport.verifier();
    let other = StoreId::from_bytes(vec![0, 0, 0, 0, 0, 0, 0, 2, 1, 1]).unwrap();
    let storage = CertifiedStorage::new(transport, other, verifier);
    storage.put(b"Test-Data", 0).await.unwrap();

    let err = storage.get_by_hash(&content_hash(b"Test-Data")).await.unwrap_err();
    assert!(matches!(err, StorageError::Verify(VerifyError::PathNotFound { .. })));
}

#[tokio::test]
async fn test_valid_proof_for_other_blob_is_not_accepted() {
    let inner = LocalTransport::from_seed(store(), [1; 32]);
    let decoy = content_hash(b"decoy");
    inner.store(&decoy, b"decoy", 0).await.unwrap();

    let forged = b"forged content".to_vec();
    let verifier = inner.verifier();
    let transport = Substituting { inner, decoy, forged: forged.clone() };
    let storage = CertifiedStorage::new(transport, store(), verifier);

    let requested = content_hash(&forged);
    let err = storage.get_by_hash(&requested).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Verify(VerifyError::ContentNotAttested(h)) if h == requested
    ));
}

#[tokio::test]
async fn test_close_is_idempotent_and_final() {
    let storage = local_storage(1);
    storage.put(b"Test-Data", 0).await.unwrap();

    storage.close().await.unwrap();
    storage.close().await.unwrap();

    assert!(matches!(storage.put(b"more", 0).await, Err(StorageError::Closed)));
    assert!(matches!(
        storage.get_by_hash(&content_hash(b"Test-Data")).await,
        Err(StorageError::Closed)
    ));
}

#[tokio::test]
async fn test_sync_and_policy() {
    let storage = local_storage(1);
    storage.sync().await.unwrap();
    assert_eq!(storage.expiration_policy().await.unwrap(), ExpirationPolicy::KeepForever);
}

#[tokio::test]
async fn test_health_check_round_trips_probe() {
    let storage = local_storage(1);
    storage.health_check().await.unwrap();

    let probe = storage.get_by_hash(&content_hash(HEALTH_PROBE)).await.unwrap();
    assert_eq!(probe, b"Test-Data");
}

#[tokio::test]
async fn test_health_check_fails_on_tampering() {
    let storage = tampered_storage(|block| block.data.push(0));
    let err = storage.health_check().await.unwrap_err();
    assert!(err.is_verification_failure());
}

#[tokio::test]
async fn test_request_timeout_bounds_calls() {
    let storage = CertifiedStorage::new(Stalled, store(), local_storage(1).transport().verifier())
        .with_request_timeout(Duration::from_millis(50));

    let hash = content_hash(b"Test-Data");
    assert!(matches!(storage.get_by_hash(&hash).await, Err(StorageError::Timeout(_))));
    assert!(matches!(storage.put(b"Test-Data", 0).await, Err(StorageError::Timeout(_))));
}
