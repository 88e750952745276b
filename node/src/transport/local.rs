// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-process store that certifies its own contents.
//!
//! Blobs live in memory; each fetch builds a fresh tree over every stored
//! blob, prunes it down to the requested entry and signs the root with the
//! transport's own key. Meant for tests and local development: its trust
//! anchor is whatever `public_key` returns.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use certblob_kernel::content::content_label;
use certblob_kernel::hashtree;
use certblob_kernel::{CertificateVerifier, CertifiedBlock, Certifier, Digest, HashTree, RootPublicKey, StoreId};
use tokio::sync::RwLock;

use super::Transport;
use crate::errors::StorageError;
use crate::service::StorageReceipt;

pub struct LocalTransport {
    store: StoreId,
    certifier: Certifier,
    blobs: RwLock<BTreeMap<Digest, Vec<u8>>>,
}

impl LocalTransport {
    pub fn from_seed(store: StoreId, seed: [u8; 32]) -> Self {
        Self {
            store,
            certifier: Certifier::from_seed(seed),
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Fresh random signing key.
    pub fn generate(store: StoreId) -> Self {
        Self::from_seed(store, rand::random())
    }

    pub fn public_key(&self) -> RootPublicKey {
        self.certifier.public_key()
    }

    pub fn verifier(&self) -> CertificateVerifier {
        CertificateVerifier::new(self.public_key())
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn state_tree(blobs: &BTreeMap<Digest, Vec<u8>>) -> HashTree {
        // Hex labels sort the same way as the digests they encode.
        let entries: Vec<(Vec<u8>, &[u8])> = blobs
            .keys()
            .map(|hash| (content_label(hash), hash.as_ref()))
            .collect();
        HashTree::from_sorted_entries(&entries)
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn encoding_error(e: serde_cbor::Error) -> StorageError {
    StorageError::Transport(format!("local store encoding failed: {}", e))
}

#[async_trait]
impl Transport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, hash: &Digest) -> Result<CertifiedBlock, StorageError> {
        let blobs = self.blobs.read().await;
        let data = blobs.get(hash).ok_or(StorageError::NotFound(*hash))?.clone();

        let tree = Self::state_tree(&blobs);
        let root = tree.reconstruct();
        let witness = hashtree::encode(&tree.witness_for(&content_label(hash))).map_err(encoding_error)?;
        let certificate = self
            .certifier
            .certify_store(&self.store, root.as_ref(), now_nanos())
            .encode()
            .map_err(encoding_error)?;

        Ok(CertifiedBlock { certificate, data, witness })
    }

    async fn store(
        &self,
        hash: &Digest,
        data: &[u8],
        _expiration_hint: u64,
    ) -> Result<StorageReceipt, StorageError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(*hash, data.to_vec());
        let root_hash = Self::state_tree(&blobs).reconstruct();
        Ok(StorageReceipt { leaf_hash: *hash, root_hash })
    }
}
