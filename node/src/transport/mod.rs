// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ways of reaching a store. None of these are trusted: whatever they return
//! goes through the certified-read check before a caller sees it.

pub mod local;
pub mod rest;
pub mod rpc;

pub use local::LocalTransport;
pub use rest::RestTransport;
pub use rpc::RpcTransport;

use async_trait::async_trait;
use certblob_kernel::{CertifiedBlock, Digest};

use crate::errors::StorageError;
use crate::service::{ExpirationPolicy, StorageReceipt};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs and metric labels.
    fn name(&self) -> &'static str;

    /// Fetches a blob with its certificate and witness.
    async fn fetch(&self, hash: &Digest) -> Result<CertifiedBlock, StorageError>;

    /// Submits `data` under `hash`.
    async fn store(
        &self,
        hash: &Digest,
        data: &[u8],
        expiration_hint: u64,
    ) -> Result<StorageReceipt, StorageError>;

    async fn expiration_policy(&self) -> Result<ExpirationPolicy, StorageError> {
        Ok(ExpirationPolicy::KeepForever)
    }

    /// Cheap liveness probe of the far end.
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
