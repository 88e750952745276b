// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The contract every storage backend offers upstream callers.

use core::fmt;
use core::str::FromStr;

use async_trait::async_trait;
use certblob_kernel::Digest;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// What the store reports back after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageReceipt {
    /// Content address the blob was stored under.
    pub leaf_hash: Digest,
    /// The store's committed root after the write.
    pub root_hash: Digest,
}

/// How long a backend keeps what it stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    KeepForever,
    DiscardAfterArchiveTimeout,
    DiscardAfterDataTimeout,
    MixedTimeout,
}

impl ExpirationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationPolicy::KeepForever => "KeepForever",
            ExpirationPolicy::DiscardAfterArchiveTimeout => "DiscardAfterArchiveTimeout",
            ExpirationPolicy::DiscardAfterDataTimeout => "DiscardAfterDataTimeout",
            ExpirationPolicy::MixedTimeout => "MixedTimeout",
        }
    }
}

impl FromStr for ExpirationPolicy {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KeepForever" => Ok(ExpirationPolicy::KeepForever),
            "DiscardAfterArchiveTimeout" => Ok(ExpirationPolicy::DiscardAfterArchiveTimeout),
            "DiscardAfterDataTimeout" => Ok(ExpirationPolicy::DiscardAfterDataTimeout),
            "MixedTimeout" => Ok(ExpirationPolicy::MixedTimeout),
            other => Err(StorageError::Transport(format!(
                "invalid expiration policy {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-agnostic blob storage.
///
/// `get_by_hash` only ever returns bytes that passed the full certified-read
/// check; every other outcome is an error.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stores `data`. `expiration_hint` is a Unix timestamp (seconds) the
    /// backend may use; backends that keep data forever ignore it.
    async fn put(&self, data: &[u8], expiration_hint: u64) -> Result<StorageReceipt, StorageError>;

    async fn get_by_hash(&self, hash: &Digest) -> Result<Vec<u8>, StorageError>;

    async fn sync(&self) -> Result<(), StorageError>;

    /// Idempotent.
    async fn close(&self) -> Result<(), StorageError>;

    /// Writes a probe blob and reads it back through the verified path.
    async fn health_check(&self) -> Result<(), StorageError>;

    async fn expiration_policy(&self) -> Result<ExpirationPolicy, StorageError>;
}
