// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::time::Duration;

use certblob_kernel::{Digest, VerifyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// A certified-read check failed. Never retried, never downgraded.
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("store rejected {method}: {message} (code {code})")]
    Rejected {
        method: String,
        code: u64,
        message: String,
    },
    #[error("blob {0} not found")]
    NotFound(Digest),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("health check failed: {0}")]
    HealthCheck(String),
    #[error("storage client is closed")]
    Closed,
}

impl StorageError {
    /// True for failures of the certified-read protocol itself, as opposed to
    /// plumbing errors a caller might retry.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, StorageError::Verify(_))
    }
}
