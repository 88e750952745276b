//! Error types.

use thiserror::Error;

use crate::types::Digest;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The witness bytes do not decode to a hash tree.
    #[error("malformed witness: {0}")]
    MalformedWitness(String),
    /// The certificate bytes do not decode, or a required field is unusable.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),
    /// The signature does not verify under the trust anchor (or the delegated key).
    #[error("certificate signature invalid: {0}")]
    CertificateSignatureInvalid(String),
    /// The certified tree holds no value at the store's path.
    #[error("certificate has no value at path {path}")]
    PathNotFound { path: String },
    /// The witness reconstructs to a different root than the one certified.
    #[error("witness hash {actual} doesn't match known root hash {expected}")]
    RootMismatch { expected: Digest, actual: Digest },
    /// The requested hash is zero or not a well-formed digest.
    #[error("expected well formed hash, got {0}")]
    InvalidHash(String),
    /// The fetched bytes do not hash to the requested digest.
    #[error("content hash mismatch: requested {requested}, data hashes to {actual}")]
    ContentHashMismatch { requested: Digest, actual: Digest },
    /// The witness is valid but does not contain the requested blob.
    #[error("witness does not attest content hash {0}")]
    ContentNotAttested(Digest),
    #[error("certificate is {age_secs}s old, maximum allowed is {max_age_secs}s")]
    StaleCertificate { age_secs: u64, max_age_secs: u64 },
    #[error("store {store} is outside the delegated canister ranges")]
    StoreNotDelegated { store: String },
}

pub type VerifyResult<T> = core::result::Result<T, VerifyError>;
