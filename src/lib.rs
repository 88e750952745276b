// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! certblob-kernel: verification of certified reads from an untrusted blob store.
//!
//! Everything here is pure and synchronous: decode, hash, compare. Transports
//! and the storage façade live in `certblob-node`.

pub mod certificate;
pub mod content;
pub mod error;
pub mod hashtree;
pub mod inclusion;
pub mod types;

pub use certificate::{CertificateVerifier, Certifier, RootPublicKey};
pub use error::{VerifyError, VerifyResult};
pub use hashtree::HashTree;
pub use inclusion::{check_content_binding, check_inclusion, verify_certified_read};
pub use types::{CertifiedBlock, Digest, StoreId};

#[cfg(test)]
pub mod tests;
