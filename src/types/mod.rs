// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Value types shared by the verifier and the storage client.

pub mod block;
pub mod digest;
pub mod store_id;

pub use block::CertifiedBlock;
pub use digest::Digest;
pub use store_id::{ParseStoreIdError, StoreId};
