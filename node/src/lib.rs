// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod client;
pub mod config;
pub mod errors;
pub mod service;
pub mod telemetry;
pub mod transport;

pub use client::{open_storage, CertifiedStorage};
pub use config::{BackendKind, StorageArgs, StorageConfig};
pub use errors::StorageError;
pub use service::{ExpirationPolicy, StorageReceipt, StorageService};
