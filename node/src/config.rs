// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::time::Duration;

use certblob_kernel::{RootPublicKey, StoreId};
use clap::{Args, ValueEnum};

use crate::errors::StorageError;

/// Which transport the storage client talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Direct RPC to a replica.
    Rpc,
    /// HTTP gateway.
    Rest,
    /// In-process, self-certifying store.
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub enable: bool,
    pub backend: BackendKind,
    /// Replica endpoint; also where the root key is fetched from.
    pub network: String,
    /// Gateway endpoint for the REST backend.
    pub rest_url: Option<String>,
    /// Textual store (canister) id.
    pub canister: String,
    /// Hex root key. Takes precedence over fetching.
    pub root_key: Option<String>,
    pub fetch_root_key: bool,
    pub request_timeout: Duration,
    pub max_certificate_age: Option<Duration>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enable: true,
            backend: BackendKind::Rpc,
            network: "http://127.0.0.1:4943/".to_string(),
            rest_url: None,
            canister: "bkyz2-fmaaa-aaaaa-qaaaq-cai".to_string(),
            root_key: None,
            fetch_root_key: false,
            request_timeout: Duration::from_secs(30),
            max_certificate_age: None,
        }
    }
}

impl StorageConfig {
    pub fn store_id(&self) -> Result<StoreId, StorageError> {
        self.canister
            .parse()
            .map_err(|e| StorageError::Config(format!("canister {:?}: {}", self.canister, e)))
    }

    pub fn configured_root_key(&self) -> Result<Option<RootPublicKey>, StorageError> {
        self.root_key
            .as_deref()
            .map(|hex| {
                RootPublicKey::from_hex(hex)
                    .map_err(|e| StorageError::Config(format!("root key: {}", e)))
            })
            .transpose()
    }
}

/// Command-line / environment form of [`StorageConfig`].
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Enable the certified store as a storage backend
    #[arg(long = "storage.enable", env = "CERTBLOB_ENABLE", default_value_t = true, action = clap::ArgAction::Set)]
    pub enable: bool,

    /// Transport to reach the store through
    #[arg(long = "storage.backend", env = "CERTBLOB_BACKEND", value_enum, default_value_t = BackendKind::Rpc)]
    pub backend: BackendKind,

    /// URL of the replica network
    #[arg(long = "storage.network", env = "CERTBLOB_NETWORK", default_value = "http://127.0.0.1:4943/")]
    pub network: String,

    /// URL of the REST gateway (rest backend only)
    #[arg(long = "storage.rest-url", env = "CERTBLOB_REST_URL")]
    pub rest_url: Option<String>,

    /// Readable canister id of the store
    #[arg(long = "storage.canister", env = "CERTBLOB_CANISTER", default_value = "bkyz2-fmaaa-aaaaa-qaaaq-cai")]
    pub canister: String,

    /// Hex-encoded root public key
    #[arg(long = "storage.root-key", env = "CERTBLOB_ROOT_KEY")]
    pub root_key: Option<String>,

    /// Fetch the root key from the network's status endpoint when none is configured
    #[arg(long = "storage.fetch-root-key", env = "CERTBLOB_FETCH_ROOT_KEY")]
    pub fetch_root_key: bool,

    /// Network request timeout in seconds
    #[arg(long = "storage.request-timeout", env = "CERTBLOB_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Reject certificates older than this many seconds
    #[arg(long = "storage.max-certificate-age", env = "CERTBLOB_MAX_CERTIFICATE_AGE")]
    pub max_certificate_age_secs: Option<u64>,
}

impl From<StorageArgs> for StorageConfig {
    fn from(args: StorageArgs) -> Self {
        Self {
            enable: args.enable,
            backend: args.backend,
            network: args.network,
            rest_url: args.rest_url,
            canister: args.canister,
            root_key: args.root_key,
            fetch_root_key: args.fetch_root_key,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            max_certificate_age: args.max_certificate_age_secs.map(Duration::from_secs),
        }
    }
}
