// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The certified storage client.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use certblob_kernel::content::content_hash;
use certblob_kernel::{verify_certified_read, CertificateVerifier, Digest, StoreId, VerifyError};

use crate::config::{BackendKind, StorageConfig};
use crate::errors::StorageError;
use crate::service::{ExpirationPolicy, StorageReceipt, StorageService};
use crate::transport::{LocalTransport, RestTransport, RpcTransport, Transport};

pub const HEALTH_PROBE: &[u8] = b"Test-Data";

/// [`StorageService`] over any [`Transport`]. Every fetched blob is checked
/// against the certificate and witness that came with it before it is
/// returned.
pub struct CertifiedStorage<T> {
    transport: T,
    store: StoreId,
    verifier: Arc<CertificateVerifier>,
    request_timeout: Duration,
    closed: AtomicBool,
}

impl<T: Transport> CertifiedStorage<T> {
    pub fn new(transport: T, store: StoreId, verifier: CertificateVerifier) -> Self {
        Self {
            transport,
            store,
            verifier: Arc::new(verifier),
            request_timeout: Duration::from_secs(30),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &StoreId {
        &self.store
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    /// Bounds a network call by the request timeout. Dropping the returned
    /// future cancels the call.
    async fn bounded<R>(
        &self,
        call: impl Future<Output = Result<R, StorageError>>,
    ) -> Result<R, StorageError> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| StorageError::Timeout(self.request_timeout))?
    }
}

#[async_trait]
impl<T: Transport> StorageService for CertifiedStorage<T> {
    async fn put(&self, data: &[u8], expiration_hint: u64) -> Result<StorageReceipt, StorageError> {
        self.ensure_open()?;
        let hash = content_hash(data);
        tracing::debug!(transport = self.transport.name(), "put {} ({} bytes)", hash, data.len());

        let receipt = self
            .bounded(self.transport.store(&hash, data, expiration_hint))
            .await?;
        metrics::increment_counter!("certblob_puts_total", "transport" => self.transport.name());
        Ok(receipt)
    }

    async fn get_by_hash(&self, hash: &Digest) -> Result<Vec<u8>, StorageError> {
        self.ensure_open()?;
        if hash.is_zero() {
            return Err(VerifyError::InvalidHash(format!("0x{}", hash.to_hex())).into());
        }

        tracing::debug!(transport = self.transport.name(), "fetch {}", hash);
        let block = self.bounded(self.transport.fetch(hash)).await?;

        match verify_certified_read(hash, &block, &self.store, &self.verifier) {
            Ok(()) => {
                metrics::increment_counter!("certblob_reads_verified_total", "transport" => self.transport.name());
                Ok(block.data)
            }
            Err(e) => {
                tracing::warn!(transport = self.transport.name(), "rejected read of {}: {}", hash, e);
                metrics::increment_counter!("certblob_read_failures_total", "transport" => self.transport.name());
                Err(e.into())
            }
        }
    }

    async fn sync(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(transport = self.transport.name(), "storage client closed");
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.bounded(self.transport.ping()).await?;

        let expiry = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + 60;
        self.put(HEALTH_PROBE, expiry).await?;
        let read = self.get_by_hash(&content_hash(HEALTH_PROBE)).await?;
        if read != HEALTH_PROBE {
            return Err(StorageError::HealthCheck("invalid GetByHash result".to_string()));
        }
        Ok(())
    }

    async fn expiration_policy(&self) -> Result<ExpirationPolicy, StorageError> {
        self.bounded(self.transport.expiration_policy()).await
    }
}

/// Builds the storage client `config` asks for.
///
/// The trust anchor is resolved here, once: the configured key if there is
/// one, otherwise (when allowed) the key the network reports. The local
/// backend certifies with its own key and trusts only that.
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn StorageService>, StorageError> {
    if !config.enable {
        return Err(StorageError::Config("storage backend is disabled".to_string()));
    }
    let store = config.store_id()?;

    let service: Arc<dyn StorageService> = match config.backend {
        BackendKind::Local => {
            let transport = LocalTransport::generate(store.clone());
            let verifier = restrict_age(transport.verifier(), config);
            Arc::new(
                CertifiedStorage::new(transport, store, verifier)
                    .with_request_timeout(config.request_timeout),
            )
        }
        BackendKind::Rpc => {
            let transport = RpcTransport::new(&config.network, store.clone())?;
            let verifier = restrict_age(resolve_verifier(config).await?, config);
            Arc::new(
                CertifiedStorage::new(transport, store, verifier)
                    .with_request_timeout(config.request_timeout),
            )
        }
        BackendKind::Rest => {
            let url = config.rest_url.as_deref().ok_or_else(|| {
                StorageError::Config("rest backend needs a gateway url".to_string())
            })?;
            let transport = RestTransport::from_url(url)?;
            let verifier = restrict_age(resolve_verifier(config).await?, config);
            Arc::new(
                CertifiedStorage::new(transport, store, verifier)
                    .with_request_timeout(config.request_timeout),
            )
        }
    };

    tracing::info!(
        "opened {:?} storage for store {}",
        config.backend,
        config.canister
    );
    Ok(service)
}

async fn resolve_verifier(config: &StorageConfig) -> Result<CertificateVerifier, StorageError> {
    if let Some(key) = config.configured_root_key()? {
        return Ok(CertificateVerifier::new(key));
    }
    if !config.fetch_root_key {
        return Err(StorageError::Config(
            "no root key configured and fetching it is disabled".to_string(),
        ));
    }

    let status = RpcTransport::new(&config.network, config.store_id()?)?;
    let key = tokio::time::timeout(config.request_timeout, status.fetch_root_key())
        .await
        .map_err(|_| StorageError::Timeout(config.request_timeout))??;
    tracing::warn!("using root key fetched from {}: {}", status.network(), key.to_hex());
    Ok(CertificateVerifier::new(key))
}

fn restrict_age(verifier: CertificateVerifier, config: &StorageConfig) -> CertificateVerifier {
    match config.max_certificate_age {
        Some(max_age) => verifier.with_max_age(max_age),
        None => verifier,
    }
}
