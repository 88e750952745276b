// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_cbor::Value;

use super::{decode_leb128, Certificate, Delegation, Ed25519Scheme, RootPublicKey, SignatureScheme};
use crate::error::{VerifyError, VerifyResult};
use crate::hashtree::{display_path, LookupResult};
use crate::types::{Digest, StoreId};

/// Checks certificates against a fixed trust anchor and extracts the digest a
/// store has committed to.
///
/// Holds no mutable state; share it behind an `Arc` across readers.
#[derive(Clone)]
pub struct CertificateVerifier {
    root_key: RootPublicKey,
    scheme: Arc<dyn SignatureScheme>,
    max_age: Option<Duration>,
}

impl CertificateVerifier {
    pub fn new(root_key: RootPublicKey) -> Self {
        Self::with_scheme(root_key, Arc::new(Ed25519Scheme))
    }

    pub fn with_scheme(root_key: RootPublicKey, scheme: Arc<dyn SignatureScheme>) -> Self {
        Self { root_key, scheme, max_age: None }
    }

    /// Rejects certificates whose `/time` is older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn root_key(&self) -> &RootPublicKey {
        &self.root_key
    }

    /// Decodes and verifies `certificate`, returning the root digest committed
    /// for `store` under `/canister/<store>/certified_data`.
    pub fn verify(&self, certificate: &[u8], store: &StoreId) -> VerifyResult<Digest> {
        let cert = Certificate::decode(certificate)?;
        self.verify_decoded(&cert, store)
    }

    pub fn verify_decoded(&self, cert: &Certificate, store: &StoreId) -> VerifyResult<Digest> {
        let signing_key = match &cert.delegation {
            Some(delegation) => self.delegated_key(delegation, store)?,
            None => self.root_key.as_bytes().to_vec(),
        };
        self.check_signature(cert, &signing_key)?;
        self.check_freshness(cert)?;

        let path: [&[u8]; 3] = [b"canister", store.as_bytes(), b"certified_data"];
        match cert.lookup(&path) {
            LookupResult::Found(data) => Ok(Digest::from_prefix(data)),
            _ => Err(VerifyError::PathNotFound { path: display_path(&path) }),
        }
    }

    fn check_signature(&self, cert: &Certificate, public_key: &[u8]) -> VerifyResult<()> {
        self.scheme
            .verify(public_key, &cert.signed_message(), &cert.signature)
            .map_err(VerifyError::CertificateSignatureInvalid)
    }

    /// Verifies the delegation against the root key and returns the subnet
    /// key it vouches for, provided `store` falls inside its ranges.
    fn delegated_key(&self, delegation: &Delegation, store: &StoreId) -> VerifyResult<Vec<u8>> {
        let inner = Certificate::decode(&delegation.certificate)?;
        if inner.delegation.is_some() {
            return Err(VerifyError::MalformedCertificate(
                "delegation certificate carries its own delegation".to_string(),
            ));
        }
        self.check_signature(&inner, self.root_key.as_bytes())?;

        let subnet = delegation.subnet_id.as_slice();
        let key_path: [&[u8]; 3] = [b"subnet", subnet, b"public_key"];
        let key = match inner.lookup(&key_path) {
            LookupResult::Found(key) => key.to_vec(),
            _ => return Err(VerifyError::PathNotFound { path: display_path(&key_path) }),
        };

        let ranges_path: [&[u8]; 3] = [b"subnet", subnet, b"canister_ranges"];
        let ranges = match inner.lookup(&ranges_path) {
            LookupResult::Found(raw) => decode_ranges(raw)?,
            _ => return Err(VerifyError::PathNotFound { path: display_path(&ranges_path) }),
        };
        let id = store.as_bytes();
        if !ranges.iter().any(|(low, high)| low.as_slice() <= id && id <= high.as_slice()) {
            return Err(VerifyError::StoreNotDelegated { store: store.to_text() });
        }

        Ok(key)
    }

    fn check_freshness(&self, cert: &Certificate) -> VerifyResult<()> {
        let Some(max_age) = self.max_age else {
            return Ok(());
        };
        let nanos = match cert.lookup(&[b"time"]) {
            LookupResult::Found(raw) => decode_leb128(raw).ok_or_else(|| {
                VerifyError::MalformedCertificate("time is not LEB128".to_string())
            })?,
            _ => {
                return Err(VerifyError::MalformedCertificate(
                    "certificate has no time".to_string(),
                ))
            }
        };

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let age = now.saturating_sub(Duration::from_nanos(nanos));
        if age > max_age {
            return Err(VerifyError::StaleCertificate {
                age_secs: age.as_secs(),
                max_age_secs: max_age.as_secs(),
            });
        }
        Ok(())
    }
}

fn decode_ranges(raw: &[u8]) -> VerifyResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let malformed = |msg: &str| VerifyError::MalformedCertificate(format!("canister_ranges: {}", msg));
    let value: Value = serde_cbor::from_slice(raw).map_err(|e| malformed(&e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(malformed("not an array"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Array(pair) => match pair.as_slice() {
                [Value::Bytes(low), Value::Bytes(high)] => Ok((low.clone(), high.clone())),
                _ => Err(malformed("range is not a pair of byte strings")),
            },
            _ => Err(malformed("range is not an array")),
        })
        .collect()
}
