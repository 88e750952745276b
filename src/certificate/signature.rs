// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use core::fmt;

use ed25519_dalek::{Signature, VerifyingKey};

/// SubjectPublicKeyInfo header for a DER-wrapped Ed25519 key.
const ED25519_DER_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// The signature primitive certificates are checked with.
///
/// Errors are returned as text; the verifier maps every failure to
/// `CertificateSignatureInvalid`.
pub trait SignatureScheme: Send + Sync {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), String>;
}

/// Ed25519 with strict verification. Keys may be raw (32 bytes) or DER.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    pub fn parse_key(public_key: &[u8]) -> Result<VerifyingKey, String> {
        let raw = public_key
            .strip_prefix(&ED25519_DER_PREFIX[..])
            .unwrap_or(public_key);
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| format!("public key is {} bytes, expected 32", raw.len()))?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| e.to_string())
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), String> {
        let key = Self::parse_key(public_key)?;
        let signature = Signature::from_slice(signature).map_err(|e| e.to_string())?;
        key.verify_strict(message, &signature)
            .map_err(|_| "signature does not match root key".to_string())
    }
}

/// The trust anchor. Loaded once (configuration or a status fetch) and then
/// only ever read.
#[derive(Clone, PartialEq, Eq)]
pub struct RootPublicKey(Vec<u8>);

impl RootPublicKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RootPublicKey(bytes.into())
    }

    pub fn from_hex(text: &str) -> Result<Self, hex::FromHexError> {
        let trimmed = text.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex::decode(trimmed).map(RootPublicKey)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for RootPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootPublicKey({})", self.to_hex())
    }
}
