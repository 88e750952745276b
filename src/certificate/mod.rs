// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Signed certificates over a store's state tree.
//!
//! Wire form (CBOR map):
//! ```text
//! {
//!   "tree":       hash tree (see `hashtree`),
//!   "signature":  bytes, over sep("ic-state-root") || root(tree),
//!   "delegation": optional { "subnet_id": bytes, "certificate": bytes },
//! }
//! ```

mod certifier;
mod signature;
mod verifier;

pub use certifier::Certifier;
pub use signature::{Ed25519Scheme, RootPublicKey, SignatureScheme};
pub use verifier::CertificateVerifier;

use std::collections::BTreeMap;

use serde_cbor::Value;

use crate::error::{VerifyError, VerifyResult};
use crate::hashtree::{tree_from_value, tree_to_value, HashTree, LookupResult};

const STATE_ROOT_DOMAIN: &str = "ic-state-root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub tree: HashTree,
    pub signature: Vec<u8>,
    pub delegation: Option<Delegation>,
}

/// Hands signing authority for a range of stores to a subnet key. The nested
/// certificate is signed by the root key and publishes the subnet's key and
/// ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation {
    pub subnet_id: Vec<u8>,
    pub certificate: Vec<u8>,
}

impl Certificate {
    pub fn decode(bytes: &[u8]) -> VerifyResult<Self> {
        let value: Value = serde_cbor::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let map = match value {
            Value::Map(map) => map,
            _ => return Err(malformed("certificate is not a map")),
        };

        let tree = field(&map, "tree").ok_or_else(|| malformed("missing tree"))?;
        let tree = tree_from_value(tree).map_err(|e| malformed(format!("tree: {}", e)))?;
        let signature = match field(&map, "signature") {
            Some(Value::Bytes(sig)) => sig.clone(),
            Some(_) => return Err(malformed("signature is not a byte string")),
            None => return Err(malformed("missing signature")),
        };
        let delegation = match field(&map, "delegation") {
            None | Some(Value::Null) => None,
            Some(Value::Map(inner)) => Some(Delegation::from_map(inner)?),
            Some(_) => return Err(malformed("delegation is not a map")),
        };

        Ok(Certificate { tree, signature, delegation })
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        let mut map = BTreeMap::new();
        map.insert(Value::Text("tree".into()), tree_to_value(&self.tree));
        map.insert(Value::Text("signature".into()), Value::Bytes(self.signature.clone()));
        if let Some(delegation) = &self.delegation {
            map.insert(Value::Text("delegation".into()), delegation.to_value());
        }
        serde_cbor::to_vec(&Value::Map(map))
    }

    /// The bytes the signature must cover.
    pub fn signed_message(&self) -> Vec<u8> {
        signed_message_for(&self.tree)
    }

    pub fn lookup<L: AsRef<[u8]>>(&self, path: &[L]) -> LookupResult<'_> {
        self.tree.lookup_path(path)
    }
}

impl Delegation {
    fn from_map(map: &BTreeMap<Value, Value>) -> VerifyResult<Self> {
        let subnet_id = match field(map, "subnet_id") {
            Some(Value::Bytes(id)) => id.clone(),
            _ => return Err(malformed("delegation subnet_id missing or not bytes")),
        };
        let certificate = match field(map, "certificate") {
            Some(Value::Bytes(cert)) => cert.clone(),
            _ => return Err(malformed("delegation certificate missing or not bytes")),
        };
        Ok(Delegation { subnet_id, certificate })
    }

    fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert(Value::Text("subnet_id".into()), Value::Bytes(self.subnet_id.clone()));
        map.insert(Value::Text("certificate".into()), Value::Bytes(self.certificate.clone()));
        Value::Map(map)
    }
}

pub(crate) fn signed_message_for(tree: &HashTree) -> Vec<u8> {
    let root = tree.reconstruct();
    let mut msg = Vec::with_capacity(1 + STATE_ROOT_DOMAIN.len() + 32);
    msg.push(STATE_ROOT_DOMAIN.len() as u8);
    msg.extend_from_slice(STATE_ROOT_DOMAIN.as_bytes());
    msg.extend_from_slice(root.as_ref());
    msg
}

fn field<'a>(map: &'a BTreeMap<Value, Value>, name: &str) -> Option<&'a Value> {
    map.get(&Value::Text(name.to_string()))
}

fn malformed(msg: impl Into<String>) -> VerifyError {
    VerifyError::MalformedCertificate(msg.into())
}

/// Unsigned LEB128, as used for the certified `time` leaf.
pub fn encode_leb128(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

pub fn decode_leb128(bytes: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        let shift = 7 * i as u32;
        if shift >= 64 {
            return None;
        }
        let chunk = u64::from(byte & 0x7f);
        if shift > 0 && chunk >> (64 - shift) != 0 {
            return None;
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return (i + 1 == bytes.len()).then_some(value);
        }
    }
    None
}
