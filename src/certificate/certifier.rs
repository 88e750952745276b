// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The signing side of certification.
//!
//! Used by the in-process store backend and by test fixtures to issue
//! certificates the verifier accepts.

use ed25519_dalek::{Signer, SigningKey};
use serde_cbor::Value;

use super::{encode_leb128, signed_message_for, Certificate, Delegation, RootPublicKey};
use crate::hashtree::HashTree;
use crate::types::StoreId;

pub struct Certifier {
    signing_key: SigningKey,
}

impl Certifier {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(&seed) }
    }

    pub fn public_key(&self) -> RootPublicKey {
        RootPublicKey::from_bytes(self.signing_key.verifying_key().to_bytes().to_vec())
    }

    /// Signs an arbitrary state tree.
    pub fn certify(&self, tree: HashTree) -> Certificate {
        let signature = self.signing_key.sign(&signed_message_for(&tree));
        Certificate {
            tree,
            signature: signature.to_bytes().to_vec(),
            delegation: None,
        }
    }

    /// Certifies `certified_data` for one store at `time_nanos`.
    pub fn certify_store(&self, store: &StoreId, certified_data: &[u8], time_nanos: u64) -> Certificate {
        self.certify(Self::store_state_tree(store, certified_data, time_nanos))
    }

    /// As `certify_store`, signed under a delegation issued by the root.
    pub fn certify_store_delegated(
        &self,
        store: &StoreId,
        certified_data: &[u8],
        time_nanos: u64,
        delegation: Delegation,
    ) -> Certificate {
        let mut cert = self.certify_store(store, certified_data, time_nanos);
        cert.delegation = Some(delegation);
        cert
    }

    /// Issues a delegation handing `ranges` (inclusive) to `subnet_key`.
    pub fn delegate(
        &self,
        subnet_id: &[u8],
        subnet_key: &RootPublicKey,
        ranges: &[(StoreId, StoreId)],
        time_nanos: u64,
    ) -> Result<Delegation, serde_cbor::Error> {
        let encoded_ranges = serde_cbor::to_vec(&Value::Array(
            ranges
                .iter()
                .map(|(low, high)| {
                    Value::Array(vec![
                        Value::Bytes(low.as_bytes().to_vec()),
                        Value::Bytes(high.as_bytes().to_vec()),
                    ])
                })
                .collect(),
        ))?;

        let subnet = HashTree::fork(
            HashTree::labeled("canister_ranges", HashTree::leaf(encoded_ranges)),
            HashTree::labeled("public_key", HashTree::leaf(subnet_key.as_bytes())),
        );
        let tree = HashTree::fork(
            HashTree::labeled("subnet", HashTree::labeled(subnet_id, subnet)),
            HashTree::labeled("time", HashTree::leaf(encode_leb128(time_nanos))),
        );

        Ok(Delegation {
            subnet_id: subnet_id.to_vec(),
            certificate: self.certify(tree).encode()?,
        })
    }

    /// `/canister/<store>/certified_data` and `/time`, labels in sorted order.
    pub fn store_state_tree(store: &StoreId, certified_data: &[u8], time_nanos: u64) -> HashTree {
        HashTree::fork(
            HashTree::labeled(
                "canister",
                HashTree::labeled(
                    store.as_bytes(),
                    HashTree::labeled("certified_data", HashTree::leaf(certified_data)),
                ),
            ),
            HashTree::labeled("time", HashTree::leaf(encode_leb128(time_nanos))),
        )
    }
}
