// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::fixtures::{other_store, store, SignedStore, ROOT_SEED, ROTATED_SEED};
use crate::certificate::{CertificateVerifier, Certifier};
use crate::content::{content_hash, content_label};
use crate::error::VerifyError;
use crate::hashtree::{self, HashTree};
use crate::inclusion::{check_content_binding, check_inclusion, verify_certified_read};
use crate::types::{CertifiedBlock, Digest};

const BLOBS: [&[u8]; 3] = [b"Test-Data", b"second blob", b"third blob"];

#[test]
fn test_certified_read_accepts_stored_blob() {
    let signed = SignedStore::with_blobs(&BLOBS);
    for blob in BLOBS {
        let block = signed.block_for(blob);
        verify_certified_read(&content_hash(blob), &block, &signed.store, &signed.verifier())
            .unwrap();
    }
}

#[test]
fn test_zero_hash_is_invalid() {
    let signed = SignedStore::with_blobs(&BLOBS);
    let block = signed.block_for(b"Test-Data");
    assert!(matches!(
        verify_certified_read(&Digest::ZERO, &block, &signed.store, &signed.verifier()),
        Err(VerifyError::InvalidHash(_))
    ));
}

#[test]
fn test_content_mismatch_precedes_certification() {
    let signed = SignedStore::with_blobs(&BLOBS);
    // Certificate and witness are garbage; the content check must fire first.
    let block = CertifiedBlock {
        certificate: vec![0xff],
        data: b"substituted".to_vec(),
        witness: vec![0xff],
    };
    let err = verify_certified_read(&content_hash(b"Test-Data"), &block, &signed.store, &signed.verifier())
        .unwrap_err();
    assert_eq!(
        err,
        VerifyError::ContentHashMismatch {
            requested: content_hash(b"Test-Data"),
            actual: content_hash(b"substituted"),
        }
    );
}

#[test]
fn test_root_mismatch_carries_both_digests() {
    let signed = SignedStore::with_blobs(&BLOBS);
    let mut newer = SignedStore::with_blobs(&BLOBS);
    newer.insert(b"fourth blob");

    // Witness from the newer state, certificate from the older one.
    let certificate = signed.certificate();
    let witness = newer.witness(b"Test-Data");
    let err = check_inclusion(&certificate, &witness, &signed.store, &signed.verifier()).unwrap_err();
    assert_eq!(
        err,
        VerifyError::RootMismatch {
            expected: signed.tree().reconstruct(),
            actual: newer.tree().reconstruct(),
        }
    );
}

#[test]
fn test_unrelated_bytes_with_valid_proof_are_rejected() {
    // The adversary holds a genuine certificate and witness for "Test-Data"
    // and pairs them with bytes of its own choosing, requested by their hash.
    let signed = SignedStore::with_blobs(&BLOBS);
    let genuine = signed.block_for(b"Test-Data");
    let forged = CertifiedBlock {
        data: b"attacker bytes".to_vec(),
        ..genuine.clone()
    };

    // The pair alone verifies...
    check_inclusion(&genuine.certificate, &genuine.witness, &signed.store, &signed.verifier())
        .unwrap();
    // ...but it does not attest the forged blob.
    let requested = content_hash(b"attacker bytes");
    assert_eq!(
        verify_certified_read(&requested, &forged, &signed.store, &signed.verifier()),
        Err(VerifyError::ContentNotAttested(requested))
    );
}

#[test]
fn test_binding_leaf_must_hold_the_hash() {
    let hash = content_hash(b"Test-Data");
    let label = content_label(&hash);
    let tree = HashTree::from_sorted_entries(&[(label.as_slice(), b"something else".as_slice())]);
    let certifier = Certifier::from_seed(ROOT_SEED);
    let block = CertifiedBlock {
        certificate: certifier
            .certify_store(&store(), tree.reconstruct().as_ref(), 0)
            .encode()
            .unwrap(),
        data: b"Test-Data".to_vec(),
        witness: hashtree::encode(&tree).unwrap(),
    };
    let verifier = CertificateVerifier::new(certifier.public_key());

    assert_eq!(
        verify_certified_read(&hash, &block, &store(), &verifier),
        Err(VerifyError::ContentNotAttested(hash))
    );
    let honest = HashTree::from_sorted_entries(&[(label.as_slice(), hash.0.as_slice())]);
    assert_eq!(check_content_binding(&honest, &hash), Ok(()));
}

#[test]
fn test_fully_pruned_witness_does_not_attest() {
    let signed = SignedStore::with_blobs(&BLOBS);
    let opaque = HashTree::pruned(signed.tree().reconstruct());
    let block = CertifiedBlock {
        certificate: signed.certificate(),
        data: b"Test-Data".to_vec(),
        witness: hashtree::encode(&opaque).unwrap(),
    };
    assert!(matches!(
        verify_certified_read(&content_hash(b"Test-Data"), &block, &signed.store, &signed.verifier()),
        Err(VerifyError::ContentNotAttested(_))
    ));
}

#[test]
fn test_truncated_witness_fails_decode() {
    let signed = SignedStore::with_blobs(&BLOBS);
    let mut block = signed.block_for(b"Test-Data");
    let half = block.witness.len() / 2;
    block.witness.truncate(half);
    assert!(matches!(
        verify_certified_read(&content_hash(b"Test-Data"), &block, &signed.store, &signed.verifier()),
        Err(VerifyError::MalformedWitness(_))
    ));
}

#[test]
fn test_rotated_root_key_fails_read() {
    let signed = SignedStore::with_blobs(&BLOBS);
    let block = signed.block_for(b"Test-Data");
    let rotated = CertificateVerifier::new(Certifier::from_seed(ROTATED_SEED).public_key());
    assert!(matches!(
        verify_certified_read(&content_hash(b"Test-Data"), &block, &signed.store, &rotated),
        Err(VerifyError::CertificateSignatureInvalid(_))
    ));
}

#[test]
fn test_wrong_store_fails_read() {
    let signed = SignedStore::with_blobs(&BLOBS);
    let block = signed.block_for(b"Test-Data");
    assert!(matches!(
        verify_certified_read(&content_hash(b"Test-Data"), &block, &other_store(), &signed.verifier()),
        Err(VerifyError::PathNotFound { .. })
    ));
}
