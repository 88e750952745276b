// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{Context, Result};
use certblob_kernel::hashtree::decode_witness;
use certblob_kernel::{
    verify_certified_read, CertificateVerifier, CertifiedBlock, Digest, RootPublicKey, StoreId,
};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Checks a fetched blob offline against a trusted root key.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the block envelope (JSON with base64 certificate, data, witness)
    block: PathBuf,

    /// Hex-encoded root public key
    #[arg(long)]
    root_key: String,

    /// Store (canister) id the block was read from
    #[arg(long)]
    store: String,

    /// Content hash the block was requested by (hex)
    #[arg(long)]
    hash: String,

    /// Reject certificates older than this many seconds
    #[arg(long)]
    max_age: Option<u64>,
}

#[derive(Serialize, Debug)]
struct Report {
    requested: String,
    store: String,
    /// Root committed by the certificate, when it verifies.
    committed_root: Option<String>,
    /// Root the witness reconstructs to, when it decodes.
    witness_root: Option<String>,
    verified: bool,
    error: Option<String>,
}

fn build_report(
    requested: &Digest,
    block: &CertifiedBlock,
    store: &StoreId,
    verifier: &CertificateVerifier,
) -> Report {
    let committed_root = verifier.verify(&block.certificate, store).ok().map(|d| d.to_hex());
    let witness_root = decode_witness(&block.witness)
        .ok()
        .map(|tree| tree.reconstruct().to_hex());
    let outcome = verify_certified_read(requested, block, store, verifier);

    Report {
        requested: requested.to_hex(),
        store: store.to_text(),
        committed_root,
        witness_root,
        verified: outcome.is_ok(),
        error: outcome.err().map(|e| e.to_string()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let raw = fs::read(&args.block).context("Failed to read block file")?;
    let block: CertifiedBlock =
        serde_json::from_slice(&raw).context("Failed to parse block envelope JSON")?;
    let root_key = RootPublicKey::from_hex(&args.root_key).context("Invalid root key")?;
    let store: StoreId = args.store.parse().context("Invalid store id")?;
    let requested = Digest::from_hex(&args.hash)?;

    let mut verifier = CertificateVerifier::new(root_key);
    if let Some(secs) = args.max_age {
        verifier = verifier.with_max_age(Duration::from_secs(secs));
    }

    let report = build_report(&requested, &block, &store, &verifier);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(error) = report.error {
        anyhow::bail!("verification failed: {}", error);
    }
    Ok(())
}
