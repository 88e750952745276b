// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! HTTP gateway in front of the store.
//!
//! ```text
//! GET  /get-by-hash/0x<hex>   -> {"data", "certificate", "witness"}   (base64)
//! PUT  /store                 <- {"data", "timeout"} -> {"leaf_hash", "root_hash"}   (hex)
//! GET  /expiration-policy     -> {"expiration_policy"}
//! GET  /health
//! ```

use async_trait::async_trait;
use certblob_kernel::types::block::base64_bytes;
use certblob_kernel::{CertifiedBlock, Digest};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::Transport;
use crate::errors::StorageError;
use crate::service::{ExpirationPolicy, StorageReceipt};

pub const GET_BY_HASH_PATH: &str = "/get-by-hash/";
pub const STORE_PATH: &str = "/store";
pub const EXPIRATION_POLICY_PATH: &str = "/expiration-policy";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreRequest {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub timeout: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreResponse {
    pub leaf_hash: String,
    pub root_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpirationPolicyResponse {
    pub expiration_policy: String,
}

#[derive(Debug, Clone)]
pub struct RestTransport {
    base_url: String,
    client: Client,
}

impl RestTransport {
    pub fn from_url(url: &str) -> Result<Self, StorageError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StorageError::Config(format!(
                "protocol prefix 'http://' or 'https://' must be specified for the REST gateway; got '{}'",
                url
            )));
        }
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<Response, StorageError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);
        let resp = self.client.get(&url).send().await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        check_status(resp)
    }
}

fn check_status(resp: Response) -> Result<Response, StorageError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(StorageError::Transport(format!(
            "HTTP error with status {} returned by server",
            status
        )));
    }
    Ok(resp)
}

fn parse_digest(field: &str, text: &str) -> Result<Digest, StorageError> {
    Digest::from_hex(text)
        .map_err(|_| StorageError::Transport(format!("{} is not a digest: {:?}", field, text)))
}

#[async_trait]
impl Transport for RestTransport {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch(&self, hash: &Digest) -> Result<CertifiedBlock, StorageError> {
        let resp = self.get(&format!("{}0x{}", GET_BY_HASH_PATH, hash.to_hex())).await?;
        resp.json().await.map_err(|e| StorageError::Transport(e.to_string()))
    }

    async fn store(
        &self,
        _hash: &Digest,
        data: &[u8],
        expiration_hint: u64,
    ) -> Result<StorageReceipt, StorageError> {
        let url = format!("{}{}", self.base_url, STORE_PATH);
        let request = StoreRequest { data: data.to_vec(), timeout: expiration_hint };
        let resp = self.client.put(&url).json(&request).send().await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        let receipt: StoreResponse = check_status(resp)?
            .json()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(StorageReceipt {
            leaf_hash: parse_digest("leaf_hash", &receipt.leaf_hash)?,
            root_hash: parse_digest("root_hash", &receipt.root_hash)?,
        })
    }

    async fn expiration_policy(&self) -> Result<ExpirationPolicy, StorageError> {
        let resp = self.get(EXPIRATION_POLICY_PATH).await?;
        let body: ExpirationPolicyResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        body.expiration_policy.parse()
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.get(HEALTH_PATH).await.map(|_| ())
    }
}
