// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Direct RPC to the store's replica endpoint.
//!
//! Requests are CBOR envelopes posted to
//! `{network}/api/v2/canister/{store}/{query|call}`:
//! ```text
//! { "content": { "request_type", "canister_id", "method_name", "arg", "ingress_expiry" } }
//! ```
//! and answered with
//! ```text
//! { "status": "replied",  "reply": { "arg": bytes } }
//! { "status": "rejected", "reject_code": uint, "reject_message": text }
//! ```
//! `fetch` takes the hex hash and replies `{certificate, data, witness}`;
//! `store` takes `[hex hash, data]` and replies `{leaf_hash, root_hash}`.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use certblob_kernel::{CertifiedBlock, Digest, RootPublicKey, StoreId};
use reqwest::{Client, Url};
use serde_cbor::Value;

use super::Transport;
use crate::errors::StorageError;
use crate::service::StorageReceipt;

const INGRESS_EXPIRY: Duration = Duration::from_secs(4 * 60);

#[derive(Debug, Clone)]
pub struct RpcTransport {
    network: Url,
    store: StoreId,
    client: Client,
}

impl RpcTransport {
    pub fn new(network: &str, store: StoreId) -> Result<Self, StorageError> {
        let mut network = Url::parse(network)
            .map_err(|e| StorageError::Config(format!("invalid network url {:?}: {}", network, e)))?;
        if !network.path().ends_with('/') {
            let path = format!("{}/", network.path());
            network.set_path(&path);
        }
        Ok(Self {
            network,
            store,
            client: Client::new(),
        })
    }

    pub fn network(&self) -> &Url {
        &self.network
    }

    /// Reads the replica's root key from `/api/v2/status`.
    ///
    /// Only meaningful against networks whose key is not already known out of
    /// band; callers should prefer a configured key.
    pub async fn fetch_root_key(&self) -> Result<RootPublicKey, StorageError> {
        let url = self.endpoint("api/v2/status")?;
        let resp = self.client.get(url).send().await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        let body = read_success(resp).await?;

        let status = decode_map(&body)?;
        match status.get(&text("root_key")) {
            Some(Value::Bytes(key)) => Ok(RootPublicKey::from_bytes(key.clone())),
            _ => Err(StorageError::Transport("status response has no root_key".into())),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        self.network
            .join(path)
            .map_err(|e| StorageError::Config(e.to_string()))
    }

    async fn invoke(&self, kind: &str, method: &str, arg: Value) -> Result<Vec<u8>, StorageError> {
        let arg = serde_cbor::to_vec(&arg).map_err(|e| StorageError::Transport(e.to_string()))?;
        let expiry = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(INGRESS_EXPIRY)
            .as_nanos() as u64;

        let content = Value::Map(BTreeMap::from([
            (text("request_type"), text(kind)),
            (text("canister_id"), Value::Bytes(self.store.as_bytes().to_vec())),
            (text("method_name"), text(method)),
            (text("arg"), Value::Bytes(arg)),
            (text("ingress_expiry"), Value::Integer(i128::from(expiry))),
        ]));
        let envelope = Value::Map(BTreeMap::from([(text("content"), content)]));
        let body = serde_cbor::to_vec(&envelope).map_err(|e| StorageError::Transport(e.to_string()))?;

        let url = self.endpoint(&format!("api/v2/canister/{}/{}", self.store, kind))?;
        tracing::debug!("rpc {} {} -> {}", kind, method, url);
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        let reply = decode_map(&read_success(resp).await?)?;

        match reply.get(&text("status")) {
            Some(Value::Text(s)) if s == "replied" => match reply.get(&text("reply")) {
                Some(Value::Map(inner)) => match inner.get(&text("arg")) {
                    Some(Value::Bytes(arg)) => Ok(arg.clone()),
                    _ => Err(StorageError::Transport("reply carries no arg".into())),
                },
                _ => Err(StorageError::Transport("replied without a reply".into())),
            },
            Some(Value::Text(s)) if s == "rejected" => {
                let code = match reply.get(&text("reject_code")) {
                    Some(Value::Integer(code)) => u64::try_from(*code).unwrap_or_default(),
                    _ => 0,
                };
                let message = match reply.get(&text("reject_message")) {
                    Some(Value::Text(msg)) => msg.clone(),
                    _ => String::new(),
                };
                Err(StorageError::Rejected {
                    method: method.to_string(),
                    code,
                    message,
                })
            }
            _ => Err(StorageError::Transport("response has no recognised status".into())),
        }
    }
}

#[async_trait]
impl Transport for RpcTransport {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn fetch(&self, hash: &Digest) -> Result<CertifiedBlock, StorageError> {
        let reply = self.invoke("query", "fetch", text(&hash.to_hex())).await?;
        let fields = decode_map(&reply)?;
        Ok(CertifiedBlock {
            certificate: bytes_field(&fields, "certificate")?,
            data: bytes_field(&fields, "data")?,
            witness: bytes_field(&fields, "witness")?,
        })
    }

    async fn store(
        &self,
        hash: &Digest,
        data: &[u8],
        _expiration_hint: u64,
    ) -> Result<StorageReceipt, StorageError> {
        let arg = Value::Array(vec![text(&hash.to_hex()), Value::Bytes(data.to_vec())]);
        let reply = self.invoke("call", "store", arg).await?;
        let fields = decode_map(&reply)?;
        Ok(StorageReceipt {
            leaf_hash: digest_field(&fields, "leaf_hash")?,
            root_hash: digest_field(&fields, "root_hash")?,
        })
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

async fn read_success(resp: reqwest::Response) -> Result<Vec<u8>, StorageError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(StorageError::Transport(format!(
            "HTTP error with status {} returned by replica",
            status
        )));
    }
    let bytes = resp.bytes().await.map_err(|e| StorageError::Transport(e.to_string()))?;
    Ok(bytes.to_vec())
}

fn decode_map(bytes: &[u8]) -> Result<BTreeMap<Value, Value>, StorageError> {
    match serde_cbor::from_slice(bytes) {
        Ok(Value::Map(map)) => Ok(map),
        Ok(_) => Err(StorageError::Transport("expected a CBOR map".into())),
        Err(e) => Err(StorageError::Transport(format!("undecodable reply: {}", e))),
    }
}

fn bytes_field(map: &BTreeMap<Value, Value>, name: &str) -> Result<Vec<u8>, StorageError> {
    match map.get(&text(name)) {
        Some(Value::Bytes(bytes)) => Ok(bytes.clone()),
        _ => Err(StorageError::Transport(format!("reply field {} missing or not bytes", name))),
    }
}

fn digest_field(map: &BTreeMap<Value, Value>, name: &str) -> Result<Digest, StorageError> {
    let raw = bytes_field(map, name)?;
    Digest::from_slice(&raw)
        .ok_or_else(|| StorageError::Transport(format!("reply field {} is {} bytes", name, raw.len())))
}
