use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::abi::{self, Address, ContractFunction};
use super::signer::{LegacyTransaction, LocalSigner, Signer};
use super::{LedgerClient, TransactionReceipt};
use crate::api;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

/// Ethereum JSON-RPC ledger client.
///
/// Locally signed writes go out through `eth_sendRawTransaction`. A node-managed
/// signer falls back to `eth_sendTransaction`. Every request is bounded by the
/// client timeout.
pub struct JsonRpcLedger {
    client: Client,
    rpc_url: String,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    pub fn new(
        rpc_url: impl Into<String>,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: api::http_client(request_timeout)?,
            rpc_url: rpc_url.into(),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let payload = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{} request to {} failed", method, self.rpc_url))?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("RPC error: {} - {}", status, error_text);
            return Err(anyhow!("{} failed: {} - {}", method, status, error_text));
        }

        let rpc_response: RpcResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        if let Some(error) = rpc_response.error {
            return Err(anyhow!("{} rejected ({}): {}", method, error.code, error.message));
        }

        Ok(rpc_response.result)
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u64> {
        let raw: String = self
            .request(method, params)
            .await?
            .ok_or_else(|| anyhow!("{} returned no result", method))?;
        abi::parse_quantity(&raw)
    }

    async fn send_via_node(
        &self,
        contract: &Address,
        account: &Address,
        data: Vec<u8>,
    ) -> Result<String> {
        let tx = json!({
            "from": account.as_str(),
            "to": contract.as_str(),
            "data": abi::to_prefixed_hex(&data),
        });

        self.request("eth_sendTransaction", json!([tx]))
            .await?
            .ok_or_else(|| anyhow!("eth_sendTransaction returned no transaction hash"))
    }

    async fn send_signed(
        &self,
        contract: &Address,
        signer: &LocalSigner,
        data: Vec<u8>,
    ) -> Result<String> {
        let from = signer.address().as_str();
        let call = json!({
            "from": from,
            "to": contract.as_str(),
            "data": abi::to_prefixed_hex(&data),
        });

        let (nonce, gas_price, gas_limit, chain_id) = tokio::try_join!(
            self.quantity("eth_getTransactionCount", json!([from, "pending"])),
            self.quantity("eth_gasPrice", json!([])),
            self.quantity("eth_estimateGas", json!([call])),
            self.quantity("eth_chainId", json!([])),
        )?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: contract.clone(),
            value: 0,
            data,
            chain_id,
        };
        let raw = signer.sign_transaction(&tx)?;
        tracing::debug!(
            "Signed transaction from {} (nonce {}, gas {} at {} wei, chain {})",
            from,
            nonce,
            gas_limit,
            gas_price,
            chain_id
        );

        self.request("eth_sendRawTransaction", json!([abi::to_prefixed_hex(&raw)]))
            .await?
            .ok_or_else(|| anyhow!("eth_sendRawTransaction returned no transaction hash"))
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>> {
        let raw: Option<RawReceipt> = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        // Some nodes return a receipt before the block number is assigned.
        let Some(raw) = raw else { return Ok(None) };
        let Some(block) = raw.block_number else { return Ok(None) };

        Ok(Some(TransactionReceipt {
            transaction_hash: raw.transaction_hash,
            block_number: abi::parse_quantity(&block)?,
            succeeded: raw.status.as_deref() != Some("0x0"),
        }))
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn read(&self, contract: &Address, getter: ContractFunction) -> Result<u128> {
        let call = json!({ "to": contract.as_str(), "data": getter.encode_call() });
        let data: String = self
            .request("eth_call", json!([call, "latest"]))
            .await?
            .ok_or_else(|| anyhow!("eth_call to {} returned no data", getter))?;

        abi::decode_word(&data).with_context(|| format!("Failed to decode {} result", getter))
    }

    async fn submit(
        &self,
        contract: &Address,
        signer: &Signer,
        setter: ContractFunction,
        value: u128,
    ) -> Result<String> {
        let data = setter.call_data_with(value);

        match signer {
            Signer::Local(local) => self.send_signed(contract, local, data).await,
            Signer::Node(account) => self.send_via_node(contract, account, data).await,
        }
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            interval.tick().await;

            match self.receipt(tx_hash).await? {
                Some(receipt) => return Ok(receipt),
                None => tracing::debug!("Transaction {} still pending", tx_hash),
            }
        }
    }
}
