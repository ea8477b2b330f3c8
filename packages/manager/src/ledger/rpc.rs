use super::{Ledger, LedgerError, Log, LogFilter, TxReceipt};
use alloy_primitives::{Bytes, U64};
use async_trait::async_trait;
use ens::{Address, B256};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

const DEFAULT_GAS: u64 = 1_000_000;

/// Ledger reached over Ethereum JSON-RPC. Transactions are sent with
/// `eth_sendTransaction`, so the node must manage the sending accounts (a
/// development node or an unlocked wallet).
pub struct RpcLedger {
    endpoint: Url,
    http: Client,
    next_id: AtomicU64,
    gas: u64,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    #[serde(default)]
    block_number: Option<U64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<U64>,
    #[serde(default)]
    status: Option<U64>,
    #[serde(default)]
    logs: Vec<RawLog>,
}

fn parse_response<T: DeserializeOwned>(response: RpcResponse) -> Result<T, LedgerError> {
    if let Some(error) = response.error {
        return Err(LedgerError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    serde_json::from_value(response.result.unwrap_or(Value::Null))
        .map_err(|e| LedgerError::malformed(e.to_string()))
}

impl RawLog {
    fn into_log(self) -> Log {
        Log {
            address: self.address,
            topics: self.topics,
            data: self.data.to_vec(),
            block_number: self.block_number.map_or(0, |n| n.to::<u64>()),
        }
    }
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TxReceipt, LedgerError> {
        // pre-byzantium receipts carry no status
        if self.status == Some(U64::ZERO) {
            return Err(LedgerError::TransactionFailed {
                tx_hash: self.transaction_hash,
            });
        }
        Ok(TxReceipt {
            transaction_hash: self.transaction_hash,
            block_number: self.block_number.map_or(0, |n| n.to::<u64>()),
            logs: self.logs.into_iter().map(RawLog::into_log).collect(),
        })
    }
}

impl RpcLedger {
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, LedgerError> {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|_| LedgerError::InvalidEndpoint(endpoint.as_ref().to_string()))?;
        Ok(RpcLedger {
            endpoint,
            http: Client::builder().timeout(Duration::from_secs(30)).build()?,
            next_id: AtomicU64::new(1),
            gas: DEFAULT_GAS,
            poll_interval: Duration::from_millis(500),
            receipt_timeout: Duration::from_secs(60),
        })
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_receipt_timeout(mut self, receipt_timeout: Duration) -> Self {
        self.receipt_timeout = receipt_timeout;
        self
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "json-rpc request");
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<RpcResponse>()
            .await?;
        parse_response(response)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LedgerError> {
        let started = Instant::now();
        loop {
            let receipt: Option<RawReceipt> = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                return receipt.into_receipt();
            }
            if started.elapsed() >= self.receipt_timeout {
                return Err(LedgerError::ReceiptTimeout {
                    tx_hash,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn accounts(&self) -> Result<Vec<Address>, LedgerError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
        let result: Bytes = self
            .request(
                "eth_call",
                json!([{ "to": to, "data": Bytes::from(data) }, "latest"]),
            )
            .await?;
        Ok(result.to_vec())
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TxReceipt, LedgerError> {
        let tx = json!({
            "from": from,
            "to": to,
            "data": Bytes::from(data),
            "gas": U64::from(self.gas),
        });
        let tx_hash: B256 = self.request("eth_sendTransaction", json!([tx])).await?;
        info!(%tx_hash, %from, %to, "submitted transaction");
        let receipt = self.wait_for_receipt(tx_hash).await?;
        info!(%tx_hash, block = receipt.block_number, "transaction mined");
        Ok(receipt)
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, LedgerError> {
        let raw: Vec<RawLog> = self
            .request(
                "eth_getLogs",
                json!([{
                    "address": filter.address,
                    "fromBlock": U64::from(filter.from_block),
                    "toBlock": "latest",
                    "topics": filter.topics,
                }]),
            )
            .await?;
        Ok(raw.into_iter().map(RawLog::into_log).collect())
    }
}
