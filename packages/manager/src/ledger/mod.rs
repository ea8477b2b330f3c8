//! Boundary to the external ledger. Every registry, resolver and reverse
//! registrar operation ends up as one of the calls below.

mod rpc;

pub use self::rpc::RpcLedger;

use async_trait::async_trait;
use ens::{Address, B256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error object returned by the node, revert reasons included. The
    /// message is kept verbatim.
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("transaction {tx_hash} failed")]
    TransactionFailed { tx_hash: B256 },

    #[error("no receipt for transaction {tx_hash} after {waited_secs}s")]
    ReceiptTimeout { tx_hash: B256, waited_secs: u64 },
}

impl LedgerError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        LedgerError::Malformed(msg.into())
    }

    pub fn is_revert(&self) -> bool {
        match self {
            LedgerError::Rpc { message, .. } => message.contains("revert"),
            LedgerError::TransactionFailed { .. } => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
    pub block_number: u64,
}

/// `None` topics match anything at that position.
#[derive(Clone, Debug, PartialEq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<B256>>,
    pub from_block: u64,
}

impl LogFilter {
    pub fn new(address: Address) -> Self {
        LogFilter {
            address,
            topics: vec![],
            from_block: 0,
        }
    }

    pub fn topic(mut self, topic: impl Into<Option<B256>>) -> Self {
        self.topics.push(topic.into());
        self
    }

    pub fn matches(&self, log: &Log) -> bool {
        log.address == self.address
            && log.block_number >= self.from_block
            && self
                .topics
                .iter()
                .enumerate()
                .all(|(i, topic)| match topic {
                    Some(topic) => log.topics.get(i) == Some(topic),
                    None => true,
                })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub logs: Vec<Log>,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Accounts the ledger will sign for.
    async fn accounts(&self) -> Result<Vec<Address>, LedgerError>;

    /// Read-only call; returns the raw return data.
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, LedgerError>;

    /// Submits a state-changing call and waits until it is mined.
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<TxReceipt, LedgerError>;

    async fn logs(&self, filter: LogFilter) -> Result<Vec<Log>, LedgerError>;
}
