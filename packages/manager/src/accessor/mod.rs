//! Registry, resolver and reverse-record access. Every operation turns a
//! dotted name into its identifier and issues exactly the matching ledger
//! call; nothing about ledger state is cached here.

mod registry;
mod resolver;
mod reverse;

pub use self::registry::{DomainDetails, SubDomain};
pub use self::reverse::ReverseRecord;

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::ledger::{Ledger, RpcLedger, TxReceipt};
use alloy_sol_types::SolCall;
use ens::abi::decode_returns;
use ens::utils::{encode_labelhash, labelhash};
use ens::{Address, B256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

pub struct Ens {
    ledger: Arc<dyn Ledger>,
    registry: Address,
    from: Option<Address>,
    /// label hash -> label text for labels submitted through this handle
    labels: RwLock<HashMap<B256, String>>,
}

impl Ens {
    pub fn new(ledger: Arc<dyn Ledger>, registry: Address) -> Self {
        Ens {
            ledger,
            registry,
            from: None,
            labels: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self> {
        config.validate()?;
        let ledger = RpcLedger::new(&config.rpc_url)?
            .with_gas(config.gas)
            .with_poll_interval(config.poll_interval())
            .with_receipt_timeout(config.receipt_timeout());
        let ens = Ens::new(Arc::new(ledger), config.registry_address);
        Ok(match config.from {
            Some(from) => ens.with_sender(from),
            None => ens,
        })
    }

    pub fn registry_address(&self) -> Address {
        self.registry
    }

    pub async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.ledger.accounts().await?)
    }

    /// Configured sender, else the ledger's first account.
    pub async fn sender(&self) -> Result<Address> {
        if let Some(from) = self.from {
            return Ok(from);
        }
        self.accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(ManagerError::NoAccounts {})
    }

    async fn query<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        debug!(%to, call = C::SIGNATURE, "ledger call");
        let data = self.ledger.call(to, call.abi_encode()).await?;
        Ok(decode_returns::<C>(&data)?)
    }

    async fn transact<C: SolCall>(&self, to: Address, call: C) -> Result<TxReceipt> {
        let from = self.sender().await?;
        debug!(%from, %to, call = C::SIGNATURE, "ledger transaction");
        let receipt = self
            .ledger
            .send_transaction(from, to, call.abi_encode())
            .await?;
        info!(tx_hash = %receipt.transaction_hash, block = receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }

    fn remember_label(&self, label: &str) -> B256 {
        let hash = labelhash(label);
        let mut labels = self.labels.write().unwrap_or_else(|e| e.into_inner());
        labels.insert(hash, label.to_string());
        hash
    }

    /// Text of a label hash if this handle has seen it, else the `[hash]` form.
    pub fn label_text(&self, hash: &B256) -> (String, bool) {
        let labels = self.labels.read().unwrap_or_else(|e| e.into_inner());
        match labels.get(hash) {
            Some(label) => (label.clone(), true),
            None => (encode_labelhash(hash), false),
        }
    }
}

fn join_name(label: &str, parent: &str) -> String {
    if parent.is_empty() {
        label.to_string()
    } else {
        format!("{}.{}", label, parent)
    }
}
