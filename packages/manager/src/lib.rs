pub mod accessor;
pub mod config;
pub mod error;
pub mod ledger;

#[cfg(test)]
mod mock_ledger;

pub use crate::accessor::{DomainDetails, Ens, ReverseRecord, SubDomain};
pub use crate::config::{ConfigError, ManagerConfig};
pub use crate::error::{ManagerError, Result};
pub use crate::ledger::{Ledger, LedgerError, Log, LogFilter, RpcLedger, TxReceipt};
