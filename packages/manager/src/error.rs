use crate::config::ConfigError;
use crate::ledger::LedgerError;
use ens::{AbiError, NameError, ParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    /// Ledger failures, revert reasons included, passed through unmodified.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("NoAccounts: the ledger has no accounts to send from")]
    NoAccounts {},

    #[error("NoResolver: {name} has no resolver")]
    NoResolver { name: String },

    #[error("ReverseRegistrarNotFound: addr.reverse has no owner")]
    ReverseRegistrarNotFound {},
}

impl ManagerError {
    pub fn is_revert(&self) -> bool {
        match self {
            ManagerError::Ledger(err) => err.is_revert(),
            _ => false,
        }
    }

    /// A resolver read that found no record: the resolver reverted, or there
    /// is no resolver code to answer.
    pub fn is_missing_record(&self) -> bool {
        matches!(self, ManagerError::Abi(AbiError::EmptyReturnData {})) || self.is_revert()
    }
}

pub type Result<T, E = ManagerError> = std::result::Result<T, E>;
