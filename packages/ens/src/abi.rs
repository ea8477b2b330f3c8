use crate::types::B256;
use alloy_sol_types::{SolCall, SolEvent};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbiError {
    /// Calls to an address without code succeed with no data.
    #[error("EmptyReturnData: the call returned no data")]
    EmptyReturnData {},

    #[error(transparent)]
    Sol(#[from] alloy_sol_types::Error),
}

/// Decodes what `C` returned.
pub fn decode_returns<C: SolCall>(data: &[u8]) -> Result<C::Return, AbiError> {
    if data.is_empty() {
        return Err(AbiError::EmptyReturnData {});
    }
    Ok(C::abi_decode_returns(data, true)?)
}

/// `None` when the log was not emitted as `E`.
pub fn decode_event<E: SolEvent>(topics: &[B256], data: &[u8]) -> Result<Option<E>, AbiError> {
    if topics.first() != Some(&E::SIGNATURE_HASH) {
        return Ok(None);
    }
    Ok(Some(E::decode_raw_log(topics.iter().copied(), data, true)?))
}
