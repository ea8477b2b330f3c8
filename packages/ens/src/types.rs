pub use alloy_primitives::{Address, B256};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("MissingPrefix: {value} does not start with 0x")]
    MissingPrefix { value: String },

    #[error("InvalidHex: {value}")]
    InvalidHex { value: String },

    #[error("InvalidLength: expected at most {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Parses a 0x-prefixed address. Short hex is left-padded, so "0x12345" is a
/// valid address.
pub fn parse_address(value: &str) -> Result<Address, ParseError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ParseError::MissingPrefix {
            value: value.to_string(),
        })?;
    if digits.is_empty() || digits.len() > 40 {
        return Err(ParseError::InvalidLength {
            expected: 40,
            actual: digits.len(),
        });
    }
    let padded = format!("{:0>40}", digits);
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(&padded, &mut bytes).map_err(|_| ParseError::InvalidHex {
        value: value.to_string(),
    })?;
    Ok(Address::from(bytes))
}
