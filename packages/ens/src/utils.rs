use crate::types::{Address, B256};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_keccak::Keccak;
use unicode_segmentation::UnicodeSegmentation;

pub const REVERSE_SUFFIX: &str = "addr.reverse";

/// Undotted search terms shorter than this many characters are "short" names.
pub const SHORT_NAME_LENGTH: usize = 7;

#[derive(Error, Debug, PartialEq)]
pub enum NameError {
    #[error("EmptyLabel: {name} contains an empty label")]
    EmptyLabel { name: String },

    #[error("InvalidCharacter: {name} contains {character:?}")]
    InvalidCharacter { name: String, character: char },

    #[error("NotALabel: {label} must not contain a dot")]
    NotALabel { label: String },
}

pub fn keccak256(i: &[u8]) -> [u8; 32] {
    let mut o = [0u8; 32];
    Keccak::keccak256(i, &mut o);
    o
}

pub fn labelhash(label: &str) -> B256 {
    B256::from(keccak256(label.as_bytes()))
}

/// Identifier of `label` directly under `node`.
pub fn subnode(node: &B256, label: &B256) -> B256 {
    B256::from(keccak256(&[node.0, label.0].concat()))
}

/// Hashes an already normalized name. The empty name is the root node.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    let mut labels: Vec<&str> = name.split('.').collect();
    labels.reverse();
    for label in labels.iter() {
        node = subnode(&node, &labelhash(label));
    }
    node
}

/// Canonical form of a dotted name: trimmed, lower-cased, without a single
/// trailing dot. Fails on empty labels and on whitespace or control chars.
pub fn normalize_name(name: &str) -> Result<String, NameError> {
    let trimmed = name.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if let Some(character) = trimmed
        .chars()
        .find(|c| c.is_whitespace() || c.is_control())
    {
        return Err(NameError::InvalidCharacter {
            name: name.to_string(),
            character,
        });
    }
    if trimmed.split('.').any(|label| label.is_empty()) {
        return Err(NameError::EmptyLabel {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_lowercase())
}

pub fn normalize_label(label: &str) -> Result<String, NameError> {
    let normalized = normalize_name(label)?;
    if normalized.is_empty() {
        return Err(NameError::EmptyLabel {
            name: label.to_string(),
        });
    }
    if normalized.contains('.') {
        return Err(NameError::NotALabel {
            label: label.to_string(),
        });
    }
    Ok(normalized)
}

/// Normalizes then hashes.
pub fn name_to_node(name: &str) -> Result<B256, NameError> {
    Ok(namehash(&normalize_name(name)?))
}

/// `<lower-case hex address>.addr.reverse`
pub fn reverse_name(address: &Address) -> String {
    format!("{}.{}", hex::encode(address.as_slice()), REVERSE_SUFFIX)
}

pub fn reverse_node(address: &Address) -> B256 {
    namehash(&reverse_name(address))
}

/// Placeholder for a label whose text is not known locally.
pub fn encode_labelhash(hash: &B256) -> String {
    format!("[{}]", hex::encode(hash.as_slice()))
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchTerm {
    Invalid,
    Supported,
    Unsupported,
    Address,
    Short,
    Search,
}

fn is_address(term: &str) -> bool {
    match term.strip_prefix("0x") {
        Some(digits) => digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn parse_search_term<S: AsRef<str>>(term: &str, supported_tlds: &[S]) -> SearchTerm {
    let term = term.trim();
    if term.is_empty() || normalize_name(term).is_err() {
        return SearchTerm::Invalid;
    }
    if term.contains('.') {
        let tld = term.rsplit('.').next().unwrap_or_default().to_lowercase();
        if supported_tlds.iter().any(|s| s.as_ref() == tld) {
            return SearchTerm::Supported;
        }
        return SearchTerm::Unsupported;
    }
    if is_address(term) {
        return SearchTerm::Address;
    }
    if term.graphemes(true).count() < SHORT_NAME_LENGTH {
        return SearchTerm::Short;
    }
    SearchTerm::Search
}
