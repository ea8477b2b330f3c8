pub mod abi;
pub mod registry;
pub mod resolver;
pub mod reverse_registrar;
mod types;
pub mod utils;


pub use crate::abi::AbiError;
pub use crate::types::{parse_address, Address, ParseError, B256};
pub use crate::utils::NameError;
