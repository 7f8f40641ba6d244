//! Parse errors for shared types

use thiserror::Error;

/// Failure to parse an [`Address`](crate::ids::Address) from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length: expected 40 hex characters, got {len}")]
    InvalidLength { len: usize },

    #[error("Invalid hex in address: {input}")]
    InvalidHex { input: String },
}
