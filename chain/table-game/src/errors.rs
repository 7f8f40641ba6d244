//! Error types for the table game contracts
//!
//! One enum per concern. Everything a caller of the settlement operations can
//! observe funnels into [`TableError`].

use table_types::numeric::Amount;
use thiserror::Error;

/// Failures reported by the escrowed asset (the external token contract).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Asset: insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Asset: insufficient allowance: required {required}, allowed {allowed}")]
    InsufficientAllowance { required: Amount, allowed: Amount },

    #[error("Asset: arithmetic overflow")]
    Overflow,
}

/// Signature decoding and verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed signature: {reason}")]
    Malformed { reason: String },

    #[error("Invalid public key in signature")]
    InvalidPublicKey,

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Errors raised by the settlement operations of a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Game already closed or not opened yet")]
    GameNotOpen,

    #[error("Caller is neither the host nor the potential host")]
    NotHostOrPotentialHost,

    #[error("Caller is not the host")]
    NotHost,

    #[error("The host cannot act as a player")]
    HostCannotActAsPlayer,

    #[error("Caller is not on the table")]
    CallerNotOnTable,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Stale or future nonce: expected {expected}, supplied {supplied}")]
    StaleOrFutureNonce { expected: u64, supplied: u64 },

    #[error("Insufficient table balance: requested {requested}, available {available}")]
    InsufficientTableBalance { requested: Amount, available: Amount },

    #[error("Invalid profit: {profit} exceeds amount {amount}")]
    InvalidProfit { amount: Amount, profit: Amount },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("{0}")]
    Asset(#[from] AssetError),
}

impl From<SignatureError> for TableError {
    fn from(_: SignatureError) -> Self {
        TableError::InvalidSignature
    }
}

/// Table configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    Parse { reason: String },

    #[error("{field} must not be the zero address")]
    ZeroAddress { field: &'static str },

    #[error("Join window must be at least one hour")]
    EmptyJoinWindow,

    #[error("Join window of {hours}h overflows the timestamp range")]
    WindowOverflow { hours: u32 },
}

/// Registry (table factory) errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown asset preset: {name}")]
    UnknownPreset { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_not_open_display() {
        assert_eq!(
            TableError::GameNotOpen.to_string(),
            "Game already closed or not opened yet"
        );
    }

    #[test]
    fn test_nonce_error_display() {
        let err = TableError::StaleOrFutureNonce {
            expected: 3,
            supplied: 2,
        };
        assert!(err.to_string().contains("expected 3"));
        assert!(err.to_string().contains("supplied 2"));
    }

    #[test]
    fn test_asset_error_propagates_verbatim() {
        let asset_err = AssetError::InsufficientAllowance {
            required: 300,
            allowed: 100,
        };
        let table_err: TableError = asset_err.clone().into();
        assert_eq!(table_err, TableError::Asset(asset_err.clone()));
        assert_eq!(table_err.to_string(), asset_err.to_string());
    }

    #[test]
    fn test_signature_error_collapses_to_invalid_signature() {
        let err: TableError = SignatureError::VerificationFailed.into();
        assert_eq!(err, TableError::InvalidSignature);
        let err: TableError = SignatureError::Malformed {
            reason: "short".to_string(),
        }
        .into();
        assert_eq!(err, TableError::InvalidSignature);
    }

    #[test]
    fn test_registry_error_from_config() {
        let err: RegistryError = ConfigError::EmptyJoinWindow.into();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}
