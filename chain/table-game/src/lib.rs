//! Table Game: attestation-gated escrow and settlement
//!
//! A host and players pool an asset into a table. Every deposit and
//! withdrawal must carry an authorization signed by a trusted off-ledger
//! authority; the host's final settlement pays a profit skim to a
//! beneficiary and closes the table.
//!
//! # Modules
//! - `table`: the settlement engine (`TableGame`)
//! - `signing`: canonical messages, signer recovery, the trusted `Authority`
//! - `nonce`: per-participant replay protection
//! - `roles`: host / player entitlement and stake bookkeeping
//! - `lifecycle`: join window and closure
//! - `registry`: table factory and asset presets
//! - `env`: asset-transfer and clock primitives supplied by the host platform
//! - `asset`: in-memory asset ledger
//! - `config`, `events`, `errors`

pub mod asset;
pub mod config;
pub mod env;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod nonce;
pub mod registry;
pub mod roles;
pub mod signing;
pub mod table;

pub use config::{JoinWindow, NoncePolicy, RegistryConfig, TableConfig};
pub use errors::{AssetError, ConfigError, RegistryError, SignatureError, TableError};
pub use registry::{AssetPreset, TableRegistry};
pub use signing::{Authority, Authorization, AuthorizationRequest};
pub use table::{TableGame, TableSnapshot};

/// Version of the signed-message layout. Bump on any change to
/// `AuthorizationRequest::message`.
pub const MESSAGE_SCHEMA_VERSION: &str = "1.0.0";
