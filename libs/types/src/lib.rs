//! Types library for the table game escrow
//!
//! Identity, amount and time primitives shared by the settlement engine and
//! anything embedding it. Everything here is plain data: no ledger state.
//!
//! # Modules
//! - `ids`: 20-byte identities (`Address`) for tables, assets and participants
//! - `numeric`: unsigned base-unit amounts
//! - `time`: UTC timestamps
//! - `errors`: parse errors for the above

pub mod errors;
pub mod ids;
pub mod numeric;
pub mod time;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::time::*;
}
