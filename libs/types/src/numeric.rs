//! Asset amounts
//!
//! Amounts are unsigned integers in the asset's smallest unit. The escrow
//! never divides or rounds, so plain integers are exact.

/// Quantity of an asset in base units.
pub type Amount = u128;

/// Render an amount the way it appears in signed messages: base-10, no
/// separators, no leading zeros.
pub fn decimal_string(amount: Amount) -> String {
    amount.to_string()
}
