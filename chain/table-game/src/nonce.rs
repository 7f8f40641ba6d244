//! Per-participant nonce registry for replay protection.
//!
//! Each identity has a counter starting at 0. An authorization is bound to
//! the counter value it was signed for and is usable exactly once: consuming
//! it advances the counter, so the same signature can never match again.

use std::collections::HashMap;
use table_types::ids::Address;

use crate::errors::TableError;

/// Keyed store of monotonic counters, scoped to one table.
#[derive(Debug, Clone, Default)]
pub struct NonceRegistry {
    nonces: HashMap<Address, u64>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nonce the next authorization for `identity` must carry.
    pub fn current_nonce(&self, identity: &Address) -> u64 {
        self.nonces.get(identity).copied().unwrap_or(0)
    }

    /// Consume `supplied` for `identity`.
    ///
    /// Fails unless `supplied` equals the current nonce; on success the
    /// stored nonce advances by one.
    pub fn consume(&mut self, identity: &Address, supplied: u64) -> Result<(), TableError> {
        let expected = self.current_nonce(identity);
        if supplied != expected {
            return Err(TableError::StaleOrFutureNonce { expected, supplied });
        }
        let next = expected.checked_add(1).ok_or(TableError::Overflow)?;
        self.nonces.insert(*identity, next);
        Ok(())
    }

    /// Undo the consumption of `consumed`, if it was the latest one.
    ///
    /// Returns `false` (and changes nothing) when `consumed` is not the
    /// nonce immediately preceding the current one.
    pub fn restore(&mut self, identity: &Address, consumed: u64) -> bool {
        if self.current_nonce(identity) != consumed.wrapping_add(1) || consumed == u64::MAX {
            return false;
        }
        if consumed == 0 {
            self.nonces.remove(identity);
        } else {
            self.nonces.insert(*identity, consumed);
        }
        true
    }

    /// Number of identities with a non-zero nonce.
    #[cfg(test)]
    fn count(&self) -> usize {
        self.nonces.len()
    }
}
