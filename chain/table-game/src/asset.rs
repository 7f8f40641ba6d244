//! In-memory asset ledger
//!
//! A multi-asset token ledger with balances and allowances, following the
//! usual fungible-token rules: `transfer_from` spends the spender's allowance
//! first (an unlimited `Amount::MAX` allowance is never decremented), then
//! moves the balance. Used as the reference [`AssetLedger`] for embedding
//! and tests.

use std::collections::HashMap;
use table_types::ids::Address;
use table_types::numeric::Amount;

use crate::env::AssetLedger;
use crate::errors::AssetError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetLedger {
    /// (asset, owner) -> balance
    balances: HashMap<(Address, Address), Amount>,
    /// (asset, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), Amount>,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` out of thin air for `owner`.
    pub fn mint(&mut self, asset: &Address, owner: &Address, amount: Amount) -> Result<(), AssetError> {
        let balance = self.balances.entry((*asset, *owner)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(AssetError::Overflow)?;
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s `asset` to exactly `amount`.
    pub fn approve(&mut self, asset: &Address, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*asset, *owner, *spender), amount);
    }

    pub fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*asset, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn balance_of(&self, asset: &Address, owner: &Address) -> Amount {
        self.balances.get(&(*asset, *owner)).copied().unwrap_or(0)
    }

    /// Total supply of `asset` across all holders.
    pub fn total_supply(&self, asset: &Address) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }

    fn move_balance(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or(AssetError::Overflow)?;

        self.balances.insert((*asset, *from), available - amount);
        self.balances.insert((*asset, *to), credited);
        Ok(())
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let allowed = self.allowance(asset, from, spender);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance {
                required: amount,
                allowed,
            });
        }

        self.move_balance(asset, from, to, amount)?;

        if allowed != Amount::MAX {
            self.approve(asset, from, spender, allowed - amount);
        }
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        self.move_balance(asset, from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Address {
        Address::repeat_byte(0x70)
    }

    fn owner() -> Address {
        Address::repeat_byte(0x01)
    }

    fn spender() -> Address {
        Address::repeat_byte(0x02)
    }

    fn recipient() -> Address {
        Address::repeat_byte(0x03)
    }

    #[test]
    fn test_mint_and_balance() {
        let mut ledger = InMemoryAssetLedger::new();
        ledger.mint(&token(), &owner(), 500).unwrap();
        assert_eq!(ledger.balance_of(&token(), &owner()), 500);
        assert_eq!(ledger.total_supply(&token()), 500);
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut ledger = InMemoryAssetLedger::new();
        ledger.mint(&token(), &owner(), 500).unwrap();
        ledger.approve(&token(), &owner(), &spender(), 300);

        ledger
            .transfer_from(&token(), &spender(), &owner(), &recipient(), 100)
            .unwrap();

        assert_eq!(ledger.balance_of(&token(), &owner()), 400);
        assert_eq!(ledger.balance_of(&token(), &recipient()), 100);
        assert_eq!(ledger.allowance(&token(), &owner(), &spender()), 200);
    }

    #[test]
    fn test_transfer_from_insufficient_allowance_is_atomic() {
        let mut ledger = InMemoryAssetLedger::new();
        ledger.mint(&token(), &owner(), 500).unwrap();
        ledger.approve(&token(), &owner(), &spender(), 100);

        let result = ledger.transfer_from(&token(), &spender(), &owner(), &recipient(), 300);
        assert_eq!(
            result,
            Err(AssetError::InsufficientAllowance {
                required: 300,
                allowed: 100
            })
        );
        assert_eq!(ledger.balance_of(&token(), &owner()), 500);
        assert_eq!(ledger.allowance(&token(), &owner(), &spender()), 100);
    }

    #[test]
    fn test_transfer_from_insufficient_balance() {
        let mut ledger = InMemoryAssetLedger::new();
        ledger.mint(&token(), &owner(), 50).unwrap();
        ledger.approve(&token(), &owner(), &spender(), 100);

        let result = ledger.transfer_from(&token(), &spender(), &owner(), &recipient(), 80);
        assert_eq!(
            result,
            Err(AssetError::InsufficientBalance {
                required: 80,
                available: 50
            })
        );
        assert_eq!(ledger.allowance(&token(), &owner(), &spender()), 100);
    }

    #[test]
    fn test_unlimited_allowance_not_decremented() {
        let mut ledger = InMemoryAssetLedger::new();
        ledger.mint(&token(), &owner(), 50).unwrap();
        ledger.approve(&token(), &owner(), &spender(), Amount::MAX);
        ledger
            .transfer_from(&token(), &spender(), &owner(), &recipient(), 50)
            .unwrap();
        assert_eq!(ledger.allowance(&token(), &owner(), &spender()), Amount::MAX);
    }

    #[test]
    fn test_assets_are_isolated() {
        let mut ledger = InMemoryAssetLedger::new();
        let other = Address::repeat_byte(0x71);
        ledger.mint(&token(), &owner(), 10).unwrap();
        assert_eq!(ledger.balance_of(&other, &owner()), 0);
        assert!(ledger.transfer(&other, &owner(), &recipient(), 1).is_err());
    }

    #[test]
    fn test_mint_overflow() {
        let mut ledger = InMemoryAssetLedger::new();
        ledger.mint(&token(), &owner(), Amount::MAX).unwrap();
        assert_eq!(ledger.mint(&token(), &owner(), 1), Err(AssetError::Overflow));
    }
}
