//! Role ledger: who hosts, who plays, and each participant's live stake.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use table_types::ids::Address;
use table_types::numeric::Amount;

use crate::errors::TableError;

/// Capacity a participant acts in for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Host,
    Player,
}

/// Bookkeeping record for one identity, created on its first accepted deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: Address,
    /// Deposits minus withdrawals while on the table
    pub deposited: Amount,
    /// `deposited > 0`
    pub on_table: bool,
}

impl Participant {
    fn new(address: Address) -> Self {
        Self {
            address,
            deposited: 0,
            on_table: false,
        }
    }
}

/// Host designation plus the participant records of one table.
#[derive(Debug, Clone, Default)]
pub struct RoleLedger {
    host: Option<Address>,
    potential_host: Option<Address>,
    participants: BTreeMap<Address, Participant>,
}

impl RoleLedger {
    /// `potential_host = None` lets the first host joiner take the seat.
    pub fn new(potential_host: Option<Address>) -> Self {
        Self {
            host: None,
            potential_host,
            participants: BTreeMap::new(),
        }
    }

    pub fn host(&self) -> Option<Address> {
        self.host
    }

    pub fn potential_host(&self) -> Option<Address> {
        self.potential_host
    }

    pub fn is_host(&self, identity: &Address) -> bool {
        self.host.as_ref() == Some(identity)
    }

    // ───────────────────────── Entitlement ─────────────────────────

    /// May `requester` deposit as host?
    pub fn authorize_join_as_host(&self, requester: &Address) -> Result<(), TableError> {
        let entitled = match self.host {
            Some(host) => host == *requester,
            None => self.potential_host.map_or(true, |p| p == *requester),
        };
        if !entitled {
            return Err(TableError::NotHostOrPotentialHost);
        }
        Ok(())
    }

    /// May `requester` deposit as a player? Anyone but the host.
    pub fn authorize_join_as_player(&self, requester: &Address) -> Result<(), TableError> {
        if self.is_host(requester) {
            return Err(TableError::HostCannotActAsPlayer);
        }
        Ok(())
    }

    /// May `requester` withdraw as a player? Must currently hold a stake.
    pub fn authorize_checkout_as_player(&self, requester: &Address) -> Result<(), TableError> {
        if self.is_host(requester) {
            return Err(TableError::HostCannotActAsPlayer);
        }
        if !self.is_on_table(requester) {
            return Err(TableError::CallerNotOnTable);
        }
        Ok(())
    }

    /// May `requester` settle as host? Only the seated host.
    pub fn authorize_checkout_as_host(&self, requester: &Address) -> Result<(), TableError> {
        if !self.is_host(requester) {
            return Err(TableError::NotHost);
        }
        Ok(())
    }

    // ───────────────────────── Bookkeeping ─────────────────────────

    /// Seat `host` if no host is set yet. No-op when already seated.
    pub fn seat_host(&mut self, host: Address) {
        if self.host.is_none() {
            self.host = Some(host);
        }
    }

    /// Record a deposit of `amount` for `identity`.
    pub fn credit(&mut self, identity: Address, amount: Amount) -> Result<(), TableError> {
        let participant = self
            .participants
            .entry(identity)
            .or_insert_with(|| Participant::new(identity));
        participant.deposited = participant
            .deposited
            .checked_add(amount)
            .ok_or(TableError::Overflow)?;
        participant.on_table = participant.deposited > 0;
        Ok(())
    }

    /// Record a withdrawal of `amount` for `identity`.
    ///
    /// The stake decreases by `min(amount, deposited)`; drawing beyond one's
    /// own stake is allowed and simply leaves the stake at zero.
    pub fn debit(&mut self, identity: &Address, amount: Amount) {
        if let Some(participant) = self.participants.get_mut(identity) {
            participant.deposited -= amount.min(participant.deposited);
            participant.on_table = participant.deposited > 0;
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn is_on_table(&self, identity: &Address) -> bool {
        self.participants
            .get(identity)
            .map_or(false, |p| p.on_table)
    }

    pub fn participant(&self, identity: &Address) -> Option<&Participant> {
        self.participants.get(identity)
    }

    /// All participant records, including retired ones, ordered by address.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Has the host settled out? True once a host exists and holds no stake.
    pub fn host_settled(&self) -> bool {
        match self.host {
            Some(host) => !self.is_on_table(&host),
            None => false,
        }
    }
}
