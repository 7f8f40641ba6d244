//! Table events
//!
//! Events are immutable records appended by registry and table operations.
//! Consumers read them through `events()` or take them with `drain_events()`.

use serde::{Deserialize, Serialize};
use table_types::ids::Address;
use table_types::numeric::Amount;
use table_types::time::Timestamp;

use crate::roles::Role;

/// A table was deployed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCreated {
    pub table: Address,
    pub asset: Address,
    pub potential_host: Option<Address>,
    pub open_until: Option<Timestamp>,
}

/// A deposit was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joined {
    pub table: Address,
    pub participant: Address,
    pub role: Role,
    pub amount: Amount,
    /// Nonce consumed by the authorization
    pub nonce: u64,
}

/// A withdrawal was paid out.
///
/// `payout` is what the participant received; `profit` went to the beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedOut {
    pub table: Address,
    pub participant: Address,
    pub role: Role,
    pub amount: Amount,
    pub profit: Amount,
    pub payout: Amount,
    pub nonce: u64,
}

/// The table reached its terminal state. Emitted exactly once per table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableClosed {
    pub table: Address,
}

/// Enum wrapper for all table events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableEvent {
    TableCreated(TableCreated),
    Joined(Joined),
    CheckedOut(CheckedOut),
    TableClosed(TableClosed),
}

impl TableEvent {
    /// Address of the table the event belongs to.
    pub fn table(&self) -> Address {
        match self {
            TableEvent::TableCreated(e) => e.table,
            TableEvent::Joined(e) => e.table,
            TableEvent::CheckedOut(e) => e.table,
            TableEvent::TableClosed(e) => e.table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_out_serialization() {
        let event = TableEvent::CheckedOut(CheckedOut {
            table: Address::repeat_byte(1),
            participant: Address::repeat_byte(2),
            role: Role::Host,
            amount: 150,
            profit: 50,
            payout: 100,
            nonce: 1,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: TableEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_table_accessor() {
        let table = Address::repeat_byte(9);
        let event = TableEvent::TableClosed(TableClosed { table });
        assert_eq!(event.table(), table);
        assert!(matches!(event, TableEvent::TableClosed(_)));
    }

    #[test]
    fn test_table_created_serialization() {
        let event = TableCreated {
            table: Address::repeat_byte(3),
            asset: Address::repeat_byte(4),
            potential_host: None,
            open_until: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(&Address::repeat_byte(4).to_string()));
        let deser: TableCreated = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
