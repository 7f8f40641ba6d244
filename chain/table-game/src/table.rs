//! Table: the settlement engine
//!
//! Ties the lifecycle gate, role ledger, signature verifier and nonce registry
//! together. Every mutating call runs the same pipeline:
//!
//! 1. Lifecycle gate (`can_join(now)` / `can_checkout()`)
//! 2. Role entitlement
//! 3. Authorization: recover the signer, require the trusted authority,
//!    consume the nonce
//! 4. Amount checks, asset transfers, ledger update, possible closure
//!
//! Balance and ledger state only change when the whole call succeeds. A
//! nonce consumed in step 3 is handled per [`NoncePolicy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use table_types::ids::Address;
use table_types::numeric::Amount;
use table_types::time::Timestamp;
use tracing::{debug, error, info, warn};

use crate::config::{NoncePolicy, TableConfig};
use crate::env::{AssetLedger, Clock};
use crate::errors::{ConfigError, TableError};
use crate::events::{CheckedOut, Joined, TableClosed, TableEvent};
use crate::lifecycle::LifecycleGate;
use crate::nonce::NonceRegistry;
use crate::roles::{Participant, Role, RoleLedger};
use crate::signing::{Action, Authorization, AuthorizationRequest, Ed25519Verifier, SignatureVerifier};

/// Serializable point-in-time view of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub address: Address,
    pub asset: Address,
    pub trusted_authority: Address,
    pub beneficiary: Address,
    pub host: Option<Address>,
    pub potential_host: Option<Address>,
    pub created_at: Timestamp,
    pub open_until: Option<Timestamp>,
    pub closed: bool,
    pub accumulated_balance: Amount,
    pub participants: Vec<Participant>,
}

/// One escrow table.
pub struct TableGame {
    config: TableConfig,
    created_at: Timestamp,
    gate: LifecycleGate,
    roles: RoleLedger,
    nonces: NonceRegistry,
    /// Funds currently escrowed; always equals the table's asset holdings
    accumulated_balance: Amount,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
    /// Emitted events log (append-only)
    events: Vec<TableEvent>,
}

impl TableGame {
    /// Create a table from a validated configuration. The join window starts
    /// at `clock.now()`.
    pub fn create(config: TableConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let created_at = clock.now();
        let open_until = config.open_until(created_at)?;

        info!(
            table = %config.address,
            asset = %config.asset,
            open_until = ?open_until,
            "TableGame created"
        );

        Ok(Self {
            gate: LifecycleGate::new(open_until),
            roles: RoleLedger::new(config.potential_host),
            nonces: NonceRegistry::new(),
            accumulated_balance: 0,
            created_at,
            clock,
            verifier: Arc::new(Ed25519Verifier),
            events: Vec::new(),
            config,
        })
    }

    /// Replace the signature verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    // ───────────────────────── Operations ─────────────────────────

    /// Deposit `amount` as the host (or prospective host).
    pub fn join_as_host<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: Amount,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        let result = self.join(ledger, Role::Host, caller, amount, authorization);
        self.trace_rejection(Action::JoinAsHost, caller, amount, &result);
        result
    }

    /// Deposit `amount` as a player.
    pub fn join_as_player<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: Amount,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        let result = self.join(ledger, Role::Player, caller, amount, authorization);
        self.trace_rejection(Action::JoinAsPlayer, caller, amount, &result);
        result
    }

    /// Withdraw `amount` as a player.
    ///
    /// The table balance must cover `amount`; the player's own stake need not.
    pub fn checkout_as_player<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: Amount,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        let result = self.checkout(ledger, Role::Player, caller, amount, 0, authorization);
        self.trace_rejection(Action::CheckoutAsPlayer, caller, amount, &result);
        result
    }

    /// Settle as the host: `amount` goes to the host and `profit` to the
    /// beneficiary, so the pool shrinks by `amount + profit`. Draining the
    /// table closes it.
    pub fn checkout_as_host<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: Amount,
        profit: Amount,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        let result = self.checkout(ledger, Role::Host, caller, amount, profit, authorization);
        self.trace_rejection(Action::CheckoutAsHost, caller, amount, &result);
        result
    }

    // ───────────────────────── Pipeline ─────────────────────────

    fn join<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        role: Role,
        caller: &Address,
        amount: Amount,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        self.gate.can_join(self.clock.now())?;

        let table = self.address();
        let request = match role {
            Role::Host => {
                self.roles.authorize_join_as_host(caller)?;
                AuthorizationRequest::join_as_host(table, *caller, amount, authorization.nonce)
            }
            Role::Player => {
                self.roles.authorize_join_as_player(caller)?;
                AuthorizationRequest::join_as_player(table, *caller, amount, authorization.nonce)
            }
        };

        self.authorize(&request, authorization)?;
        let outcome = self.apply_join(ledger, role, caller, amount, authorization.nonce);
        self.release_nonce_on_failure(caller, authorization.nonce, outcome)
    }

    fn checkout<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        role: Role,
        caller: &Address,
        amount: Amount,
        profit: Amount,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        self.gate.can_checkout()?;

        let table = self.address();
        let request = match role {
            Role::Host => {
                self.roles.authorize_checkout_as_host(caller)?;
                AuthorizationRequest::checkout_as_host(table, *caller, amount, profit, authorization.nonce)
            }
            Role::Player => {
                self.roles.authorize_checkout_as_player(caller)?;
                AuthorizationRequest::checkout_as_player(table, *caller, amount, authorization.nonce)
            }
        };

        self.authorize(&request, authorization)?;
        let outcome = self.apply_checkout(ledger, role, caller, amount, profit, authorization.nonce);
        self.release_nonce_on_failure(caller, authorization.nonce, outcome)
    }

    /// Verify-then-consume guard in front of every mutation.
    fn authorize(
        &mut self,
        request: &AuthorizationRequest,
        authorization: &Authorization,
    ) -> Result<(), TableError> {
        let message = request.message();
        let signer = self
            .verifier
            .recover_signer(message.as_bytes(), &authorization.signature)
            .map_err(|e| {
                debug!(table = %self.address(), error = %e, "signature recovery failed");
                TableError::from(e)
            })?;

        if signer != self.config.trusted_authority {
            debug!(
                table = %self.address(),
                signer = %signer,
                "signature not from trusted authority"
            );
            return Err(TableError::InvalidSignature);
        }

        self.nonces.consume(&request.participant, authorization.nonce)?;
        debug!(
            table = %self.address(),
            participant = %request.participant,
            nonce = authorization.nonce,
            action = %request.action,
            "authorization consumed"
        );
        Ok(())
    }

    fn release_nonce_on_failure(
        &mut self,
        caller: &Address,
        nonce: u64,
        outcome: Result<(), TableError>,
    ) -> Result<(), TableError> {
        if outcome.is_err() && self.config.nonce_policy == NoncePolicy::AllOrNothing {
            self.nonces.restore(caller, nonce);
        }
        outcome
    }

    fn apply_join<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        role: Role,
        caller: &Address,
        amount: Amount,
        nonce: u64,
    ) -> Result<(), TableError> {
        if amount == 0 {
            return Err(TableError::InvalidAmount);
        }

        let new_balance = self
            .accumulated_balance
            .checked_add(amount)
            .ok_or(TableError::Overflow)?;
        let stake = self.roles.participant(caller).map_or(0, |p| p.deposited);
        if stake.checked_add(amount).is_none() {
            return Err(TableError::Overflow);
        }

        let table = self.address();
        ledger.transfer_from(&self.config.asset, &table, caller, &table, amount)?;

        self.accumulated_balance = new_balance;
        self.roles.credit(*caller, amount)?;
        if role == Role::Host {
            self.roles.seat_host(*caller);
        }

        info!(
            table = %table,
            participant = %caller,
            role = ?role,
            amount = %amount,
            balance = %self.accumulated_balance,
            "deposit accepted"
        );
        self.events.push(TableEvent::Joined(Joined {
            table,
            participant: *caller,
            role,
            amount,
            nonce,
        }));
        Ok(())
    }

    fn apply_checkout<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        role: Role,
        caller: &Address,
        amount: Amount,
        profit: Amount,
        nonce: u64,
    ) -> Result<(), TableError> {
        if amount == 0 {
            return Err(TableError::InvalidAmount);
        }
        if profit > amount {
            return Err(TableError::InvalidProfit { amount, profit });
        }
        // The host receives `amount`; `profit` leaves the pool on top of it.
        let withdrawn = amount.checked_add(profit).ok_or(TableError::Overflow)?;
        if withdrawn > self.accumulated_balance {
            return Err(TableError::InsufficientTableBalance {
                requested: withdrawn,
                available: self.accumulated_balance,
            });
        }

        let table = self.address();
        let asset = self.config.asset;
        let beneficiary = self.config.beneficiary;

        if profit > 0 {
            ledger.transfer(&asset, &table, &beneficiary, profit)?;
        }
        if let Err(payout_error) = ledger.transfer(&asset, &table, caller, amount) {
            if profit > 0 {
                if let Err(reclaim_error) = ledger.transfer(&asset, &beneficiary, &table, profit) {
                    error!(
                        table = %table,
                        beneficiary = %beneficiary,
                        profit = %profit,
                        error = %reclaim_error,
                        "profit reclaim failed, asset holdings no longer match balance"
                    );
                }
            }
            return Err(payout_error.into());
        }

        self.accumulated_balance -= withdrawn;
        self.roles.debit(caller, amount);

        info!(
            table = %table,
            participant = %caller,
            role = ?role,
            amount = %amount,
            profit = %profit,
            balance = %self.accumulated_balance,
            "checkout settled"
        );
        self.events.push(TableEvent::CheckedOut(CheckedOut {
            table,
            participant: *caller,
            role,
            amount,
            profit,
            payout: amount,
            nonce,
        }));

        if self.accumulated_balance == 0 && (role == Role::Host || self.roles.host_settled()) {
            self.close();
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.gate.close() {
            info!(table = %self.address(), "table closed");
            self.events.push(TableEvent::TableClosed(TableClosed {
                table: self.address(),
            }));
        }
    }

    fn trace_rejection(
        &self,
        action: Action,
        caller: &Address,
        amount: Amount,
        result: &Result<(), TableError>,
    ) {
        if let Err(error) = result {
            warn!(
                table = %self.address(),
                participant = %caller,
                action = %action,
                amount = %amount,
                error = %error,
                "request rejected"
            );
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn asset(&self) -> Address {
        self.config.asset
    }

    pub fn trusted_authority(&self) -> Address {
        self.config.trusted_authority
    }

    pub fn beneficiary(&self) -> Address {
        self.config.beneficiary
    }

    pub fn nonce_policy(&self) -> NoncePolicy {
        self.config.nonce_policy
    }

    pub fn get_accumulated_balance(&self) -> Amount {
        self.accumulated_balance
    }

    pub fn host(&self) -> Option<Address> {
        self.roles.host()
    }

    pub fn potential_host(&self) -> Option<Address> {
        self.roles.potential_host()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn open_until(&self) -> Option<Timestamp> {
        self.gate.open_until()
    }

    pub fn is_closed(&self) -> bool {
        self.gate.is_closed()
    }

    /// Would a join be accepted right now (ignoring role and signature)?
    pub fn is_open(&self) -> bool {
        self.gate.can_join(self.clock.now()).is_ok()
    }

    pub fn participant(&self, identity: &Address) -> Option<&Participant> {
        self.roles.participant(identity)
    }

    /// Nonce the next authorization for `identity` must be signed with.
    pub fn nonce_of(&self, identity: &Address) -> u64 {
        self.nonces.current_nonce(identity)
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            address: self.config.address,
            asset: self.config.asset,
            trusted_authority: self.config.trusted_authority,
            beneficiary: self.config.beneficiary,
            host: self.roles.host(),
            potential_host: self.roles.potential_host(),
            created_at: self.created_at,
            open_until: self.gate.open_until(),
            closed: self.gate.is_closed(),
            accumulated_balance: self.accumulated_balance,
            participants: self.roles.participants().cloned().collect(),
        }
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[TableEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }
}

impl fmt::Debug for TableGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableGame")
            .field("config", &self.config)
            .field("created_at", &self.created_at)
            .field("gate", &self.gate)
            .field("roles", &self.roles)
            .field("nonces", &self.nonces)
            .field("accumulated_balance", &self.accumulated_balance)
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}
