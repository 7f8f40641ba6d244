//! Table and registry configuration
//!
//! Configuration is fixed at creation time. Both structs deserialize from
//! JSON and are validated before a table or registry is built from them.

use serde::{Deserialize, Serialize};
use table_types::ids::Address;
use table_types::time::{add_hours, Timestamp};

use crate::errors::ConfigError;

/// What happens to a consumed nonce when a later step of the same call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// The nonce stays spent once the authorization verified. Operators must
    /// re-sign with the next nonce after any failure past verification.
    #[default]
    SpendOnVerify,
    /// The nonce is restored when the call fails, so nothing at all changes.
    AllOrNothing,
}

/// Join window requested for a table deployed through a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinWindow {
    /// Use the registry's `default_open_duration_hours`
    #[default]
    RegistryDefault,
    /// Joins are never cut off by time, whatever the registry default
    Unbounded,
    /// Joins close this many hours after creation
    Hours(u32),
}

impl JoinWindow {
    /// Window length in hours, `None` meaning unbounded.
    pub fn resolve(self, registry_default: Option<u32>) -> Option<u32> {
        match self {
            JoinWindow::RegistryDefault => registry_default,
            JoinWindow::Unbounded => None,
            JoinWindow::Hours(hours) => Some(hours),
        }
    }
}

/// Immutable parameters of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// The table's own identity, bound into every signed message
    pub address: Address,
    /// Escrowed asset
    pub asset: Address,
    /// Identity whose signature authorizes deposits and withdrawals
    pub trusted_authority: Address,
    /// Receives the profit skim on host settlement
    pub beneficiary: Address,
    /// Pre-authorized host; `None` lets the first host joiner take the seat
    #[serde(default)]
    pub potential_host: Option<Address>,
    /// Join window measured from creation; `None` is unbounded
    #[serde(default)]
    pub open_duration_hours: Option<u32>,
    #[serde(default)]
    pub nonce_policy: NoncePolicy,
}

impl TableConfig {
    pub fn new(
        address: Address,
        asset: Address,
        trusted_authority: Address,
        beneficiary: Address,
    ) -> Self {
        Self {
            address,
            asset,
            trusted_authority,
            beneficiary,
            potential_host: None,
            open_duration_hours: None,
            nonce_policy: NoncePolicy::default(),
        }
    }

    pub fn with_potential_host(mut self, host: Address) -> Self {
        self.potential_host = Some(host);
        self
    }

    pub fn with_open_duration_hours(mut self, hours: u32) -> Self {
        self.open_duration_hours = Some(hours);
        self
    }

    pub fn with_nonce_policy(mut self, policy: NoncePolicy) -> Self {
        self.nonce_policy = policy;
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero(&self.address, "address")?;
        non_zero(&self.asset, "asset")?;
        non_zero(&self.trusted_authority, "trusted_authority")?;
        non_zero(&self.beneficiary, "beneficiary")?;
        if let Some(host) = &self.potential_host {
            non_zero(host, "potential_host")?;
        }
        if self.open_duration_hours == Some(0) {
            return Err(ConfigError::EmptyJoinWindow);
        }
        Ok(())
    }

    /// Absolute end of the join window for a table created at `created_at`.
    pub fn open_until(&self, created_at: Timestamp) -> Result<Option<Timestamp>, ConfigError> {
        match self.open_duration_hours {
            None => Ok(None),
            Some(hours) => add_hours(created_at, hours)
                .map(Some)
                .ok_or(ConfigError::WindowOverflow { hours }),
        }
    }
}

/// Parameters shared by every table a registry deploys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry identity; table addresses are derived from it
    pub address: Address,
    pub trusted_authority: Address,
    pub beneficiary: Address,
    /// Applied when a creation call does not specify a window
    #[serde(default)]
    pub default_open_duration_hours: Option<u32>,
    #[serde(default)]
    pub nonce_policy: NoncePolicy,
}

impl RegistryConfig {
    pub fn new(address: Address, trusted_authority: Address, beneficiary: Address) -> Self {
        Self {
            address,
            trusted_authority,
            beneficiary,
            default_open_duration_hours: None,
            nonce_policy: NoncePolicy::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_zero(&self.address, "address")?;
        non_zero(&self.trusted_authority, "trusted_authority")?;
        non_zero(&self.beneficiary, "beneficiary")?;
        if self.default_open_duration_hours == Some(0) {
            return Err(ConfigError::EmptyJoinWindow);
        }
        Ok(())
    }
}

fn non_zero(address: &Address, field: &'static str) -> Result<(), ConfigError> {
    if address.is_zero() {
        return Err(ConfigError::ZeroAddress { field });
    }
    Ok(())
}
