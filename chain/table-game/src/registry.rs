//! Registry: deploys tables that share one trusted authority and beneficiary.
//!
//! Each deployment derives a fresh table address from the registry address
//! and a deployment counter, so addresses are deterministic and never reused.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use table_types::ids::Address;
use tracing::info;

use crate::config::{JoinWindow, RegistryConfig, TableConfig};
use crate::env::Clock;
use crate::errors::RegistryError;
use crate::events::{TableCreated, TableEvent};
use crate::table::TableGame;

/// Domain separator for table address derivation.
const TABLE_ADDRESS_DOMAIN: &[u8] = b"table-game/deploy";

/// Well-known stablecoin deployments tables are commonly opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetPreset {
    UsdtOnEth,
    UsdcOnGoerli,
    UsdtOnBsc,
    UsdtOnBscTestnet,
}

impl AssetPreset {
    pub const ALL: [AssetPreset; 4] = [
        AssetPreset::UsdtOnEth,
        AssetPreset::UsdcOnGoerli,
        AssetPreset::UsdtOnBsc,
        AssetPreset::UsdtOnBscTestnet,
    ];

    /// Token contract address of the preset.
    pub fn address(&self) -> Address {
        let bytes = match self {
            // 0xdAC17F958D2ee523a2206206994597C13D831ec7
            AssetPreset::UsdtOnEth => [
                0xda, 0xc1, 0x7f, 0x95, 0x8d, 0x2e, 0xe5, 0x23, 0xa2, 0x20, 0x62, 0x06, 0x99,
                0x45, 0x97, 0xc1, 0x3d, 0x83, 0x1e, 0xc7,
            ],
            // 0x07865c6E87B9F70255377e024ace6630C1Eaa37F
            AssetPreset::UsdcOnGoerli => [
                0x07, 0x86, 0x5c, 0x6e, 0x87, 0xb9, 0xf7, 0x02, 0x55, 0x37, 0x7e, 0x02, 0x4a,
                0xce, 0x66, 0x30, 0xc1, 0xea, 0xa3, 0x7f,
            ],
            // 0x55d398326f99059fF775485246999027B3197955
            AssetPreset::UsdtOnBsc => [
                0x55, 0xd3, 0x98, 0x32, 0x6f, 0x99, 0x05, 0x9f, 0xf7, 0x75, 0x48, 0x52, 0x46,
                0x99, 0x90, 0x27, 0xb3, 0x19, 0x79, 0x55,
            ],
            // 0x337610d27c682E347C9cD60BD4b3b107C9d34dDd
            AssetPreset::UsdtOnBscTestnet => [
                0x33, 0x76, 0x10, 0xd2, 0x7c, 0x68, 0x2e, 0x34, 0x7c, 0x9c, 0xd6, 0x0b, 0xd4,
                0xb3, 0xb1, 0x07, 0xc9, 0xd3, 0x4d, 0xdd,
            ],
        };
        Address::from_bytes(bytes)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AssetPreset::UsdtOnEth => "usdt_on_eth",
            AssetPreset::UsdcOnGoerli => "usdc_on_goerli",
            AssetPreset::UsdtOnBsc => "usdt_on_bsc",
            AssetPreset::UsdtOnBscTestnet => "usdt_on_bsc_testnet",
        }
    }
}

impl fmt::Display for AssetPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetPreset {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetPreset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RegistryError::UnknownPreset {
                name: s.to_string(),
            })
    }
}

/// Table factory.
pub struct TableRegistry {
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
    /// Addresses of every table deployed so far, in deployment order
    tables: Vec<Address>,
    events: Vec<TableEvent>,
}

impl TableRegistry {
    pub fn new(config: RegistryConfig, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            tables: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Deploy a table escrowing `asset`.
    pub fn create_table(
        &mut self,
        asset: Address,
        potential_host: Option<Address>,
        window: JoinWindow,
    ) -> Result<TableGame, RegistryError> {
        let address = self.derive_table_address(self.tables.len() as u64);

        let mut table_config = TableConfig::new(
            address,
            asset,
            self.config.trusted_authority,
            self.config.beneficiary,
        )
        .with_nonce_policy(self.config.nonce_policy);
        table_config.potential_host = potential_host;
        table_config.open_duration_hours =
            window.resolve(self.config.default_open_duration_hours);

        let table = TableGame::create(table_config, Arc::clone(&self.clock))?;
        self.tables.push(address);

        info!(
            registry = %self.config.address,
            table = %address,
            asset = %asset,
            deployed = self.tables.len(),
            "table deployed"
        );
        self.events.push(TableEvent::TableCreated(TableCreated {
            table: address,
            asset,
            potential_host,
            open_until: table.open_until(),
        }));
        Ok(table)
    }

    /// Deploy a table against a well-known asset.
    pub fn create_table_with_preset(
        &mut self,
        preset: AssetPreset,
        potential_host: Option<Address>,
        window: JoinWindow,
    ) -> Result<TableGame, RegistryError> {
        self.create_table(preset.address(), potential_host, window)
    }

    /// Address the `index`-th deployment receives.
    pub fn derive_table_address(&self, index: u64) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(TABLE_ADDRESS_DOMAIN);
        hasher.update(self.config.address.as_bytes());
        hasher.update(index.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        Address::from_digest(&digest)
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn trusted_authority(&self) -> Address {
        self.config.trusted_authority
    }

    pub fn beneficiary(&self) -> Address {
        self.config.beneficiary
    }

    pub fn tables(&self) -> &[Address] {
        &self.tables
    }

    pub fn events(&self) -> &[TableEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }
}

impl fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRegistry")
            .field("config", &self.config)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}
