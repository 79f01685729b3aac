//! Operator configuration for a channel client.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::abipacked::types::Address;

/// Error returned when loading a [ChannelConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where and how the final state is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    /// Address of the deployed payment channel contract.
    #[serde(default = "default_settlement_contract")]
    pub settlement_contract: Address,
    /// Gas limit sent along with `updateBalances`.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Attach the settled amount as call value. The contract escrows the
    /// payment from the submitter's transaction.
    #[serde(default = "default_attach_value")]
    pub attach_value: bool,
}

fn default_settlement_contract() -> Address {
    // 0xD9769988DED363ad8D382b4835bD8E3564aF6ED2
    Address([
        0xd9, 0x76, 0x99, 0x88, 0xde, 0xd3, 0x63, 0xad, 0x8d, 0x38, 0x2b, 0x48, 0x35, 0xbd, 0x8e,
        0x35, 0x64, 0xaf, 0x6e, 0xd2,
    ])
}

fn default_gas_limit() -> u64 {
    10_000_000
}

fn default_attach_value() -> bool {
    true
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            settlement_contract: default_settlement_contract(),
            gas_limit: default_gas_limit(),
            attach_value: default_attach_value(),
        }
    }
}

impl ChannelConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
