use std::{collections::HashMap, fs};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::encoding::{errors::EncodingError, evm::constants::DEFAULT_EXECUTOR_CONFIG_JSON, models::Chain};

/// Network addresses the compiler needs for one chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecutorConfig {
    /// The interpreter contract. Branch frames call it back.
    pub executor_address: Address,
    /// Recipient of transfer frames forwarding the bought tokens.
    pub router_address: Address,
    /// Placeholder address for the chain's native asset.
    pub native_token: Address,
    pub wrapped_native_token: Address,
}

impl ExecutorConfig {
    /// Loads the configuration of the given chain from the file at the given path, or from the
    /// default configuration (config/executor_addresses.json) when no path is given.
    pub fn for_chain(chain: Chain, config_file_path: Option<String>) -> Result<Self, EncodingError> {
        let config_str = if let Some(ref path) = config_file_path {
            fs::read_to_string(path).map_err(|e| {
                EncodingError::FatalError(format!(
                    "Error reading executor config file from {:?}: {}",
                    config_file_path, e
                ))
            })?
        } else {
            DEFAULT_EXECUTOR_CONFIG_JSON.to_string()
        };
        let mut configs: HashMap<String, ExecutorConfig> = serde_json::from_str(&config_str)?;
        configs
            .remove(chain.name())
            .ok_or_else(|| {
                EncodingError::FatalError(format!("No executor config found for chain {}", chain))
            })
    }

    pub fn is_native(&self, token: &Address) -> bool {
        *token == self.native_token
    }
}
