//! Configuration types for the Ethereum ledger layer

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the Ethereum ledger layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthereumLedgerConfig {
    /// RPC URL for the Ethereum node
    /// Example: "https://rpc-amoy.polygon.technology"
    pub rpc_url: String,

    /// Chain ID (1=mainnet, 80002=Polygon Amoy, 84532=Base Sepolia, etc.)
    pub chain_id: u64,

    /// Deployed MarketplaceEscrow contract address
    /// Must be a valid Ethereum address (0x-prefixed, 42 characters)
    pub contract_address: String,

    /// Private key for signing transactions (optional for read-only use)
    /// Format: 0x-prefixed hex string (64 hex chars + 0x prefix = 66 chars)
    pub private_key: Option<String>,

    /// Multiply estimated gas limit by this factor for safety
    /// Default: 1.2 (20% safety margin)
    pub gas_limit_multiplier: f64,

    /// Maximum gas price willing to pay (in gwei, optional)
    /// Transactions fail if the current gas price exceeds this
    pub max_gas_price_gwei: Option<f64>,

    /// Number of confirmations to wait for (default 1)
    pub confirmation_blocks: u64,

    /// Timeout for each ledger round trip (submission + confirmation wait)
    pub request_timeout_secs: u64,
}

impl Default for EthereumLedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337, // Local anvil/hardhat
            contract_address: String::new(),
            private_key: None,
            gas_limit_multiplier: 1.2,
            max_gas_price_gwei: None,
            confirmation_blocks: 1,
            request_timeout_secs: 60,
        }
    }
}

impl EthereumLedgerConfig {
    /// Load configuration from a TOML file
    ///
    /// ```no_run
    /// use fairlance_ledger_ethereum::EthereumLedgerConfig;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = EthereumLedgerConfig::from_file("ethereum.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(toml: &str) -> Result<Self, anyhow::Error> {
        let config: Self = toml::from_str(toml)?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc_url.is_empty() {
            return Err("rpc_url must not be empty".to_string());
        }

        if !self.contract_address.starts_with("0x") || self.contract_address.len() != 42 {
            return Err(format!(
                "contract_address must be a 0x-prefixed 42-character address, got '{}'",
                self.contract_address
            ));
        }

        if let Some(key) = &self.private_key {
            if !key.starts_with("0x") || key.len() != 66 {
                return Err(
                    "private_key must be a 0x-prefixed 66-character hex string".to_string()
                );
            }
        }

        if self.gas_limit_multiplier < 1.0 {
            return Err("gas_limit_multiplier must be >= 1.0".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }
}
