//! Escrow contract client
//!
//! Holds the connection details for the deployed escrow contract and
//! constructs providers. Providers are not cached; a new one is created
//! for each operation.

use crate::config::EthereumLedgerConfig;
use crate::error::{EthereumLedgerError, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;

/// Client that manages escrow contract connection details
pub struct EscrowClient {
    contract_address: Address,
    rpc_url: String,
    private_key: Option<String>,
    config: EthereumLedgerConfig,
}

impl EscrowClient {
    /// Creates a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Contract address is invalid
    /// - Private key is invalid (if provided)
    pub fn new(config: EthereumLedgerConfig) -> Result<Self> {
        let contract_address = Address::from_str(&config.contract_address).map_err(|e| {
            EthereumLedgerError::Configuration(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        if let Some(ref private_key) = config.private_key {
            let _ = private_key.parse::<PrivateKeySigner>().map_err(|e| {
                EthereumLedgerError::Configuration(format!("Invalid private key: {}", e))
            })?;
        }

        Ok(Self {
            contract_address,
            rpc_url: config.rpc_url.clone(),
            private_key: config.private_key.clone(),
            config,
        })
    }

    /// Returns the escrow contract address
    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    /// Returns the chain ID from configuration
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Checks if the client has a wallet for signing transactions
    pub fn has_wallet(&self) -> bool {
        self.private_key.is_some()
    }

    /// Returns the RPC URL
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Create a read-only provider for contract calls
    pub fn create_provider(&self) -> Result<impl Provider> {
        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| EthereumLedgerError::ProviderError(format!("Invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().connect_http(rpc_url))
    }

    /// Create a provider with wallet for sending transactions
    ///
    /// # Errors
    ///
    /// Returns an error if no private key is configured or the RPC URL is
    /// invalid.
    pub fn create_provider_with_signer(&self) -> Result<impl Provider> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(EthereumLedgerError::NoPrivateKey)?;

        let signer = private_key.parse::<PrivateKeySigner>().map_err(|e| {
            EthereumLedgerError::WalletError(format!("Invalid private key: {}", e))
        })?;

        let wallet = EthereumWallet::from(signer);

        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| EthereumLedgerError::ProviderError(format!("Invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().wallet(wallet).connect_http(rpc_url))
    }
}
