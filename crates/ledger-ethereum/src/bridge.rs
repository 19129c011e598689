//! Ethereum implementation of the `LedgerBridge` trait
//!
//! Each operation creates a fresh provider, submits a single transaction
//! and waits for the configured number of confirmations. There is no
//! batching and no background task; simplicity over gas optimization.

use async_trait::async_trait;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use fairlance_ledger_trait::{
    LedgerBridge, LedgerContractStatus, LedgerLayer, LedgerResult, RegisteredContract, TxReceipt,
};

use crate::abi::MarketplaceEscrow;
use crate::client::EscrowClient;
use crate::config::EthereumLedgerConfig;
use crate::error::{EthereumLedgerError, Result};

use alloy::consensus::TxReceipt as _;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;
use alloy::sol_types::SolEvent;

/// Ethereum ledger layer implementation
pub struct EthereumLedger {
    /// Escrow client with connection details
    client: Arc<EscrowClient>,

    /// Configuration
    config: EthereumLedgerConfig,

    /// Chain ID as string (for trait implementation)
    chain_id: String,
}

impl EthereumLedger {
    /// Create a new Ethereum ledger instance
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the contract
    /// address / private key are invalid.
    pub fn new(config: EthereumLedgerConfig) -> Result<Self> {
        info!(
            "Initializing Ethereum ledger layer for chain {}",
            config.chain_id
        );

        config.validate().map_err(EthereumLedgerError::Configuration)?;

        let client = Arc::new(EscrowClient::new(config.clone())?);
        let chain_id = config.chain_id.to_string();

        Ok(Self {
            client,
            config,
            chain_id,
        })
    }

    /// Format a transaction hash for return as String
    fn format_tx_hash(&self, hash: TxHash) -> String {
        format!("0x{:x}", hash)
    }

    /// Parse a ledger contract id (decimal uint256) into U256
    fn parse_contract_id(&self, ledger_contract_id: &str) -> Result<U256> {
        U256::from_str(ledger_contract_id).map_err(|e| {
            EthereumLedgerError::Configuration(format!(
                "Invalid ledger contract id '{}': {}",
                ledger_contract_id, e
            ))
        })
    }

    /// Bound a ledger round trip by the configured request timeout
    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let secs = self.config.request_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| EthereumLedgerError::Timeout(secs))?
    }

    /// Enforce the configured gas price ceiling before sending
    async fn check_gas_price(&self, provider: &impl Provider) -> Result<()> {
        let Some(max) = self.config.max_gas_price_gwei else {
            return Ok(());
        };

        let price = provider
            .get_gas_price()
            .await
            .map_err(|e| EthereumLedgerError::Rpc(e.to_string()))?;

        let current = price as f64 / 1e9;
        if current > max {
            return Err(EthereumLedgerError::GasPriceTooHigh { current, max });
        }

        Ok(())
    }
}

#[async_trait]
impl LedgerBridge for EthereumLedger {
    fn ledger_layer(&self) -> LedgerLayer {
        LedgerLayer::from_chain_id(self.config.chain_id)
    }

    fn chain_id(&self) -> String {
        self.chain_id.clone()
    }

    async fn register_contract(
        &self,
        freelancer_address: &str,
        locked_value: u64,
        terms_ref: &str,
    ) -> LedgerResult<RegisteredContract> {
        debug!(
            "Registering escrow contract for {} with locked value {}",
            freelancer_address, locked_value
        );

        let freelancer = Address::from_str(freelancer_address).map_err(|e| {
            EthereumLedgerError::InvalidAddress(format!("'{}': {}", freelancer_address, e))
        })?;

        let registered = self
            .bounded(async {
                let provider = self.client.create_provider_with_signer()?;
                self.check_gas_price(&provider).await?;

                let contract = MarketplaceEscrow::new(*self.client.contract_address(), &provider);

                let pending_tx = contract
                    .registerContract(freelancer, terms_ref.to_string())
                    .value(U256::from(locked_value))
                    .send()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                let receipt = pending_tx
                    .with_required_confirmations(self.config.confirmation_blocks)
                    .get_receipt()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                // The contract id is only known from the registration event.
                let event = receipt
                    .inner
                    .logs()
                    .iter()
                    .find_map(|log| {
                        MarketplaceEscrow::ContractRegistered::decode_log_data(&log.inner.data)
                            .ok()
                    })
                    .ok_or_else(|| {
                        EthereumLedgerError::EventParsing(
                            "ContractRegistered event missing from receipt".to_string(),
                        )
                    })?;

                Ok(RegisteredContract {
                    ledger_contract_id: event.contractId.to_string(),
                    contract_address: self.client.contract_address().to_string(),
                    tx_hash: self.format_tx_hash(receipt.transaction_hash),
                })
            })
            .await?;

        info!(
            "Escrow contract {} registered with tx {}",
            registered.ledger_contract_id, registered.tx_hash
        );
        Ok(registered)
    }

    async fn update_status(
        &self,
        ledger_contract_id: &str,
        status: LedgerContractStatus,
    ) -> LedgerResult<TxReceipt> {
        debug!(
            "Mirroring status {} for ledger contract {}",
            status, ledger_contract_id
        );

        let contract_id = self.parse_contract_id(ledger_contract_id)?;

        let receipt = self
            .bounded(async {
                let provider = self.client.create_provider_with_signer()?;
                self.check_gas_price(&provider).await?;

                let contract = MarketplaceEscrow::new(*self.client.contract_address(), &provider);

                let pending_tx = contract
                    .updateStatus(contract_id, status.as_u8())
                    .send()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                let receipt = pending_tx
                    .with_required_confirmations(self.config.confirmation_blocks)
                    .get_receipt()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                Ok(TxReceipt {
                    tx_hash: self.format_tx_hash(receipt.transaction_hash),
                    block_number: receipt.block_number,
                })
            })
            .await?;

        debug!("Status mirrored with tx {}", receipt.tx_hash);
        Ok(receipt)
    }

    async fn add_deliverable_ref(
        &self,
        ledger_contract_id: &str,
        reference: &str,
    ) -> LedgerResult<TxReceipt> {
        debug!(
            "Adding deliverable reference to ledger contract {}",
            ledger_contract_id
        );

        let contract_id = self.parse_contract_id(ledger_contract_id)?;

        let receipt = self
            .bounded(async {
                let provider = self.client.create_provider_with_signer()?;
                self.check_gas_price(&provider).await?;

                let contract = MarketplaceEscrow::new(*self.client.contract_address(), &provider);

                let pending_tx = contract
                    .addDeliverable(contract_id, reference.to_string())
                    .send()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                let receipt = pending_tx
                    .with_required_confirmations(self.config.confirmation_blocks)
                    .get_receipt()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                Ok(TxReceipt {
                    tx_hash: self.format_tx_hash(receipt.transaction_hash),
                    block_number: receipt.block_number,
                })
            })
            .await?;

        debug!("Deliverable reference added with tx {}", receipt.tx_hash);
        Ok(receipt)
    }

    async fn release(&self, ledger_contract_id: &str) -> LedgerResult<TxReceipt> {
        debug!(
            "Releasing escrowed value for ledger contract {}",
            ledger_contract_id
        );

        let contract_id = self.parse_contract_id(ledger_contract_id)?;

        let receipt = self
            .bounded(async {
                let provider = self.client.create_provider_with_signer()?;
                self.check_gas_price(&provider).await?;

                let contract = MarketplaceEscrow::new(*self.client.contract_address(), &provider);

                let pending_tx = contract
                    .release(contract_id)
                    .send()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                let receipt = pending_tx
                    .with_required_confirmations(self.config.confirmation_blocks)
                    .get_receipt()
                    .await
                    .map_err(|e| EthereumLedgerError::Transaction(e.to_string()))?;

                Ok(TxReceipt {
                    tx_hash: self.format_tx_hash(receipt.transaction_hash),
                    block_number: receipt.block_number,
                })
            })
            .await?;

        info!(
            "Escrowed value released for ledger contract {} (tx {})",
            ledger_contract_id, receipt.tx_hash
        );
        Ok(receipt)
    }
}
