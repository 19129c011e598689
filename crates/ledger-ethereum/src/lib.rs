//! Ethereum Ledger Bridge Implementation
//!
//! This crate provides an Ethereum and EVM-compatible implementation of the
//! `LedgerBridge` trait from `fairlance-ledger-trait`, backed by a deployed
//! escrow contract.
//!
//! # Features
//!
//! - Type-safe contract bindings via Alloy
//! - Support for Ethereum, Polygon, Base, and all EVM chains
//! - Gas-price ceiling and confirmation waits
//! - Every round trip bounded by a configurable timeout
//!
//! # Example
//!
//! ```ignore
//! use fairlance_ledger_ethereum::{EthereumLedger, EthereumLedgerConfig};
//! use fairlance_ledger_trait::LedgerBridge;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EthereumLedgerConfig {
//!     rpc_url: "https://rpc-amoy.polygon.technology".to_string(),
//!     chain_id: 80002,
//!     contract_address: "0xF1C921CEf0c62e7a15cef3D04dFc3e2e7Eb90165".to_string(),
//!     ..Default::default()
//! };
//!
//! let ledger = EthereumLedger::new(config)?;
//! let registered = ledger
//!     .register_contract("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", 5000, "ipfs://terms")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod bridge;
pub mod client;
pub mod config;
pub mod error;

pub use bridge::EthereumLedger;
pub use client::EscrowClient;
pub use config::EthereumLedgerConfig;
pub use error::{EthereumLedgerError, Result};

/// Re-export the LedgerBridge trait for convenience
pub use fairlance_ledger_trait::LedgerBridge;
