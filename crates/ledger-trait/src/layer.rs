//! Ledger layer identification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enum representing the supported ledger layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerLayer {
    /// Ethereum mainnet and testnets
    Ethereum,
    /// Polygon (MATIC)
    Polygon,
    /// Base L2
    Base,
}

impl fmt::Display for LedgerLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ethereum => write!(f, "Ethereum"),
            Self::Polygon => write!(f, "Polygon"),
            Self::Base => write!(f, "Base"),
        }
    }
}

impl LedgerLayer {
    /// All current layers are EVM chains; kept as a method so non-EVM
    /// layers can be added without touching call sites.
    pub fn is_evm(&self) -> bool {
        matches!(self, Self::Ethereum | Self::Polygon | Self::Base)
    }

    /// Determine the layer from an EVM chain ID
    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            137 | 80002 => Self::Polygon,       // Polygon, Amoy
            8453 | 84532 => Self::Base,         // Base, Base Sepolia
            _ => Self::Ethereum,                // Mainnet, Holesky, local anvil
        }
    }
}
