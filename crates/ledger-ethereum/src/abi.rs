//! Contract ABI bindings
//!
//! Alloy-generated bindings for the MarketplaceEscrow contract. The
//! interface is declared inline; it must match the deployed Solidity
//! contract exactly.

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    contract MarketplaceEscrow {
        /// Mirrors the Solidity `Status` enum; ordering is part of the
        /// deployed ABI.
        enum Status {
            Pending,
            Active,
            Completed,
            Cancelled
        }

        event ContractRegistered(
            uint256 indexed contractId,
            address indexed freelancer,
            uint256 lockedValue,
            string termsRef
        );

        event StatusUpdated(uint256 indexed contractId, uint8 status);

        event PaymentReleased(uint256 indexed contractId, address indexed freelancer, uint256 amount);

        /// Registers a new escrow contract for `freelancer`, locking
        /// `msg.value` until release or cancellation.
        function registerContract(address freelancer, string calldata termsRef)
            external
            payable
            returns (uint256 contractId);

        function updateStatus(uint256 contractId, uint8 status) external;

        function addDeliverable(uint256 contractId, string calldata reference) external;

        function release(uint256 contractId) external;

        function getStatus(uint256 contractId) external view returns (uint8);

        function getLockedValue(uint256 contractId) external view returns (uint256);
    }
}
