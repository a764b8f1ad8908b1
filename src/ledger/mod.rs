pub mod abi;
pub mod rpc;
pub mod signer;

pub use abi::{AbiPreset, Address, ContractFunction};
pub use rpc::JsonRpcLedger;
pub use signer::{LegacyTransaction, LocalSigner, Signer};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inclusion proof returned once a transaction has been mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    /// False when the transaction was mined but reverted.
    pub succeeded: bool,
}

/// Ledger access used by the updater. Gas and nonce handling belong to the
/// implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Calls a read-only `uint256` getter.
    async fn read(&self, contract: &Address, getter: ContractFunction) -> Result<u128>;

    /// Sends a state-changing call with one `uint256` argument, authorized by
    /// `signer`, and returns the transaction hash.
    async fn submit(
        &self,
        contract: &Address,
        signer: &Signer,
        setter: ContractFunction,
        value: u128,
    ) -> Result<String>;

    /// Resolves once the transaction is included in a block. Never times out
    /// on its own; callers bound it.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt>;
}
