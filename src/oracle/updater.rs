use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::core::{LedgerConfig, OracleError, OracleResult};
use crate::ledger::{Address, ContractFunction, LedgerClient, LocalSigner, Signer};

/// Outcome of a confirmed update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub block_number: u64,
    pub confirmed_at: DateTime<Utc>,
    pub value_before: u128,
    pub value_submitted: u128,
    pub value_after: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Preflight,
    ReadBefore,
    Submit,
    Confirm,
    ReadAfter,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateStage::Preflight => "preflight",
            UpdateStage::ReadBefore => "read-before",
            UpdateStage::Submit => "submit",
            UpdateStage::Confirm => "confirm",
            UpdateStage::ReadAfter => "read-after",
        };
        f.write_str(name)
    }
}

/// Contract and credential an update targets, as configured. Any of them may
/// be missing until preflight checks it.
#[derive(Clone)]
pub struct UpdateTarget {
    pub contract_address: Option<String>,
    pub private_key: Option<String>,
    pub signer_address: Option<String>,
    pub getter: ContractFunction,
    pub setter: ContractFunction,
}

impl UpdateTarget {
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            contract_address: config.contract_address.clone(),
            private_key: config.private_key.clone(),
            signer_address: config.signer_address.clone(),
            getter: config.abi.getter(),
            setter: config.abi.setter(),
        }
    }
}

/// Contract and signer that passed preflight.
#[derive(Debug, Clone)]
pub struct Accounts {
    pub contract: Address,
    pub signer: Signer,
}

/// Drives one write through preflight, read-before, submit, confirm and
/// read-after. Any failing stage aborts the update.
pub struct LedgerUpdater<C: LedgerClient> {
    client: C,
    target: UpdateTarget,
    confirmation_timeout: Duration,
    verify_readback: bool,
}

impl<C: LedgerClient> LedgerUpdater<C> {
    pub fn new(client: C, target: UpdateTarget, confirmation_timeout: Duration) -> Self {
        Self {
            client,
            target,
            confirmation_timeout,
            verify_readback: false,
        }
    }

    /// Fail the update when the post-update read disagrees with the value
    /// submitted. Off by default: a confirmed transaction is trusted.
    pub fn with_readback_verification(mut self, enabled: bool) -> Self {
        self.verify_readback = enabled;
        self
    }

    pub async fn update(&self, new_value: u128) -> OracleResult<TransactionRecord> {
        let accounts = self.preflight()?;
        let value_before = self.read_before(&accounts).await?;
        let hash = self.submit(&accounts, new_value).await?;
        let block_number = self.confirm(&hash).await?;
        let confirmed_at = Utc::now();
        let value_after = self.read_after(&accounts, new_value).await?;

        Ok(TransactionRecord {
            hash,
            block_number,
            confirmed_at,
            value_before,
            value_submitted: new_value,
            value_after,
        })
    }

    pub fn preflight(&self) -> OracleResult<Accounts> {
        let signer = self.signer()?;
        let contract = require(&self.target.contract_address, "CONTRACT_ADDRESS")?;

        let contract: Address = contract
            .parse()
            .map_err(|e| OracleError::InvalidConfiguration(format!("CONTRACT_ADDRESS: {}", e)))?;

        tracing::debug!(
            stage = %UpdateStage::Preflight,
            "Updating {} as {}",
            contract,
            signer.address()
        );
        Ok(Accounts { contract, signer })
    }

    /// A private key wins over a node-managed account.
    fn signer(&self) -> OracleResult<Signer> {
        if let Ok(key) = require(&self.target.private_key, "PRIVATE_KEY") {
            let local: LocalSigner = key
                .parse()
                .map_err(|e| OracleError::InvalidConfiguration(format!("PRIVATE_KEY: {}", e)))?;

            if let Some(configured) = self.target.signer_address.as_deref() {
                if !configured.trim().eq_ignore_ascii_case(local.address().as_str()) {
                    tracing::warn!(
                        "⚠️ SIGNER_ADDRESS {} ignored; signing as {}",
                        configured.trim(),
                        local.address()
                    );
                }
            }
            return Ok(Signer::Local(local));
        }

        let address = require(&self.target.signer_address, "PRIVATE_KEY or SIGNER_ADDRESS")?;
        let address: Address = address
            .parse()
            .map_err(|e| OracleError::InvalidConfiguration(format!("SIGNER_ADDRESS: {}", e)))?;
        Ok(Signer::Node(address))
    }

    pub async fn read_before(&self, accounts: &Accounts) -> OracleResult<u128> {
        let value = self.read(accounts).await?;
        tracing::info!(stage = %UpdateStage::ReadBefore, "Current contract value: {}", value);
        Ok(value)
    }

    pub async fn submit(&self, accounts: &Accounts, value: u128) -> OracleResult<String> {
        let hash = self
            .client
            .submit(&accounts.contract, &accounts.signer, self.target.setter, value)
            .await
            .map_err(|e| OracleError::SubmissionFailed(format!("{:#}", e)))?;

        tracing::info!(
            stage = %UpdateStage::Submit,
            "📤 {}({}) sent, transaction hash: {}",
            self.target.setter,
            value,
            hash
        );
        Ok(hash)
    }

    pub async fn confirm(&self, hash: &str) -> OracleResult<u64> {
        let receipt = tokio::time::timeout(self.confirmation_timeout, self.client.wait_for_receipt(hash))
            .await
            .map_err(|_| {
                OracleError::ConfirmationFailed(format!(
                    "{} not mined within {:?}",
                    hash, self.confirmation_timeout
                ))
            })?
            .map_err(|e| OracleError::ConfirmationFailed(format!("{:#}", e)))?;

        if !receipt.succeeded {
            return Err(OracleError::ConfirmationFailed(format!(
                "{} reverted in block {}",
                hash, receipt.block_number
            )));
        }

        tracing::info!(
            stage = %UpdateStage::Confirm,
            "✅ Transaction confirmed in block {}",
            receipt.block_number
        );
        Ok(receipt.block_number)
    }

    pub async fn read_after(&self, accounts: &Accounts, expected: u128) -> OracleResult<u128> {
        let value = self.read(accounts).await?;
        tracing::info!(stage = %UpdateStage::ReadAfter, "New contract value: {}", value);

        if self.verify_readback && value != expected {
            return Err(OracleError::ReadbackMismatch {
                expected,
                observed: value,
            });
        }
        Ok(value)
    }

    async fn read(&self, accounts: &Accounts) -> OracleResult<u128> {
        self.client
            .read(&accounts.contract, self.target.getter)
            .await
            .map_err(|e| OracleError::LedgerReadFailed(format!("{}: {:#}", self.target.getter, e)))
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> OracleResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OracleError::ConfigurationMissing(format!("{} is required", name)))
}
