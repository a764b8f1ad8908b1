use anyhow::Result;
use std::fmt;

use super::aggregator::Aggregator;
use super::encoder;
use super::random::RandomRange;
use super::updater::{LedgerUpdater, TransactionRecord, UpdateTarget};
use crate::api;
use crate::core::{Config, OracleMode, OracleResult};
use crate::ledger::{JsonRpcLedger, LedgerClient};

/// Where the run's value comes from.
pub enum Acquisition {
    /// A single generated integer; nothing to aggregate.
    Random(RandomRange),
    /// Mean of several price providers.
    Aggregate(Aggregator),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanonicalValue {
    Counter(u64),
    Price(f64),
}

impl CanonicalValue {
    /// On-chain integer for this value. Counters are written as-is; prices
    /// are fixed-point scaled by `10^decimals`.
    pub fn encode(&self, decimals: u32) -> OracleResult<u128> {
        match *self {
            CanonicalValue::Counter(value) => Ok(u128::from(value)),
            CanonicalValue::Price(value) => encoder::encode(value, decimals),
        }
    }
}

impl fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalValue::Counter(value) => write!(f, "{}", value),
            CanonicalValue::Price(value) => write!(f, "{}", value),
        }
    }
}

/// One acquire → encode → commit pass.
pub struct Oracle<C: LedgerClient> {
    acquisition: Acquisition,
    decimals: u32,
    updater: LedgerUpdater<C>,
}

impl Oracle<JsonRpcLedger> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let acquisition = match config.oracle.mode {
            OracleMode::Random => Acquisition::Random(RandomRange::new(
                config.oracle.random_min,
                config.oracle.random_max,
            )?),
            OracleMode::Price => {
                Acquisition::Aggregate(Aggregator::new(api::price_sources(&config.sources)?))
            }
        };

        let client = JsonRpcLedger::new(
            config.ledger.rpc_url.clone(),
            config.ledger.receipt_poll_interval(),
            config.ledger.rpc_timeout(),
        )?;
        let updater = LedgerUpdater::new(
            client,
            UpdateTarget::from_config(&config.ledger),
            config.ledger.confirmation_timeout(),
        )
        .with_readback_verification(config.ledger.verify_readback);

        Ok(Oracle::new(acquisition, config.oracle.price_decimals, updater))
    }
}

impl<C: LedgerClient> Oracle<C> {
    pub fn new(acquisition: Acquisition, decimals: u32, updater: LedgerUpdater<C>) -> Self {
        Self {
            acquisition,
            decimals,
            updater,
        }
    }

    pub async fn acquire(&self) -> OracleResult<CanonicalValue> {
        match &self.acquisition {
            Acquisition::Random(range) => {
                let value = range.generate();
                tracing::info!("🎲 Generated random value: {}", value);
                Ok(CanonicalValue::Counter(value))
            }
            Acquisition::Aggregate(aggregator) => {
                tracing::info!("Fetching from {:?}", aggregator.source_names());
                aggregator.fetch_all().await.map(CanonicalValue::Price)
            }
        }
    }

    pub async fn run(&self) -> OracleResult<TransactionRecord> {
        // Bad addresses should fail before any provider is queried.
        self.updater.preflight()?;

        let value = self.acquire().await?;
        let encoded = value.encode(self.decimals)?;

        if let CanonicalValue::Price(_) = value {
            tracing::info!(
                "Encoded {} as {} ({} decimals, exact {})",
                value,
                encoded,
                self.decimals,
                encoder::decode(encoded, self.decimals)?
            );
        }

        self.updater.update(encoded).await
    }
}
