use anyhow::{anyhow, Result};
use async_trait::async_trait;
use oracle_updater::ledger::{
    AbiPreset, Address, ContractFunction, LedgerClient, Signer, TransactionReceipt,
};
use oracle_updater::oracle::{
    Acquisition, Aggregator, LedgerUpdater, Oracle, RandomRange, UpdateTarget, ValueSource,
};
use oracle_updater::OracleError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const SIGNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

#[derive(Default)]
struct LedgerState {
    value: Mutex<u128>,
    reads: AtomicUsize,
    submits: AtomicUsize,
}

/// In-memory contract. `hang` makes confirmation never resolve.
struct FakeLedger {
    state: Arc<LedgerState>,
    hang: bool,
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn read(&self, _contract: &Address, _getter: ContractFunction) -> Result<u128> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        Ok(*self.state.value.lock().unwrap())
    }

    async fn submit(
        &self,
        _contract: &Address,
        _signer: &Signer,
        _setter: ContractFunction,
        value: u128,
    ) -> Result<String> {
        self.state.submits.fetch_add(1, Ordering::SeqCst);
        *self.state.value.lock().unwrap() = value;
        Ok("0x01".to_string())
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(TransactionReceipt {
            transaction_hash: tx_hash.to_string(),
            block_number: 12,
            succeeded: true,
        })
    }
}

struct FixedSource {
    name: &'static str,
    reading: Option<f64>,
}

#[async_trait]
impl ValueSource for FixedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> Result<f64> {
        self.reading.ok_or_else(|| anyhow!("{} returned 503 Service Unavailable", self.name))
    }
}

fn source(name: &'static str, reading: Option<f64>) -> Box<dyn ValueSource> {
    Box::new(FixedSource { name, reading })
}

fn oracle(acquisition: Acquisition, hang: bool, timeout: Duration) -> (Oracle<FakeLedger>, Arc<LedgerState>) {
    let state = Arc::new(LedgerState::default());
    let ledger = FakeLedger {
        state: state.clone(),
        hang,
    };
    let target = UpdateTarget {
        contract_address: Some(CONTRACT.to_string()),
        private_key: None,
        signer_address: Some(SIGNER.to_string()),
        getter: AbiPreset::Price.getter(),
        setter: AbiPreset::Price.setter(),
    };

    let updater = LedgerUpdater::new(ledger, target, timeout);
    (Oracle::new(acquisition, 8, updater), state)
}

fn price_oracle(sources: Vec<Box<dyn ValueSource>>) -> (Oracle<FakeLedger>, Arc<LedgerState>) {
    oracle(
        Acquisition::Aggregate(Aggregator::new(sources)),
        false,
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn single_price_source_is_committed_with_eight_decimals() {
    let (oracle, state) = price_oracle(vec![source("coingecko", Some(65000.12))]);

    let record = oracle.run().await.unwrap();

    assert_eq!(record.value_submitted, 6_500_012_000_000);
    assert_eq!(record.value_after, 6_500_012_000_000);
    assert_eq!(record.block_number, 12);
    assert_eq!(state.reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn midpoint_price_rounds_half_up() {
    // 2^-9 sits exactly between two steps at eight decimals
    let (oracle, _) = price_oracle(vec![source("coingecko", Some(0.001953125))]);

    let record = oracle.run().await.unwrap();
    assert_eq!(record.value_submitted, 195_313);
}

#[tokio::test]
async fn two_sources_commit_their_mean() {
    let (oracle, _) = price_oracle(vec![
        source("coinmarketcap", Some(65010.00)),
        source("coingecko", Some(64990.00)),
    ]);

    let record = oracle.run().await.unwrap();
    assert_eq!(record.value_submitted, 6_500_000_000_000);
}

#[tokio::test]
async fn failing_source_is_absorbed() {
    let (oracle, _) = price_oracle(vec![
        source("coinmarketcap", None),
        source("coingecko", Some(64990.00)),
    ]);

    let record = oracle.run().await.unwrap();
    assert_eq!(record.value_submitted, 6_499_000_000_000);
}

#[tokio::test]
async fn all_sources_failing_submits_nothing() {
    let (oracle, state) = price_oracle(vec![
        source("coinmarketcap", None),
        source("coingecko", None),
    ]);

    let err = oracle.run().await.unwrap_err();

    assert!(matches!(err, OracleError::NoSourcesAvailable));
    assert_eq!(state.submits.load(Ordering::SeqCst), 0);
    assert_eq!(state.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn confirmation_timeout_skips_read_after() {
    let (oracle, state) = oracle(
        Acquisition::Aggregate(Aggregator::new(vec![source("coingecko", Some(1.0))])),
        true,
        Duration::from_millis(50),
    );

    let err = oracle.run().await.unwrap_err();

    assert!(matches!(err, OracleError::ConfirmationFailed(_)));
    assert_eq!(state.submits.load(Ordering::SeqCst), 1);
    assert_eq!(state.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn random_mode_commits_value_in_range() {
    let (oracle, state) = oracle(
        Acquisition::Random(RandomRange::default()),
        false,
        Duration::from_secs(5),
    );

    let record = oracle.run().await.unwrap();

    assert!((1..=1_000_000).contains(&record.value_submitted));
    assert_eq!(*state.value.lock().unwrap(), record.value_submitted);
}
