use futures::future::join_all;

use super::source::{SourceResult, ValueSource};
use crate::core::{OracleError, OracleResult};

/// Queries every configured source once and reduces the readings to their
/// mean. A failing source only removes itself from the mean.
pub struct Aggregator {
    sources: Vec<Box<dyn ValueSource>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Box<dyn ValueSource>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch_all(&self) -> OracleResult<f64> {
        let results = self.collect().await;
        let value = aggregate(&results)?;

        let used = results.iter().filter(|r| r.as_value().is_some()).count();
        tracing::info!(
            "📊 Aggregated value {} from {}/{} sources",
            value,
            used,
            results.len()
        );

        Ok(value)
    }

    /// One result per source, in configuration order. Fetches run
    /// concurrently.
    pub async fn collect(&self) -> Vec<SourceResult> {
        let attempts = self.sources.iter().map(|source| async move {
            let name = source.name();

            if !source.is_available() {
                tracing::info!("Skipping {}: credential not configured", name);
                return SourceResult::skipped(name);
            }

            match source.fetch().await {
                Ok(value) if value.is_finite() => {
                    tracing::info!("{} reported {}", name, value);
                    SourceResult::value(name, value)
                }
                Ok(value) => {
                    tracing::warn!("⚠️ {} reported a non-finite value: {}", name, value);
                    SourceResult::failed(name, format!("non-finite value {}", value))
                }
                Err(e) => {
                    tracing::warn!("⚠️ {} fetch failed: {:#}", name, e);
                    SourceResult::failed(name, format!("{:#}", e))
                }
            }
        });

        join_all(attempts).await
    }
}

/// Mean of the successful readings.
pub fn aggregate(results: &[SourceResult]) -> OracleResult<f64> {
    let values: Vec<f64> = results.iter().filter_map(SourceResult::as_value).collect();
    mean(&values).ok_or(OracleError::NoSourcesAvailable)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as f64;
    let total: f64 = values.iter().sum();
    if total.is_finite() {
        return Some(total / count);
    }

    // Readings near f64::MAX overflow the running total.
    Some(values.iter().map(|v| v / count).sum())
}
