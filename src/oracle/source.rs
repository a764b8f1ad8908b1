use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::core::OracleError;

/// A provider of one numeric reading per run.
#[async_trait]
pub trait ValueSource: Send + Sync {
    fn name(&self) -> &str;

    /// False when a credential the source needs is absent. Unavailable
    /// sources are skipped without any I/O.
    fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceOutcome {
    Value { value: f64 },
    Failed { reason: String },
    Skipped,
}

/// What one source produced during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    pub source: String,
    pub outcome: SourceOutcome,
}

impl SourceResult {
    pub fn value(source: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            outcome: SourceOutcome::Value { value },
        }
    }

    pub fn failed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            outcome: SourceOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn skipped(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            outcome: SourceOutcome::Skipped,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self.outcome {
            SourceOutcome::Value { value } => Some(value),
            _ => None,
        }
    }

    /// The recoverable error this result stands for, if it failed.
    pub fn error(&self) -> Option<OracleError> {
        match &self.outcome {
            SourceOutcome::Failed { reason } => Some(OracleError::SourceFetchFailed {
                source_name: self.source.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_values_expose_a_reading() {
        assert_eq!(SourceResult::value("coingecko", 1.5).as_value(), Some(1.5));
        assert_eq!(SourceResult::failed("cmc", "HTTP 500").as_value(), None);
        assert_eq!(SourceResult::skipped("cmc").as_value(), None);
    }

    #[test]
    fn test_failed_result_maps_to_source_error() {
        let err = SourceResult::failed("coinmarketcap", "HTTP 429").error().unwrap();
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "source coinmarketcap failed: HTTP 429");

        assert!(SourceResult::skipped("coinmarketcap").error().is_none());
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let json = serde_json::to_value(SourceResult::failed("cmc", "timeout")).unwrap();
        assert_eq!(json["source"], "cmc");
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["reason"], "timeout");
    }
}
