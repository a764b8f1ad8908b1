use thiserror::Error;

pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Failure taxonomy for a single oracle run.
///
/// Only `SourceFetchFailed` is recoverable: the aggregator records it against
/// the source and moves on. Every other variant aborts the run.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("source {source_name} failed: {reason}")]
    SourceFetchFailed { source_name: String, reason: String },
    #[error("no value sources produced a result")]
    NoSourcesAvailable,
    #[error("value {value} with {decimals} decimals does not fit the on-chain integer width")]
    EncodingOverflow { value: f64, decimals: u32 },
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("failed to read contract value: {0}")]
    LedgerReadFailed(String),
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
    #[error("transaction confirmation failed: {0}")]
    ConfirmationFailed(String),
    #[error("contract reports {observed} after update, expected {expected}")]
    ReadbackMismatch { expected: u128, observed: u128 },
}

impl OracleError {
    /// Whether the run must abort when this error surfaces.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, OracleError::SourceFetchFailed { .. })
    }
}
