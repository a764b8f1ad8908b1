pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, LedgerConfig, OracleConfig, OracleMode, SourcesConfig};
pub use error::{OracleError, OracleResult};
