use anyhow::{anyhow, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::ledger::AbiPreset;

#[derive(Debug, Clone)]
pub struct Config {
    pub oracle: OracleConfig,
    pub ledger: LedgerConfig,
    pub sources: SourcesConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleMode {
    /// Commit a uniformly drawn integer, unscaled.
    Random,
    /// Commit the mean of the configured price providers, fixed-point encoded.
    Price,
}

impl FromStr for OracleMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(OracleMode::Random),
            "price" => Ok(OracleMode::Price),
            other => Err(anyhow!("unknown ORACLE_MODE '{}' (expected random or price)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub mode: OracleMode,
    pub random_min: u64,
    pub random_max: u64,
    pub price_decimals: u32,
}

#[derive(Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    /// Hex secp256k1 key; writes are signed locally when set.
    pub private_key: Option<String>,
    /// Node-managed account, used only without a private key.
    pub signer_address: Option<String>,
    pub abi: AbiPreset,
    pub rpc_timeout_secs: u64,
    pub confirmation_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
    pub verify_readback: bool,
}

impl fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("signer_address", &self.signer_address)
            .field("abi", &self.abi)
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("receipt_poll_interval_ms", &self.receipt_poll_interval_ms)
            .field("verify_readback", &self.verify_readback)
            .finish()
    }
}

impl LedgerConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub coingecko_base_url: String,
    pub coingecko_coin_id: String,
    pub coingecko_api_key: Option<String>,
    pub coinmarketcap_base_url: String,
    pub coinmarketcap_symbol: String,
    pub coinmarketcap_api_key: Option<String>,
    pub quote_currency: String,
    pub http_timeout_secs: u64,
}

impl SourcesConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parse_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let mode: OracleMode = parse_or("ORACLE_MODE", "random").parse()?;

        let abi = match get("CONTRACT_ABI") {
            Some(name) => name.parse()?,
            None => match mode {
                OracleMode::Random => AbiPreset::Value,
                OracleMode::Price => AbiPreset::Price,
            },
        };

        Ok(Config {
            oracle: OracleConfig {
                mode,
                random_min: parse_or("RANDOM_MIN", "1").parse().unwrap_or(1),
                random_max: parse_or("RANDOM_MAX", "1000000").parse().unwrap_or(1_000_000),
                price_decimals: parse_or("PRICE_DECIMALS", "8").parse().unwrap_or(8),
            },
            ledger: LedgerConfig {
                rpc_url: parse_or("RPC_URL", "http://127.0.0.1:8545"),
                contract_address: get("CONTRACT_ADDRESS"),
                private_key: get("PRIVATE_KEY"),
                signer_address: get("SIGNER_ADDRESS"),
                abi,
                rpc_timeout_secs: parse_or("RPC_TIMEOUT_SECS", "30").parse().unwrap_or(30),
                confirmation_timeout_secs: parse_or("CONFIRMATION_TIMEOUT_SECS", "120")
                    .parse()
                    .unwrap_or(120),
                receipt_poll_interval_ms: parse_or("RECEIPT_POLL_INTERVAL_MS", "1000")
                    .parse()
                    .unwrap_or(1000),
                verify_readback: parse_or("VERIFY_READBACK", "false")
                    .parse()
                    .unwrap_or(false),
            },
            sources: SourcesConfig {
                coingecko_base_url: parse_or("COINGECKO_BASE_URL", "https://api.coingecko.com"),
                coingecko_coin_id: parse_or("COINGECKO_COIN_ID", "bitcoin"),
                coingecko_api_key: get("COINGECKO_API_KEY"),
                coinmarketcap_base_url: parse_or(
                    "CMC_BASE_URL",
                    "https://pro-api.coinmarketcap.com",
                ),
                coinmarketcap_symbol: parse_or("CMC_SYMBOL", "BTC"),
                coinmarketcap_api_key: get("CMC_API_KEY"),
                quote_currency: parse_or("QUOTE_CURRENCY", "usd"),
                http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", "10").parse().unwrap_or(10),
            },
            monitoring: MonitoringConfig {
                log_level: parse_or("LOG_LEVEL", "info"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.oracle.mode, OracleMode::Random);
        assert_eq!(config.oracle.random_min, 1);
        assert_eq!(config.oracle.random_max, 1_000_000);
        assert_eq!(config.oracle.price_decimals, 8);
        assert_eq!(config.ledger.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.ledger.abi, AbiPreset::Value);
        assert!(config.ledger.contract_address.is_none());
        assert!(config.ledger.private_key.is_none());
        assert!(config.ledger.signer_address.is_none());
        assert_eq!(config.ledger.rpc_timeout(), Duration::from_secs(30));
        assert!(!config.ledger.verify_readback);
        assert_eq!(config.ledger.confirmation_timeout(), Duration::from_secs(120));
        assert!(config.sources.coinmarketcap_api_key.is_none());
        assert_eq!(config.monitoring.log_level, "info");
    }

    #[test]
    fn test_price_mode_selects_price_abi() {
        let config = config_from(&[("ORACLE_MODE", "PRICE"), ("PRICE_DECIMALS", "6")]).unwrap();

        assert_eq!(config.oracle.mode, OracleMode::Price);
        assert_eq!(config.ledger.abi, AbiPreset::Price);
        assert_eq!(config.oracle.price_decimals, 6);
    }

    #[test]
    fn test_explicit_abi_overrides_mode() {
        let config = config_from(&[("ORACLE_MODE", "price"), ("CONTRACT_ABI", "value")]).unwrap();
        assert_eq!(config.ledger.abi, AbiPreset::Value);
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_from(&[("CMC_API_KEY", "  "), ("CONTRACT_ADDRESS", "")]).unwrap();

        assert!(config.sources.coinmarketcap_api_key.is_none());
        assert!(config.ledger.contract_address.is_none());
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config_from(&[("RANDOM_MAX", "lots"), ("HTTP_TIMEOUT_SECS", "-3")]).unwrap();

        assert_eq!(config.oracle.random_max, 1_000_000);
        assert_eq!(config.sources.http_timeout_secs, 10);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(config_from(&[("ORACLE_MODE", "weather")]).is_err());
        assert!(config_from(&[("CONTRACT_ABI", "erc20")]).is_err());
    }

    #[test]
    fn test_rpc_timeout_is_configurable() {
        let config = config_from(&[("RPC_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(config.ledger.rpc_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_private_key_is_redacted_in_debug() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let config = config_from(&[("PRIVATE_KEY", key)]).unwrap();

        assert_eq!(config.ledger.private_key.as_deref(), Some(key));
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("ac0974be"));
        assert!(rendered.contains("<redacted>"));
    }
}
