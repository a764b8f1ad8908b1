pub mod coingecko;
pub mod coinmarketcap;
pub mod types;

pub use coingecko::CoinGeckoClient;
pub use coinmarketcap::CoinMarketCapClient;
pub use types::*;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::core::SourcesConfig;
use crate::oracle::ValueSource;

pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("oracle-updater/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Every configured price provider, in a fixed order. Providers whose API key
/// is missing are still returned; the aggregator skips them.
pub fn price_sources(config: &SourcesConfig) -> Result<Vec<Box<dyn ValueSource>>> {
    let client = http_client(config.http_timeout())?;

    let sources: Vec<Box<dyn ValueSource>> = vec![
        Box::new(CoinMarketCapClient::new(client.clone(), config)),
        Box::new(CoinGeckoClient::new(client, config)),
    ];
    Ok(sources)
}

/// Sends a GET and decodes the JSON body. Non-2xx is an error carrying the
/// response text.
async fn get_json<T: DeserializeOwned>(request: RequestBuilder, provider: &str) -> Result<T> {
    let response = request
        .header("Accept", "application/json")
        .send()
        .await
        .with_context(|| format!("{} request failed", provider))?;
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::debug!("{} API error: {} - {}", provider, status, error_text);
        return Err(anyhow!("{} returned {} - {}", provider, status, error_text));
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", provider))
}
