use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::types::CoinGeckoSimplePrice;
use crate::core::SourcesConfig;
use crate::oracle::ValueSource;

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    coin_id: String,
    quote_currency: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            base_url: config.coingecko_base_url.trim_end_matches('/').to_string(),
            coin_id: config.coingecko_coin_id.to_lowercase(),
            quote_currency: config.quote_currency.to_lowercase(),
            api_key: config.coingecko_api_key.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            self.base_url, self.coin_id, self.quote_currency
        )
    }

    pub fn extract_price(&self, body: &CoinGeckoSimplePrice) -> Result<f64> {
        body.get(&self.coin_id)
            .and_then(|quotes| quotes.get(&self.quote_currency))
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "response has no {}.{} price",
                    self.coin_id,
                    self.quote_currency
                )
            })
    }
}

#[async_trait]
impl ValueSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<f64> {
        let mut request = self.client.get(self.endpoint());
        // The public API works keyless; a demo key only raises rate limits.
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let body: CoinGeckoSimplePrice = super::get_json(request, self.name()).await?;
        self.extract_price(&body)
    }
}
