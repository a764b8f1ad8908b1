use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::types::CmcResponse;
use crate::core::SourcesConfig;
use crate::oracle::ValueSource;

pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    symbol: String,
    convert: String,
    api_key: Option<String>,
}

impl CoinMarketCapClient {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            base_url: config.coinmarketcap_base_url.trim_end_matches('/').to_string(),
            symbol: config.coinmarketcap_symbol.to_uppercase(),
            convert: config.quote_currency.to_uppercase(),
            api_key: config.coinmarketcap_api_key.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/cryptocurrency/quotes/latest?symbol={}&convert={}",
            self.base_url, self.symbol, self.convert
        )
    }

    pub fn extract_price(&self, body: &CmcResponse) -> Result<f64> {
        if let Some(status) = &body.status {
            if status.error_code != 0 {
                bail!(
                    "error {}: {}",
                    status.error_code,
                    status.error_message.as_deref().unwrap_or("unknown")
                );
            }
        }

        body.data
            .get(&self.symbol)
            .and_then(|listings| listings.first())
            .and_then(|listing| listing.quote.get(&self.convert))
            .and_then(|quote| quote.price)
            .ok_or_else(|| {
                anyhow!(
                    "response has no data.{}.quote.{}.price",
                    self.symbol,
                    self.convert
                )
            })
    }
}

#[async_trait]
impl ValueSource for CoinMarketCapClient {
    fn name(&self) -> &str {
        "coinmarketcap"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self) -> Result<f64> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("CMC_API_KEY is not configured"))?;

        let request = self
            .client
            .get(self.endpoint())
            .header("X-CMC_PRO_API_KEY", key);

        let body: CmcResponse = super::get_json(request, self.name()).await?;
        self.extract_price(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use serde_json::json;

    fn client(api_key: Option<&str>) -> CoinMarketCapClient {
        let key = api_key.map(str::to_string);
        let config = Config::from_lookup(|name| match name {
            "CMC_API_KEY" => key.clone(),
            _ => None,
        })
        .unwrap();
        CoinMarketCapClient::new(Client::new(), &config.sources)
    }

    fn parse(value: serde_json::Value) -> CmcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_endpoint_uses_upper_case_codes() {
        assert_eq!(
            client(None).endpoint(),
            "https://pro-api.coinmarketcap.com/v1/cryptocurrency/quotes/latest?symbol=BTC&convert=USD"
        );
    }

    #[test]
    fn test_available_only_with_key() {
        assert!(!client(None).is_available());
        assert!(client(Some("secret")).is_available());
    }

    #[tokio::test]
    async fn test_fetch_without_key_does_no_io() {
        let err = client(None).fetch().await.unwrap_err();
        assert!(err.to_string().contains("CMC_API_KEY"));
    }

    #[test]
    fn test_extracts_price_from_single_listing() {
        let body = parse(json!({
            "status": { "error_code": 0, "error_message": null },
            "data": { "BTC": { "symbol": "BTC", "quote": { "USD": { "price": 65010.0 } } } }
        }));
        assert_eq!(client(Some("k")).extract_price(&body).unwrap(), 65010.0);
    }

    #[test]
    fn test_extracts_price_from_listing_array() {
        let body = parse(json!({
            "data": { "BTC": [ { "symbol": "BTC", "quote": { "USD": { "price": 64990.5 } } } ] }
        }));
        assert_eq!(client(Some("k")).extract_price(&body).unwrap(), 64990.5);
    }

    #[test]
    fn test_api_status_error_is_reported() {
        let body = parse(json!({
            "status": { "error_code": 1002, "error_message": "API key missing." },
            "data": {}
        }));
        let err = client(Some("k")).extract_price(&body).unwrap_err();
        assert!(err.to_string().contains("1002"));
    }

    #[test]
    fn test_missing_price_is_malformed() {
        let body = parse(json!({
            "data": { "BTC": { "symbol": "BTC", "quote": { "USD": { "price": null } } } }
        }));
        assert!(client(Some("k")).extract_price(&body).is_err());
    }
}
