use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `/api/v3/simple/price` body: coin id -> quote currency -> price.
pub type CoinGeckoSimplePrice = HashMap<String, HashMap<String, f64>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmcResponse {
    pub status: Option<CmcStatus>,
    #[serde(default)]
    pub data: HashMap<String, OneOrMany<CmcListing>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmcStatus {
    pub error_code: i64,
    pub error_message: Option<String>,
}

/// v1 quotes return one listing per symbol, v2 a list of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(item) => Some(item),
            OneOrMany::Many(items) => items.first(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmcListing {
    pub symbol: String,
    pub quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmcQuote {
    pub price: Option<f64>,
}
