//! Minimal ABI plumbing for contracts exposing one `uint256` getter and one
//! `uint256` setter.

use anyhow::{anyhow, bail, Context, Result};
use std::fmt;
use std::str::FromStr;

/// 4-byte function selector.
pub type Selector = [u8; 4];

/// `getValue()`
pub const GET_VALUE: Selector = [0x20, 0x96, 0x52, 0x55];
/// `setValue(uint256)`
pub const SET_VALUE: Selector = [0x55, 0x24, 0x10, 0x77];
/// `getPrice()`
pub const GET_PRICE: Selector = [0x98, 0xd5, 0xfd, 0xca];
/// `setPrice(uint256)`
pub const SET_PRICE: Selector = [0x91, 0xb7, 0xf5, 0xed];

const WORD_LEN: usize = 32;
const ADDRESS_LEN: usize = 20;

/// Getter/setter pair of the target contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiPreset {
    /// `getValue()` / `setValue(uint256)`
    Value,
    /// `getPrice()` / `setPrice(uint256)`
    Price,
}

impl AbiPreset {
    pub fn getter(&self) -> ContractFunction {
        match self {
            AbiPreset::Value => ContractFunction::new("getValue", GET_VALUE),
            AbiPreset::Price => ContractFunction::new("getPrice", GET_PRICE),
        }
    }

    pub fn setter(&self) -> ContractFunction {
        match self {
            AbiPreset::Value => ContractFunction::new("setValue", SET_VALUE),
            AbiPreset::Price => ContractFunction::new("setPrice", SET_PRICE),
        }
    }
}

impl FromStr for AbiPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value" => Ok(AbiPreset::Value),
            "price" => Ok(AbiPreset::Price),
            other => Err(anyhow!("unknown CONTRACT_ABI '{}' (expected value or price)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractFunction {
    pub name: &'static str,
    pub selector: Selector,
}

impl ContractFunction {
    pub const fn new(name: &'static str, selector: Selector) -> Self {
        Self { name, selector }
    }

    /// Call data for a zero-argument call.
    pub fn encode_call(&self) -> String {
        to_prefixed_hex(&self.selector)
    }

    /// Raw call data for a single `uint256` argument.
    pub fn call_data_with(&self, value: u128) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.selector.len() + WORD_LEN);
        data.extend_from_slice(&self.selector);
        data.extend_from_slice(&encode_word(value));
        data
    }

    pub fn encode_call_with(&self, value: u128) -> String {
        to_prefixed_hex(&self.call_data_with(value))
    }
}

impl fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 20-byte account or contract address, rendered in lowercase `0x` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    hex: String,
    bytes: [u8; ADDRESS_LEN],
}

impl Address {
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self {
            hex: to_prefixed_hex(&bytes),
            bytes,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| anyhow!("address '{}' is missing the 0x prefix", trimmed))?;

        let bytes: [u8; ADDRESS_LEN] = hex::decode(digits)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| anyhow!("address '{}' is not 20 hex-encoded bytes", trimmed))?;

        Ok(Address::from_bytes(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Left-pads `value` into a big-endian 256-bit word.
pub fn encode_word(value: u128) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decodes the first 256-bit word of a hex return payload.
///
/// Fails when the payload is short or the value needs more than 128 bits.
pub fn decode_word(data: &str) -> Result<u128> {
    let bytes = decode_hex(data).context("return data is not valid hex")?;
    if bytes.len() < WORD_LEN {
        bail!("return data is {} bytes, expected at least {}", bytes.len(), WORD_LEN);
    }

    let (high, low) = bytes[..WORD_LEN].split_at(WORD_LEN - 16);
    if high.iter().any(|b| *b != 0) {
        bail!("returned uint256 exceeds 128 bits");
    }

    let mut buf = [0u8; 16];
    buf.copy_from_slice(low);
    Ok(u128::from_be_bytes(buf))
}

/// Parses a `0x`-prefixed JSON-RPC quantity such as a block number.
pub fn parse_quantity(quantity: &str) -> Result<u64> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("quantity '{}' is missing the 0x prefix", quantity))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid quantity '{}'", quantity))
}

pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes hex data with or without the `0x` prefix.
pub fn decode_hex(data: &str) -> Result<Vec<u8>> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).with_context(|| format!("malformed hex string '{}'", data))
}
