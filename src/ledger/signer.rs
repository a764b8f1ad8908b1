//! Write authorization: a local secp256k1 key, or an account the node manages.

use anyhow::{anyhow, bail, Context, Result};
use k256::ecdsa::{RecoveryId, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use super::abi::{self, Address};

const KEY_LEN: usize = 32;

/// Account that authorizes a write.
#[derive(Debug, Clone)]
pub enum Signer {
    /// Signs locally; the node only relays the raw transaction.
    Local(LocalSigner),
    /// Unlocked account on the node, used with `eth_sendTransaction`.
    Node(Address),
}

impl Signer {
    pub fn address(&self) -> &Address {
        match self {
            Signer::Local(signer) => signer.address(),
            Signer::Node(address) => address,
        }
    }
}

/// Private key held in process. Its address is derived from the public key.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    pub fn new(key: SigningKey) -> Self {
        let point = key.verifying_key().as_affine().to_encoded_point(false);
        // keccak of the uncompressed point without its 0x04 tag
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);

        Self {
            key,
            address: Address::from_bytes(address),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Signs `tx` under EIP-155 and returns the raw transaction bytes.
    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> Result<Vec<u8>> {
        let hash = Keccak256::digest(tx.signing_payload());
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&hash)
            .context("Failed to sign transaction")?;

        // Only low-s signatures are valid on chain.
        let (signature, recovery_id) = match signature.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (signature, recovery_id),
        };

        let v = tx.chain_id * 2 + 35 + u64::from(recovery_id.to_byte());
        let bytes = signature.to_bytes();
        let (r, s) = bytes.split_at(KEY_LEN);

        Ok(tx.encode_signed(v, r, s))
    }
}

impl FromStr for LocalSigner {
    type Err = anyhow::Error;

    /// Parses a hex private key. Errors never echo the key.
    fn from_str(s: &str) -> Result<Self> {
        let bytes = abi::decode_hex(s.trim()).map_err(|_| anyhow!("private key is not valid hex"))?;
        if bytes.len() != KEY_LEN {
            bail!("private key is {} bytes, expected {}", bytes.len(), KEY_LEN);
        }

        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| anyhow!("private key is not a valid secp256k1 scalar"))?;
        Ok(LocalSigner::new(key))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Pre-London transaction, signed with the chain id folded into `v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u64,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    /// RLP of the fields plus `(chain_id, 0, 0)`; its keccak hash is what
    /// gets signed.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream
            .append(&self.chain_id)
            .append_empty_data()
            .append_empty_data();
        stream.out().to_vec()
    }

    fn encode_signed(&self, v: u64, r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream
            .append(&v)
            .append(&trim_leading_zeros(r))
            .append(&trim_leading_zeros(s));
        stream.out().to_vec()
    }

    fn append_fields(&self, stream: &mut RlpStream) {
        stream
            .append(&self.nonce)
            .append(&self.gas_price)
            .append(&self.gas_limit)
            .append(&self.to.as_bytes().to_vec())
            .append(&self.value)
            .append(&self.data);
    }
}

/// RLP integers are minimal big-endian.
fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}
