//! Staking layer types: addresses, transaction bodies, events and account
//! state as served by the node.

use crate::hash::Hash;
use crate::quantity::Quantity;
use bech32::{FromBase32, ToBase32, Variant};
use lazy_static::lazy_static;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ADDRESS_SIZE: usize = 21;
pub const PUBLIC_KEY_SIZE: usize = 32;

const ADDRESS_V0_CONTEXT: &[u8] = b"oasis-core/address: staking";
const ADDRESS_V0_VERSION: u8 = 0;
const ADDRESS_BECH32_HRP: &str = "oasis";

const COMMON_POOL_PUBLIC_KEY: &str =
    "1abe11edc001ffffffffffffffffffffffffffffffffffffffffffffffffffff";
const FEE_ACCUMULATOR_PUBLIC_KEY: &str =
    "1abe11edfeeaccffffffffffffffffffffffffffffffffffffffffffffffffff";

pub const METHOD_TRANSFER: &str = "staking.Transfer";
pub const METHOD_BURN: &str = "staking.Burn";
pub const METHOD_ADD_ESCROW: &str = "staking.AddEscrow";
pub const METHOD_RECLAIM_ESCROW: &str = "staking.ReclaimEscrow";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("malformed address: {0}")]
    Malformed(String),
    #[error("unexpected address prefix '{0}'")]
    WrongPrefix(String),
    #[error("invalid address length {0}")]
    InvalidLength(usize),
    #[error("unsupported address version {0}")]
    UnsupportedVersion(u8),
}

/// A staking account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

lazy_static! {
    /// Account holding undistributed rewards and slashed stake.
    pub static ref COMMON_POOL_ADDRESS: Address = reserved_address(COMMON_POOL_PUBLIC_KEY);
    /// Account collecting transaction fees until they are disbursed.
    pub static ref FEE_ACCUMULATOR_ADDRESS: Address =
        reserved_address(FEE_ACCUMULATOR_PUBLIC_KEY);
}

fn reserved_address(public_key_hex: &str) -> Address {
    let mut pk = [0u8; PUBLIC_KEY_SIZE];
    // Both reserved keys are compile time constants of the right length.
    if let Ok(bytes) = hex::decode(public_key_hex) {
        pk.copy_from_slice(&bytes);
    }
    Address::from_public_key(&pk)
}

impl Address {
    /// Derives the address owned by an entity or account public key.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_SIZE]) -> Self {
        let h = Hash::digest_parts(&[
            ADDRESS_V0_CONTEXT,
            &[ADDRESS_V0_VERSION][..],
            &public_key[..],
        ]);
        let mut raw = [0u8; ADDRESS_SIZE];
        raw[0] = ADDRESS_V0_VERSION;
        raw[1..].copy_from_slice(&h.as_bytes()[..ADDRESS_SIZE - 1]);
        Address(raw)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        if bytes[0] != ADDRESS_V0_VERSION {
            return Err(AddressError::UnsupportedVersion(bytes[0]));
        }
        let mut raw = [0u8; ADDRESS_SIZE];
        raw.copy_from_slice(bytes);
        Ok(Address(raw))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = bech32::encode(ADDRESS_BECH32_HRP, self.0.to_base32(), Variant::Bech32)
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data, variant) =
            bech32::decode(s).map_err(|e| AddressError::Malformed(e.to_string()))?;
        if hrp != ADDRESS_BECH32_HRP {
            return Err(AddressError::WrongPrefix(hrp));
        }
        if variant != Variant::Bech32 {
            return Err(AddressError::Malformed("not a bech32 string".to_string()));
        }
        let bytes =
            Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Malformed(e.to_string()))?;
        Address::from_bytes(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a {} byte staking address", ADDRESS_SIZE)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Address::from_bytes(v).map_err(E::custom)
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&v)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(AddressVisitor)
    }
}

// Transaction bodies. Field order is the canonical CBOR key order.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: Address,
    #[serde(default)]
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Burn {
    #[serde(default)]
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escrow {
    #[serde(default)]
    pub amount: Quantity,
    pub account: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReclaimEscrow {
    #[serde(default)]
    pub shares: Quantity,
    pub account: Address,
}

// Events.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    #[serde(default)]
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnEvent {
    pub owner: Address,
    #[serde(default)]
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEscrowEvent {
    pub owner: Address,
    pub escrow: Address,
    #[serde(default)]
    pub amount: Quantity,
    #[serde(default)]
    pub new_shares: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeEscrowEvent {
    pub owner: Address,
    #[serde(default)]
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReclaimEscrowEvent {
    pub owner: Address,
    pub escrow: Address,
    #[serde(default)]
    pub amount: Quantity,
    #[serde(default)]
    pub shares: Quantity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscrowEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<AddEscrowEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<TakeEscrowEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim: Option<ReclaimEscrowEvent>,
}

/// A staking event. Exactly one of the payload fields is set; kinds this
/// gateway does not know about decode with every payload empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub tx_hash: Hash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burn: Option<BurnEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow: Option<EscrowEvent>,
}

// Account state.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralAccount {
    #[serde(default)]
    pub balance: Quantity,
    #[serde(default)]
    pub nonce: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharePool {
    #[serde(default)]
    pub balance: Quantity,
    #[serde(default)]
    pub total_shares: Quantity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscrowAccount {
    #[serde(default)]
    pub active: SharePool,
    #[serde(default)]
    pub debonding: SharePool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub general: GeneralAccount,
    #[serde(default)]
    pub escrow: EscrowAccount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delegation {
    #[serde(default)]
    pub shares: Quantity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebondingDelegation {
    #[serde(default)]
    pub shares: Quantity,
    #[serde(default)]
    pub debond_end: u64,
}

pub type Delegations = BTreeMap<Address, Delegation>;
pub type DebondingDelegations = BTreeMap<Address, Vec<DebondingDelegation>>;
