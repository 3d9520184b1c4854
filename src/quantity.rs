use num_bigint::BigUint;
use num_traits::Zero;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid digit in quantity '{0}'")]
    InvalidDigit(String),
}

/// An arbitrary precision non-negative token amount in base units.
///
/// On the wire it is a big-endian byte string without leading zeros, the
/// text form is plain base-10.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(BigUint);

impl Quantity {
    pub fn zero() -> Self {
        Quantity(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Quantity(BigUint::from_bytes_be(bytes))
    }

    pub fn to_be_bytes(&self) -> Vec<u8> {
        if self.is_zero() {
            vec![]
        } else {
            self.0.to_bytes_be()
        }
    }
}

impl From<u64> for Quantity {
    fn from(v: u64) -> Self {
        Quantity(BigUint::from(v))
    }
}

impl From<u128> for Quantity {
    fn from(v: u128) -> Self {
        Quantity(BigUint::from(v))
    }
}

impl From<BigUint> for Quantity {
    fn from(v: BigUint) -> Self {
        Quantity(v)
    }
}

impl<'a> Add<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    fn add(self, other: &'a Quantity) -> Quantity {
        Quantity(&self.0 + &other.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QuantityError::InvalidDigit(s.to_string()));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Quantity)
            .ok_or_else(|| QuantityError::InvalidDigit(s.to_string()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({})", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_be_bytes())
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a big-endian quantity byte string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(Quantity::from_be_bytes(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&v)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(QuantityVisitor)
    }
}
