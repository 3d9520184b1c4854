use crate::models::{self, AccountIdentifier, Amount, ApiError, Currency};
use crate::quantity::Quantity;
use crate::staking::{Address, PUBLIC_KEY_SIZE};
use core::fmt::Display;
use serde_json::map::Map;
use serde_json::Value;
use std::convert::TryFrom;
use thiserror::Error;

/// This module converts between consensus layer values and Rosetta data
/// structures

pub const BLOCKCHAIN: &str = "Oasis";
pub const CURRENCY_SYMBOL: &str = "ROSE";
pub const CURRENCY_DECIMALS: u32 = 9;

pub const SUB_ACCOUNT_GENERAL: &str = "general";
pub const SUB_ACCOUNT_ESCROW: &str = "escrow";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("unsupported currency {symbol} with {decimals} decimals")]
    WrongCurrency { symbol: String, decimals: u32 },
    #[error("malformed amount value '{0}'")]
    Malformed(String),
    #[error("amount '{0}' has the wrong sign")]
    WrongSign(String),
}

pub fn rosetta_currency() -> Currency {
    Currency::new(CURRENCY_SYMBOL.to_string(), CURRENCY_DECIMALS)
}

/// Renders a quantity as a Rosetta amount, negated when it is a debit. Zero is
/// never rendered with a sign.
pub fn to_amount(q: &Quantity, negate: bool) -> Amount {
    let value = if negate && !q.is_zero() {
        format!("-{}", q)
    } else {
        q.to_string()
    };
    Amount::new(value, rosetta_currency())
}

/// Parses a Rosetta amount back into a quantity. A debit must carry a leading
/// minus, a credit must not, zero is accepted either way.
pub fn from_amount(amount: &Amount, negate: bool) -> Result<Quantity, AmountError> {
    let currency = &amount.currency;
    if currency.symbol != CURRENCY_SYMBOL || currency.decimals != CURRENCY_DECIMALS {
        return Err(AmountError::WrongCurrency {
            symbol: currency.symbol.clone(),
            decimals: currency.decimals,
        });
    }

    let (negative, digits) = match amount.value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, amount.value.as_str()),
    };
    let q: Quantity = digits
        .parse()
        .map_err(|_| AmountError::Malformed(amount.value.clone()))?;
    if !q.is_zero() && negative != negate {
        return Err(AmountError::WrongSign(amount.value.clone()));
    }
    Ok(q)
}

pub fn account_identifier(address: &Address) -> AccountIdentifier {
    AccountIdentifier::new(address.to_string())
}

pub fn escrow_account_identifier(address: &Address) -> AccountIdentifier {
    AccountIdentifier::with_sub_account(address.to_string(), SUB_ACCOUNT_ESCROW)
}

// This returns an option because it's what the error type expects, but it will
// always return Some
pub fn into_error(error_msg: String) -> Option<models::Object> {
    let mut m = Map::new();
    m.insert("error_message".to_string(), Value::from(error_msg));
    Some(m)
}

pub fn malformed_value<D: Display>(msg: D) -> ApiError {
    ApiError::MalformedValue(into_error(format!("{}", msg)))
}

pub fn invalid_account_address<D: Display>(msg: D) -> ApiError {
    ApiError::InvalidAccountAddress(into_error(format!("{}", msg)))
}

pub fn from_hex(hex: &str) -> Result<Vec<u8>, ApiError> {
    hex::decode(hex)
        .map_err(|e| malformed_value(format!("Hex could not be decoded {}", e)))
}

pub fn to_hex(v: &[u8]) -> String {
    hex::encode(v)
}

pub fn from_public_key(pk: &models::PublicKey) -> Result<[u8; PUBLIC_KEY_SIZE], ApiError> {
    if pk.curve_type != models::CurveType::EDWARDS25519 {
        return Err(malformed_value(format!(
            "unsupported curve type {:?}",
            pk.curve_type
        )));
    }
    let bytes = from_hex(&pk.hex_bytes)?;
    <[u8; PUBLIC_KEY_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
        malformed_value(format!(
            "public key must be {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            bytes.len()
        ))
    })
}

pub fn to_address(text: &str) -> Result<Address, ApiError> {
    if text.is_empty() {
        return Err(invalid_account_address("empty address"));
    }
    text.parse().map_err(invalid_account_address)
}
