//! Consensus transactions and their signing envelopes.

use crate::hash::Hash;
use crate::quantity::Quantity;
use crate::staking::{self, Address, PUBLIC_KEY_SIZE};
use ed25519_dalek::{PublicKey, Signature as Ed25519Signature, Verifier};
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::TryFrom;
use thiserror::Error;

pub type Gas = u64;

/// Base signature context for consensus transactions, chain separated by
/// appending the chain ID.
pub const SIGNATURE_CONTEXT: &str = "oasis-core/consensus: tx";

pub const SIGNATURE_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("CBOR codec failed: {0}")]
    Cbor(#[from] serde_cbor::Error),
    #[error("malformed {method} body: {source}")]
    MalformedBody {
        method: String,
        source: serde_cbor::Error,
    },
    #[error("malformed public key ({0} bytes)")]
    MalformedPublicKey(usize),
    #[error("malformed signature ({0} bytes)")]
    MalformedSignature(usize),
    #[error("signature verification failed")]
    BadSignature,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default)]
    pub gas: Gas,
    #[serde(default)]
    pub amount: Quantity,
}

/// A consensus transaction. The body is kept as a CBOR value so that
/// transactions of unknown methods still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Fee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_cbor::Value>,
    #[serde(default)]
    pub nonce: u64,
    pub method: String,
}

/// The decoded body of a transaction, tagged by method.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionKind {
    Transfer(staking::Transfer),
    Burn(staking::Burn),
    AddEscrow(staking::Escrow),
    ReclaimEscrow(staking::ReclaimEscrow),
    Unknown(String),
}

impl TransactionKind {
    pub fn method(&self) -> &str {
        match self {
            TransactionKind::Transfer(_) => staking::METHOD_TRANSFER,
            TransactionKind::Burn(_) => staking::METHOD_BURN,
            TransactionKind::AddEscrow(_) => staking::METHOD_ADD_ESCROW,
            TransactionKind::ReclaimEscrow(_) => staking::METHOD_RECLAIM_ESCROW,
            TransactionKind::Unknown(method) => method.as_str(),
        }
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(
    method: &str,
    body: &Option<serde_cbor::Value>,
) -> Result<T, TransactionError> {
    let value = body.clone().unwrap_or(serde_cbor::Value::Null);
    serde_cbor::value::from_value(value).map_err(|source| TransactionError::MalformedBody {
        method: method.to_string(),
        source,
    })
}

impl Transaction {
    pub fn new(nonce: u64, fee: Fee, kind: &TransactionKind) -> Result<Self, TransactionError> {
        let body = match kind {
            TransactionKind::Transfer(b) => Some(serde_cbor::value::to_value(b)?),
            TransactionKind::Burn(b) => Some(serde_cbor::value::to_value(b)?),
            TransactionKind::AddEscrow(b) => Some(serde_cbor::value::to_value(b)?),
            TransactionKind::ReclaimEscrow(b) => Some(serde_cbor::value::to_value(b)?),
            TransactionKind::Unknown(_) => None,
        };
        Ok(Transaction {
            fee: Some(fee),
            body,
            nonce,
            method: kind.method().to_string(),
        })
    }

    pub fn kind(&self) -> Result<TransactionKind, TransactionError> {
        let method = self.method.as_str();
        Ok(match method {
            staking::METHOD_TRANSFER => TransactionKind::Transfer(decode_body(method, &self.body)?),
            staking::METHOD_BURN => TransactionKind::Burn(decode_body(method, &self.body)?),
            staking::METHOD_ADD_ESCROW => {
                TransactionKind::AddEscrow(decode_body(method, &self.body)?)
            }
            staking::METHOD_RECLAIM_ESCROW => {
                TransactionKind::ReclaimEscrow(decode_body(method, &self.body)?)
            }
            other => TransactionKind::Unknown(other.to_string()),
        })
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(raw: &[u8]) -> Result<Self, TransactionError> {
        Ok(serde_cbor::from_slice(raw)?)
    }
}

/// The message an Ed25519 signer signs for a transaction blob on the given
/// chain.
pub fn signer_message(chain_id: &str, blob: &[u8]) -> Vec<u8> {
    let context = format!("{} for chain {}", SIGNATURE_CONTEXT, chain_id);
    Hash::digest_parts(&[context.as_bytes(), blob])
        .as_bytes()
        .to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub public_key: Vec<u8>,
}

impl Signature {
    pub fn new(public_key: &[u8], signature: &[u8]) -> Result<Self, TransactionError> {
        if public_key.len() != PUBLIC_KEY_SIZE {
            return Err(TransactionError::MalformedPublicKey(public_key.len()));
        }
        if signature.len() != SIGNATURE_SIZE {
            return Err(TransactionError::MalformedSignature(signature.len()));
        }
        Ok(Signature {
            signature: signature.to_vec(),
            public_key: public_key.to_vec(),
        })
    }

    pub fn signer_address(&self) -> Result<Address, TransactionError> {
        let pk = <[u8; PUBLIC_KEY_SIZE]>::try_from(self.public_key.as_slice())
            .map_err(|_| TransactionError::MalformedPublicKey(self.public_key.len()))?;
        Ok(Address::from_public_key(&pk))
    }

    pub fn verify(&self, message: &[u8]) -> Result<(), TransactionError> {
        let pk = PublicKey::from_bytes(&self.public_key)
            .map_err(|_| TransactionError::MalformedPublicKey(self.public_key.len()))?;
        let sig = Ed25519Signature::try_from(self.signature.as_slice())
            .map_err(|_| TransactionError::MalformedSignature(self.signature.len()))?;
        pk.verify(message, &sig)
            .map_err(|_| TransactionError::BadSignature)
    }
}

/// A transaction blob together with its signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub signature: Signature,
    #[serde(rename = "untrusted_raw_value", with = "serde_bytes")]
    pub blob: Vec<u8>,
}

impl SignedTransaction {
    pub fn from_cbor(raw: &[u8]) -> Result<Self, TransactionError> {
        Ok(serde_cbor::from_slice(raw)?)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_base64(s: &str) -> Result<Self, TransactionError> {
        Self::from_cbor(&base64::decode(s)?)
    }

    pub fn to_base64(&self) -> Result<String, TransactionError> {
        Ok(base64::encode(self.to_cbor()?))
    }

    pub fn hash(&self) -> Result<Hash, TransactionError> {
        Ok(Hash::digest(&self.to_cbor()?))
    }

    /// Verifies the signature for the given chain and decodes the signed
    /// transaction, returning it together with the signer's address.
    pub fn open(&self, chain_id: &str) -> Result<(Address, Transaction), TransactionError> {
        self.signature
            .verify(&signer_message(chain_id, &self.blob))?;
        let signer = self.signature.signer_address()?;
        let tx = Transaction::from_cbor(&self.blob)?;
        Ok((signer, tx))
    }
}

/// A transaction paired with the address expected to sign it. The
/// transaction itself does not name its signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub tx: serde_cbor::Value,
    pub signer: String,
}

impl UnsignedTransaction {
    pub fn new(tx: &Transaction, signer: &Address) -> Result<Self, TransactionError> {
        Ok(UnsignedTransaction {
            tx: serde_cbor::value::to_value(tx)?,
            signer: signer.to_string(),
        })
    }

    /// The exact bytes that get signed and later submitted.
    pub fn tx_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(serde_cbor::to_vec(&self.tx)?)
    }

    pub fn transaction(&self) -> Result<Transaction, TransactionError> {
        Ok(serde_cbor::value::from_value(self.tx.clone())?)
    }

    pub fn from_base64(s: &str) -> Result<Self, TransactionError> {
        Ok(serde_cbor::from_slice(&base64::decode(s)?)?)
    }

    pub fn to_base64(&self) -> Result<String, TransactionError> {
        Ok(base64::encode(serde_cbor::to_vec(self)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultError {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking: Option<staking::Event>,
}

/// Outcome of executing a transaction in a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    #[serde(default)]
    pub error: ResultError,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<ResultEvent>,
    #[serde(default)]
    pub gas_used: u64,
}

impl TransactionResult {
    pub fn is_success(&self) -> bool {
        self.error.code == 0
    }
}
