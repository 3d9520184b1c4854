//! Mapping between consensus transactions and Rosetta operations.
//!
//! Three pieces live here: the matcher turning a list of operations back into
//! an unsigned transaction, the [`Emitter`] producing the canonical operations
//! for a transaction, and the [`TransactionsDecoder`] replaying block contents
//! (transactions, results and staking events) into Rosetta transactions.

use crate::convert::{
    account_identifier, escrow_account_identifier, from_amount, to_amount, AmountError,
    SUB_ACCOUNT_ESCROW,
};
use crate::hash::Hash;
use crate::models::{self, Amount, Object, Operation, OperationIdentifier};
use crate::quantity::Quantity;
use crate::staking::{self, Address, COMMON_POOL_ADDRESS, FEE_ACCUMULATOR_ADDRESS};
use crate::transaction::{
    Fee, Gas, SignedTransaction, Transaction, TransactionError, TransactionKind,
    TransactionResult,
};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const STATUS_OK: &str = "OK";
pub const STATUS_FAILED: &str = "Failed";

pub const FEE_GAS_KEY: &str = "fee_gas";
pub const RECLAIM_ESCROW_SHARES_KEY: &str = "reclaim_escrow_shares";
pub const NONCE_KEY: &str = "nonce";

/// Gas limit used when the operations do not specify one.
pub const DEFAULT_GAS: Gas = 10000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Transfer,
    Burn,
    ReclaimEscrow,
}

impl OperationType {
    pub fn all() -> Vec<OperationType> {
        vec![
            OperationType::Transfer,
            OperationType::Burn,
            OperationType::ReclaimEscrow,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Transfer => "Transfer",
            OperationType::Burn => "Burn",
            OperationType::ReclaimEscrow => "ReclaimEscrow",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = OperationsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationType::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OperationsError::Unsupported(format!("operation type '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationsError {
    #[error("unsupported operations: {0}")]
    Unsupported(String),
    #[error("malformed operations: {0}")]
    Malformed(String),
}

impl From<AmountError> for OperationsError {
    fn from(e: AmountError) -> Self {
        OperationsError::Malformed(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed transaction: {0}")]
    Malformed(#[source] TransactionError),
    #[error("bad transaction signature: {0}")]
    BadSignature(#[source] TransactionError),
    #[error("bad transaction: {0}")]
    BadTransaction(#[source] TransactionError),
}

// Matcher

fn op_type(op: &Operation) -> Option<OperationType> {
    op._type.parse().ok()
}

fn sub_account(op: &Operation) -> Option<&str> {
    op.account
        .as_ref()
        .and_then(|a| a.sub_account.as_ref())
        .map(|s| s.address.as_str())
}

fn is_escrow(op: &Operation) -> bool {
    sub_account(op) == Some(SUB_ACCOUNT_ESCROW)
}

fn op_address(op: &Operation, what: &str) -> Result<Address, OperationsError> {
    let account = op.account.as_ref().ok_or_else(|| {
        OperationsError::Malformed(format!("{} operation has no account", what))
    })?;
    account.address.parse().map_err(|e| {
        OperationsError::Malformed(format!("invalid {} address ({}): {}", what, account.address, e))
    })
}

fn op_amount(op: &Operation, negate: bool, what: &str) -> Result<Quantity, OperationsError> {
    let amount = op.amount.as_ref().ok_or_else(|| {
        OperationsError::Malformed(format!("{} operation has no amount", what))
    })?;
    from_amount(amount, negate)
        .map_err(|e| OperationsError::Malformed(format!("invalid {} amount: {}", what, e)))
}

fn has_fee(ops: &[Operation]) -> bool {
    ops.len() >= 2
        && op_type(&ops[0]) == Some(OperationType::Transfer)
        && op_type(&ops[1]) == Some(OperationType::Transfer)
        && ops[1]
            .account
            .as_ref()
            .map(|a| a.address == FEE_ACCUMULATOR_ADDRESS.to_string())
            .unwrap_or(false)
}

/// Gas from the fee debit's metadata. Integral floats such as `2000.0` are
/// accepted since JSON clients often cannot tell the two apart.
fn fee_gas(op: &Operation) -> Result<Gas, OperationsError> {
    let v = match op.metadata.as_ref().and_then(|m| m.get(FEE_GAS_KEY)) {
        None => return Ok(DEFAULT_GAS),
        Some(v) => v,
    };
    let gas = v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    });
    gas.ok_or_else(|| {
        OperationsError::Malformed(format!("malformed fee transfer gas metadata: {}", v))
    })
}

/// Operation indices must run 0, 1, 2... in list order, and an operation may
/// only relate to operations that precede it.
fn check_indices(ops: &[Operation]) -> Result<(), OperationsError> {
    for (i, op) in ops.iter().enumerate() {
        let i = i as i64;
        let index = op.operation_identifier.index;
        if index != i {
            return Err(OperationsError::Malformed(format!(
                "operation index {} out of sequence (expected: {})",
                index, i
            )));
        }
        for related in op.related_operations.iter().flatten() {
            if related.index < 0 || related.index >= i {
                return Err(OperationsError::Malformed(format!(
                    "operation {} relates to operation {}, which does not precede it",
                    i, related.index
                )));
            }
        }
    }
    Ok(())
}

/// Extracts the fee from the leading fee pair, together with the address
/// paying it. Without a fee pair the fee is zero with the default gas.
fn get_fee(ops: &[Operation]) -> Result<(Option<Address>, Fee), OperationsError> {
    if !has_fee(ops) {
        return Ok((
            None,
            Fee {
                gas: DEFAULT_GAS,
                amount: Quantity::zero(),
            },
        ));
    }

    let (debit, credit) = (&ops[0], &ops[1]);
    if let Some(sub) = sub_account(debit) {
        return Err(OperationsError::Malformed(format!(
            "fee transfer from wrong subaccount (got: {} expected: none)",
            sub
        )));
    }
    let signer = op_address(debit, "fee transfer from")?;
    let amount = op_amount(debit, true, "fee transfer from")?;
    let gas = fee_gas(debit)?;

    if let Some(sub) = sub_account(credit) {
        return Err(OperationsError::Malformed(format!(
            "fee transfer to wrong subaccount (got: {} expected: none)",
            sub
        )));
    }
    let credited = op_amount(credit, false, "fee transfer to")?;
    if amount != credited {
        return Err(OperationsError::Malformed(format!(
            "fee transfer amounts differ between operations (from: {} to: {})",
            amount, credited
        )));
    }
    Ok((Some(signer), Fee { gas, amount }))
}

fn check_signer(
    signer: Option<Address>,
    from: Address,
    what: &str,
) -> Result<Address, OperationsError> {
    match signer {
        Some(s) if s != from => Err(OperationsError::Malformed(format!(
            "{} from doesn't match signer (from: {} signer: {})",
            what, from, s
        ))),
        _ => Ok(from),
    }
}

/// Builds the transaction described by a list of operations, returning the
/// address expected to sign it. The nonce is left at zero for the caller to
/// fill in.
pub fn operations_to_transaction(
    ops: &[Operation],
) -> Result<(Address, Transaction), OperationsError> {
    check_indices(ops)?;
    let (fee_signer, fee) = get_fee(ops)?;
    let rest = if has_fee(ops) { &ops[2..] } else { ops };

    let types: Vec<Option<OperationType>> = rest.iter().map(op_type).collect();
    use OperationType as T;
    let (signer, kind) = match types.as_slice() {
        [Some(T::Transfer), Some(T::Transfer)]
            if sub_account(&rest[0]).is_none() && sub_account(&rest[1]).is_none() =>
        {
            let from = check_signer(fee_signer, op_address(&rest[0], "transfer")?, "transfer")?;
            let amount = op_amount(&rest[0], true, "transfer from")?;
            let to = op_address(&rest[1], "transfer to")?;
            let credited = op_amount(&rest[1], false, "transfer to")?;
            if amount != credited {
                return Err(OperationsError::Malformed(format!(
                    "transfer amounts differ between operations (from: {} to: {})",
                    amount, credited
                )));
            }
            (from, TransactionKind::Transfer(staking::Transfer { to, amount }))
        }
        [Some(T::Burn)] if sub_account(&rest[0]).is_none() => {
            let from = check_signer(fee_signer, op_address(&rest[0], "burn")?, "burn")?;
            let amount = op_amount(&rest[0], true, "burn from")?;
            (from, TransactionKind::Burn(staking::Burn { amount }))
        }
        [Some(T::Transfer), Some(T::Transfer)]
            if sub_account(&rest[0]).is_none() && is_escrow(&rest[1]) =>
        {
            let from = check_signer(fee_signer, op_address(&rest[0], "add escrow")?, "add escrow")?;
            let amount = op_amount(&rest[0], true, "add escrow from")?;
            let account = op_address(&rest[1], "add escrow to")?;
            let credited = op_amount(&rest[1], false, "add escrow to")?;
            if amount != credited {
                return Err(OperationsError::Malformed(format!(
                    "add escrow amounts differ between operations (from: {} to: {})",
                    amount, credited
                )));
            }
            (
                from,
                TransactionKind::AddEscrow(staking::Escrow { amount, account }),
            )
        }
        [Some(T::ReclaimEscrow), Some(T::ReclaimEscrow)] if is_escrow(&rest[1]) => {
            let from = check_signer(
                fee_signer,
                op_address(&rest[0], "reclaim escrow")?,
                "reclaim escrow",
            )?;
            if rest[0].amount.is_some() || rest[1].amount.is_some() {
                return Err(OperationsError::Malformed(
                    "reclaim escrow operations must not carry amounts".to_string(),
                ));
            }
            let account = op_address(&rest[1], "reclaim escrow from")?;
            let shares = match rest[1]
                .metadata
                .as_ref()
                .and_then(|m| m.get(RECLAIM_ESCROW_SHARES_KEY))
            {
                Some(Value::String(s)) => s.parse::<Quantity>().map_err(|e| {
                    OperationsError::Malformed(format!("invalid reclaim escrow shares: {}", e))
                })?,
                _ => {
                    return Err(OperationsError::Malformed(
                        "missing or malformed reclaim escrow shares metadata".to_string(),
                    ))
                }
            };
            (
                from,
                TransactionKind::ReclaimEscrow(staking::ReclaimEscrow { shares, account }),
            )
        }
        _ => {
            let names: Vec<&str> = rest.iter().map(|op| op._type.as_str()).collect();
            return Err(OperationsError::Unsupported(format!("[{}]", names.join(", "))));
        }
    };

    let tx = Transaction::new(0, fee, &kind)
        .map_err(|e| OperationsError::Malformed(e.to_string()))?;
    Ok((signer, tx))
}

// Emitter

/// Appends the canonical operations for a transaction to an existing list.
pub struct Emitter<'a> {
    tx: &'a Transaction,
    signer: &'a Address,
    status: Option<String>,
    ops: Vec<Operation>,
}

impl<'a> Emitter<'a> {
    pub fn new(
        tx: &'a Transaction,
        signer: &'a Address,
        status: Option<&str>,
        ops: Vec<Operation>,
    ) -> Self {
        Emitter {
            tx,
            signer,
            status: status.map(str::to_string),
            ops,
        }
    }

    fn push(
        &mut self,
        typ: OperationType,
        account: models::AccountIdentifier,
        amount: Option<Amount>,
        related: Option<i64>,
    ) -> i64 {
        let index = self.ops.len() as i64;
        let mut op = Operation::new(
            index,
            typ.to_string(),
            self.status.clone(),
            Some(account),
            amount,
        );
        op.related_operations = related.map(|r| vec![OperationIdentifier::new(r)]);
        self.ops.push(op);
        index
    }

    fn set_metadata(&mut self, index: i64, key: &str, value: Value) {
        if let Some(op) = self.ops.get_mut(index as usize) {
            op.metadata
                .get_or_insert_with(Object::new)
                .insert(key.to_string(), value);
        }
    }

    /// Emits the fee pair, unless the transaction pays no fee.
    pub fn emit_fee_ops(&mut self) {
        let fee = match &self.tx.fee {
            Some(fee) if !fee.amount.is_zero() => fee.clone(),
            _ => return,
        };
        let debit = self.push(
            OperationType::Transfer,
            account_identifier(self.signer),
            Some(to_amount(&fee.amount, true)),
            None,
        );
        self.set_metadata(debit, FEE_GAS_KEY, Value::from(fee.gas));
        self.push(
            OperationType::Transfer,
            account_identifier(&FEE_ACCUMULATOR_ADDRESS),
            Some(to_amount(&fee.amount, false)),
            Some(debit),
        );
    }

    pub fn emit_tx_ops(&mut self) -> Result<(), TransactionError> {
        let signer = account_identifier(self.signer);
        match self.tx.kind()? {
            TransactionKind::Transfer(body) => {
                let debit = self.push(
                    OperationType::Transfer,
                    signer,
                    Some(to_amount(&body.amount, true)),
                    None,
                );
                self.push(
                    OperationType::Transfer,
                    account_identifier(&body.to),
                    Some(to_amount(&body.amount, false)),
                    Some(debit),
                );
            }
            TransactionKind::Burn(body) => {
                self.push(
                    OperationType::Burn,
                    signer,
                    Some(to_amount(&body.amount, true)),
                    None,
                );
            }
            TransactionKind::AddEscrow(body) => {
                let debit = self.push(
                    OperationType::Transfer,
                    signer,
                    Some(to_amount(&body.amount, true)),
                    None,
                );
                self.push(
                    OperationType::Transfer,
                    escrow_account_identifier(&body.account),
                    Some(to_amount(&body.amount, false)),
                    Some(debit),
                );
            }
            TransactionKind::ReclaimEscrow(body) => {
                let first = self.push(OperationType::ReclaimEscrow, signer, None, None);
                let second = self.push(
                    OperationType::ReclaimEscrow,
                    escrow_account_identifier(&body.account),
                    None,
                    Some(first),
                );
                self.set_metadata(
                    second,
                    RECLAIM_ESCROW_SHARES_KEY,
                    Value::from(body.shares.to_string()),
                );
            }
            TransactionKind::Unknown(_) => {}
        }
        Ok(())
    }

    pub fn operations(self) -> Vec<Operation> {
        self.ops
    }
}

// Decoder

/// Accumulates Rosetta transactions for a block. Transactions are kept in
/// first-seen order and keyed by hash.
pub struct TransactionsDecoder<'a> {
    chain_id: &'a str,
    txs: Vec<models::Transaction>,
    index: HashMap<Hash, usize>,
}

impl<'a> TransactionsDecoder<'a> {
    pub fn new(chain_id: &'a str) -> Self {
        TransactionsDecoder {
            chain_id,
            txs: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn get_or_create_tx(&mut self, hash: Hash) -> usize {
        if let Some(idx) = self.index.get(&hash) {
            return *idx;
        }
        let idx = self.txs.len();
        self.txs.push(models::Transaction::new(
            models::TransactionIdentifier::new(hash.to_string()),
            vec![],
        ));
        self.index.insert(hash, idx);
        idx
    }

    /// Decodes one raw signed transaction. `result` is `None` for transactions
    /// that have not been executed yet, in which case the operations are an
    /// estimate reported as OK.
    ///
    /// A body that cannot be decoded fails only the synthesized operations:
    /// the transaction stays in the decoder with its event operations and the
    /// error is still returned.
    pub fn decode_tx(
        &mut self,
        raw: &[u8],
        result: Option<&TransactionResult>,
    ) -> Result<(), DecodeError> {
        let signed = SignedTransaction::from_cbor(raw).map_err(DecodeError::Malformed)?;
        let (signer, tx) = signed
            .open(self.chain_id)
            .map_err(DecodeError::BadSignature)?;

        // Events are kept even when the body turns out to be undecodable, the
        // node has already applied them.
        let idx = self.get_or_create_tx(Hash::digest(raw));
        if let Some(result) = result {
            for ev in &result.events {
                if let Some(ev) = &ev.staking {
                    append_event_ops(&mut self.txs[idx].operations, ev);
                }
            }
        }

        let status = match result {
            Some(r) if r.is_success() => return Ok(()),
            Some(_) => STATUS_FAILED,
            None => STATUS_OK,
        };
        let ops = self.txs[idx].operations.clone();
        let fee_emitted = has_fee(&ops);
        let mut emitter = Emitter::new(&tx, &signer, Some(status), ops);
        if !fee_emitted {
            emitter.emit_fee_ops();
        }
        emitter
            .emit_tx_ops()
            .map_err(DecodeError::BadTransaction)?;
        self.txs[idx].operations = emitter.operations();
        Ok(())
    }

    /// Decodes every transaction of a block, returning the ones that failed
    /// together with their position in the block.
    pub fn decode_txs(
        &mut self,
        raw_txs: &[Vec<u8>],
        results: &[TransactionResult],
    ) -> Vec<(usize, DecodeError)> {
        let mut skipped = vec![];
        for (i, raw) in raw_txs.iter().enumerate() {
            if let Err(e) = self.decode_tx(raw, results.get(i)) {
                skipped.push((i, e));
            }
        }
        skipped
    }

    /// Replays block-level events, i.e. the ones not caused by a transaction,
    /// under a pseudo transaction named after the block hash.
    pub fn decode_block(&mut self, block_hash: &Hash, events: &[staking::Event]) {
        for ev in events.iter().filter(|ev| ev.tx_hash.is_empty()) {
            let idx = self.get_or_create_tx(*block_hash);
            append_event_ops(&mut self.txs[idx].operations, ev);
        }
    }

    pub fn into_transactions(self) -> Vec<models::Transaction> {
        self.txs
    }
}

fn append_op(
    ops: &mut Vec<Operation>,
    typ: OperationType,
    account: models::AccountIdentifier,
    amount: Amount,
) {
    let index = ops.len() as i64;
    let mut op = Operation::new(
        index,
        typ.to_string(),
        Some(STATUS_OK.to_string()),
        Some(account),
        Some(amount),
    );
    if index >= 1 {
        op.related_operations = Some(vec![OperationIdentifier::new(index - 1)]);
    }
    ops.push(op);
}

fn append_event_ops(ops: &mut Vec<Operation>, ev: &staking::Event) {
    use OperationType::*;
    if let Some(t) = &ev.transfer {
        append_op(ops, Transfer, account_identifier(&t.from), to_amount(&t.amount, true));
        append_op(ops, Transfer, account_identifier(&t.to), to_amount(&t.amount, false));
    }
    if let Some(b) = &ev.burn {
        append_op(ops, Burn, account_identifier(&b.owner), to_amount(&b.amount, true));
    }
    if let Some(escrow) = &ev.escrow {
        if let Some(add) = &escrow.add {
            append_op(
                ops,
                Transfer,
                account_identifier(&add.owner),
                to_amount(&add.amount, true),
            );
            append_op(
                ops,
                Transfer,
                escrow_account_identifier(&add.escrow),
                to_amount(&add.amount, false),
            );
        }
        if let Some(take) = &escrow.take {
            append_op(
                ops,
                Transfer,
                escrow_account_identifier(&take.owner),
                to_amount(&take.amount, true),
            );
            append_op(
                ops,
                Transfer,
                account_identifier(&COMMON_POOL_ADDRESS),
                to_amount(&take.amount, false),
            );
        }
        if let Some(reclaim) = &escrow.reclaim {
            append_op(
                ops,
                Transfer,
                escrow_account_identifier(&reclaim.escrow),
                to_amount(&reclaim.amount, true),
            );
            append_op(
                ops,
                Transfer,
                account_identifier(&reclaim.owner),
                to_amount(&reclaim.amount, false),
            );
        }
    }
}

#[cfg(test)]
mod tests;
