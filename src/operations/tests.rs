use super::*;
use crate::models::AccountIdentifier;
use crate::staking::{
    AddEscrowEvent, BurnEvent, EscrowEvent, Event, ReclaimEscrowEvent, TakeEscrowEvent,
    TransferEvent,
};
use crate::transaction::{signer_message, ResultError, ResultEvent, Signature};
use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer};
use serde_json::json;

const CHAIN_ID: &str = "test-chain";

struct OperationBuilder(Operation);
impl OperationBuilder {
    fn new(idx: i64, typ: OperationType) -> Self {
        Self(Operation::new(idx, typ.to_string(), None, None, None))
    }

    fn account(self, address: &Address) -> Self {
        Self(Operation {
            account: Some(account_identifier(address)),
            ..self.0
        })
    }

    fn escrow(self, address: &Address) -> Self {
        Self(Operation {
            account: Some(AccountIdentifier::with_sub_account(
                address.to_string(),
                SUB_ACCOUNT_ESCROW,
            )),
            ..self.0
        })
    }

    fn debit(self, amount: u64) -> Self {
        Self(Operation {
            amount: Some(to_amount(&Quantity::from(amount), true)),
            ..self.0
        })
    }

    fn credit(self, amount: u64) -> Self {
        Self(Operation {
            amount: Some(to_amount(&Quantity::from(amount), false)),
            ..self.0
        })
    }

    fn related(self, idx: i64) -> Self {
        Self(Operation {
            related_operations: Some(vec![OperationIdentifier::new(idx)]),
            ..self.0
        })
    }

    fn status(self, status: &str) -> Self {
        Self(Operation {
            status: Some(status.to_string()),
            ..self.0
        })
    }

    fn metadata(mut self, key: &str, value: Value) -> Self {
        self.0
            .metadata
            .get_or_insert_with(Object::new)
            .insert(key.to_string(), value);
        self
    }

    fn build(self) -> Operation {
        self.0
    }
}

fn keypair(seed: u8) -> Keypair {
    let secret = SecretKey::from_bytes(&[seed; 32]).unwrap();
    let public = PublicKey::from(&secret);
    Keypair { secret, public }
}

fn address(seed: u8) -> Address {
    Address::from_public_key(keypair(seed).public.as_bytes())
}

fn sign(tx: &Transaction, seed: u8) -> Vec<u8> {
    let kp = keypair(seed);
    let blob = tx.to_cbor().unwrap();
    let sig = kp.sign(&signer_message(CHAIN_ID, &blob));
    let signature = Signature::new(kp.public.as_bytes(), &sig.to_bytes()).unwrap();
    SignedTransaction { signature, blob }.to_cbor().unwrap()
}

fn burn_tx(fee: u64) -> Transaction {
    Transaction::new(
        0,
        Fee {
            gas: 1000,
            amount: Quantity::from(fee),
        },
        &TransactionKind::Burn(staking::Burn {
            amount: Quantity::from(10u64),
        }),
    )
    .unwrap()
}

fn fee_ops(from: &Address, amount: u64, gas: u64) -> Vec<Operation> {
    vec![
        OperationBuilder::new(0, OperationType::Transfer)
            .account(from)
            .debit(amount)
            .metadata(FEE_GAS_KEY, json!(gas))
            .build(),
        OperationBuilder::new(1, OperationType::Transfer)
            .account(&FEE_ACCUMULATOR_ADDRESS)
            .credit(amount)
            .related(0)
            .build(),
    ]
}

fn reemit(ops: &[Operation]) -> Vec<Operation> {
    let (signer, tx) = operations_to_transaction(ops).unwrap();
    let mut emitter = Emitter::new(&tx, &signer, None, vec![]);
    emitter.emit_fee_ops();
    emitter.emit_tx_ops().unwrap();
    emitter.operations()
}

fn failed_result() -> TransactionResult {
    TransactionResult {
        error: ResultError {
            module: "staking".to_string(),
            code: 5,
            message: "insufficient balance".to_string(),
        },
        events: vec![],
        gas_used: 0,
    }
}

fn staking_event(ev: Event) -> ResultEvent {
    ResultEvent { staking: Some(ev) }
}

#[test]
fn test_transfer_with_fee_round_trip() {
    let (a, b) = (address(1), address(2));
    let mut ops = fee_ops(&a, 100, 2000);
    ops.push(
        OperationBuilder::new(2, OperationType::Transfer)
            .account(&a)
            .debit(1000)
            .build(),
    );
    ops.push(
        OperationBuilder::new(3, OperationType::Transfer)
            .account(&b)
            .credit(1000)
            .related(2)
            .build(),
    );
    assert_eq!(reemit(&ops), ops);

    let (signer, tx) = operations_to_transaction(&ops).unwrap();
    assert_eq!(signer, a);
    assert_eq!(
        tx.fee,
        Some(Fee {
            gas: 2000,
            amount: Quantity::from(100u64)
        })
    );
}

#[test]
fn test_transfer_without_fee_uses_default_gas() {
    let (a, b) = (address(1), address(2));
    let ops = vec![
        OperationBuilder::new(0, OperationType::Transfer)
            .account(&a)
            .debit(1000)
            .build(),
        OperationBuilder::new(1, OperationType::Transfer)
            .account(&b)
            .credit(1000)
            .related(0)
            .build(),
    ];
    let (signer, mut tx) = operations_to_transaction(&ops).unwrap();
    tx.nonce = 3;

    assert_eq!(signer, a);
    assert_eq!(tx.method, staking::METHOD_TRANSFER);
    assert_eq!(
        tx.fee,
        Some(Fee {
            gas: DEFAULT_GAS,
            amount: Quantity::zero()
        })
    );
    assert_eq!(
        tx.kind().unwrap(),
        TransactionKind::Transfer(staking::Transfer {
            to: b,
            amount: Quantity::from(1000u64)
        })
    );
    // A zero fee produces no fee operations.
    assert_eq!(reemit(&ops), ops);
}

#[test]
fn test_burn_round_trip() {
    let a = address(1);
    let mut ops = fee_ops(&a, 1, 10);
    ops.push(
        OperationBuilder::new(2, OperationType::Burn)
            .account(&a)
            .debit(5)
            .build(),
    );
    assert_eq!(reemit(&ops), ops);
}

#[test]
fn test_add_escrow_round_trip() {
    let (a, b) = (address(1), address(2));
    let ops = vec![
        OperationBuilder::new(0, OperationType::Transfer)
            .account(&a)
            .debit(700)
            .build(),
        OperationBuilder::new(1, OperationType::Transfer)
            .escrow(&b)
            .credit(700)
            .related(0)
            .build(),
    ];
    assert_eq!(reemit(&ops), ops);
    let (_, tx) = operations_to_transaction(&ops).unwrap();
    assert_eq!(tx.method, staking::METHOD_ADD_ESCROW);
}

#[test]
fn test_reclaim_escrow_shares() {
    let (a, b) = (address(1), address(2));
    let ops = vec![
        OperationBuilder::new(0, OperationType::ReclaimEscrow)
            .account(&a)
            .build(),
        OperationBuilder::new(1, OperationType::ReclaimEscrow)
            .escrow(&b)
            .related(0)
            .metadata(RECLAIM_ESCROW_SHARES_KEY, json!("1000"))
            .build(),
    ];
    assert_eq!(reemit(&ops), ops);

    let (_, tx) = operations_to_transaction(&ops).unwrap();
    assert_eq!(
        tx.kind().unwrap(),
        TransactionKind::ReclaimEscrow(staking::ReclaimEscrow {
            shares: Quantity::from(1000u64),
            account: b
        })
    );

    let mut with_amount = ops.clone();
    with_amount[0].amount = Some(to_amount(&Quantity::from(1u64), true));
    assert!(matches!(
        operations_to_transaction(&with_amount),
        Err(OperationsError::Malformed(_))
    ));

    let mut numeric_shares = ops;
    numeric_shares[1].metadata = json!({ "reclaim_escrow_shares": 1000 })
        .as_object()
        .cloned();
    assert!(matches!(
        operations_to_transaction(&numeric_shares),
        Err(OperationsError::Malformed(_))
    ));
}

#[test]
fn test_fee_mismatches_are_malformed() {
    let (a, b) = (address(1), address(2));
    let transfer = |from: &Address| {
        vec![
            OperationBuilder::new(2, OperationType::Transfer)
                .account(from)
                .debit(10)
                .build(),
            OperationBuilder::new(3, OperationType::Transfer)
                .account(&b)
                .credit(10)
                .build(),
        ]
    };

    let mut differing = fee_ops(&a, 100, 1);
    differing[1].amount = Some(to_amount(&Quantity::from(99u64), false));
    differing.extend(transfer(&a));
    assert!(matches!(
        operations_to_transaction(&differing),
        Err(OperationsError::Malformed(_))
    ));

    let mut other_signer = fee_ops(&a, 100, 1);
    other_signer.extend(transfer(&b));
    assert!(matches!(
        operations_to_transaction(&other_signer),
        Err(OperationsError::Malformed(_))
    ));

    let mut bad_gas = fee_ops(&a, 100, 1);
    bad_gas[0].metadata = json!({ "fee_gas": "lots" }).as_object().cloned();
    bad_gas.extend(transfer(&a));
    assert!(matches!(
        operations_to_transaction(&bad_gas),
        Err(OperationsError::Malformed(_))
    ));

    let mut positive_debit = fee_ops(&a, 100, 1);
    positive_debit[0].amount = Some(to_amount(&Quantity::from(100u64), false));
    positive_debit.extend(transfer(&a));
    assert!(matches!(
        operations_to_transaction(&positive_debit),
        Err(OperationsError::Malformed(_))
    ));
}

#[test]
fn test_unsupported_shapes() {
    let a = address(1);
    assert!(matches!(
        operations_to_transaction(&[]),
        Err(OperationsError::Unsupported(_))
    ));
    assert!(matches!(
        operations_to_transaction(&fee_ops(&a, 1, 1)),
        Err(OperationsError::Unsupported(_))
    ));

    let mut unknown = OperationBuilder::new(0, OperationType::Transfer)
        .account(&a)
        .debit(1)
        .build();
    unknown._type = "Mint".to_string();
    assert!(matches!(
        operations_to_transaction(&[unknown]),
        Err(OperationsError::Unsupported(_))
    ));

    let escrow_burn = OperationBuilder::new(0, OperationType::Burn)
        .escrow(&a)
        .debit(1)
        .build();
    assert!(matches!(
        operations_to_transaction(&[escrow_burn]),
        Err(OperationsError::Unsupported(_))
    ));
}

#[test]
fn test_large_amounts_keep_sign_symmetry() {
    let (a, b) = (address(1), address(2));
    let big: Quantity = "340282366920938463463374607431768211456".parse().unwrap();
    let ops = vec![
        Operation {
            amount: Some(to_amount(&big, true)),
            ..OperationBuilder::new(0, OperationType::Transfer)
                .account(&a)
                .build()
        },
        Operation {
            amount: Some(to_amount(&big, false)),
            ..OperationBuilder::new(1, OperationType::Transfer)
                .account(&b)
                .related(0)
                .build()
        },
    ];
    assert_eq!(reemit(&ops), ops);
}

#[test]
fn test_decode_successful_tx_uses_events() {
    let (a, b) = (address(1), address(2));
    let tx = Transaction::new(
        0,
        Fee {
            gas: 1000,
            amount: Quantity::zero(),
        },
        &TransactionKind::Transfer(staking::Transfer {
            to: b,
            amount: Quantity::from(10u64),
        }),
    )
    .unwrap();
    let raw = sign(&tx, 1);
    let result = TransactionResult {
        events: vec![staking_event(Event {
            height: 7,
            tx_hash: Hash::digest(&raw),
            transfer: Some(TransferEvent {
                from: a,
                to: b,
                amount: Quantity::from(10u64),
            }),
            ..Default::default()
        })],
        ..Default::default()
    };

    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    decoder.decode_tx(&raw, Some(&result)).unwrap();
    let txs = decoder.into_transactions();
    assert_eq!(txs.len(), 1);
    assert_eq!(
        txs[0].transaction_identifier.hash,
        Hash::digest(&raw).to_string()
    );
    assert_eq!(
        txs[0].operations,
        vec![
            OperationBuilder::new(0, OperationType::Transfer)
                .account(&a)
                .debit(10)
                .status(STATUS_OK)
                .build(),
            OperationBuilder::new(1, OperationType::Transfer)
                .account(&b)
                .credit(10)
                .related(0)
                .status(STATUS_OK)
                .build(),
        ]
    );
}

#[test]
fn test_decode_failed_tx_emits_failed_ops() {
    let a = address(1);
    let raw = sign(&burn_tx(3), 1);

    // Fee was not deducted: failed fee ops and failed burn.
    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    decoder.decode_tx(&raw, Some(&failed_result())).unwrap();
    let ops = &decoder.into_transactions()[0].operations;
    let types: Vec<&str> = ops.iter().map(|o| o._type.as_str()).collect();
    assert_eq!(types, vec!["Transfer", "Transfer", "Burn"]);
    assert!(ops
        .iter()
        .all(|o| o.status.as_deref() == Some(STATUS_FAILED)));

    // Fee was deducted: the fee pair comes from events, only the burn fails.
    let mut result = failed_result();
    result.events.push(staking_event(Event {
        tx_hash: Hash::digest(&raw),
        transfer: Some(TransferEvent {
            from: a,
            to: *FEE_ACCUMULATOR_ADDRESS,
            amount: Quantity::from(3u64),
        }),
        ..Default::default()
    }));
    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    decoder.decode_tx(&raw, Some(&result)).unwrap();
    let ops = &decoder.into_transactions()[0].operations;
    let statuses: Vec<&str> = ops.iter().filter_map(|o| o.status.as_deref()).collect();
    assert_eq!(statuses, vec![STATUS_OK, STATUS_OK, STATUS_FAILED]);
}

#[test]
fn test_decode_pending_tx_reports_ok() {
    let b = address(2);
    let tx = Transaction::new(
        0,
        Fee::default(),
        &TransactionKind::Transfer(staking::Transfer {
            to: b,
            amount: Quantity::from(1u64),
        }),
    )
    .unwrap();
    let raw = sign(&tx, 1);
    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    decoder.decode_tx(&raw, None).unwrap();
    let ops = &decoder.into_transactions()[0].operations;
    assert_eq!(ops.len(), 2);
    assert!(ops.iter().all(|o| o.status.as_deref() == Some(STATUS_OK)));
}

#[test]
fn test_decode_rejects_wrong_chain_and_garbage() {
    let raw = sign(&burn_tx(0), 1);

    let mut decoder = TransactionsDecoder::new("other-chain");
    assert!(matches!(
        decoder.decode_tx(&raw, None),
        Err(DecodeError::BadSignature(_))
    ));
    assert!(matches!(
        decoder.decode_tx(b"garbage", None),
        Err(DecodeError::Malformed(_))
    ));
    assert!(decoder.into_transactions().is_empty());
}

#[test]
fn test_decode_txs_skips_bad_transactions() {
    let good = sign(&burn_tx(0), 1);
    let raws = vec![b"garbage".to_vec(), good.clone()];
    let results = vec![failed_result(), failed_result()];

    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    let skipped = decoder.decode_txs(&raws, &results);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, 0);

    let txs = decoder.into_transactions();
    assert_eq!(txs.len(), 1);
    assert_eq!(
        txs[0].transaction_identifier.hash,
        Hash::digest(&good).to_string()
    );
}

#[test]
fn test_decode_is_deterministic() {
    let raws = vec![sign(&burn_tx(2), 1), sign(&burn_tx(2), 2)];
    let results = vec![failed_result(), failed_result()];
    let decode = || {
        let mut decoder = TransactionsDecoder::new(CHAIN_ID);
        assert!(decoder.decode_txs(&raws, &results).is_empty());
        decoder.into_transactions()
    };
    let first = decode();
    assert_eq!(first.len(), 2);
    assert_eq!(first, decode());
}

#[test]
fn test_block_events_and_escrow_mapping() {
    let (owner, escrow) = (address(1), address(2));
    let block_hash = Hash::digest(b"block");
    let events = vec![
        Event {
            escrow: Some(EscrowEvent {
                add: Some(AddEscrowEvent {
                    owner,
                    escrow,
                    amount: Quantity::from(5u64),
                    new_shares: Quantity::from(5u64),
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        Event {
            escrow: Some(EscrowEvent {
                take: Some(TakeEscrowEvent {
                    owner: escrow,
                    amount: Quantity::from(2u64),
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        Event {
            escrow: Some(EscrowEvent {
                reclaim: Some(ReclaimEscrowEvent {
                    owner,
                    escrow,
                    amount: Quantity::from(3u64),
                    shares: Quantity::from(3u64),
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        Event {
            burn: Some(BurnEvent {
                owner,
                amount: Quantity::from(1u64),
            }),
            ..Default::default()
        },
        // Owned by a transaction, so not a block-level event.
        Event {
            tx_hash: Hash::digest(b"tx"),
            burn: Some(BurnEvent {
                owner,
                amount: Quantity::from(9u64),
            }),
            ..Default::default()
        },
    ];

    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    decoder.decode_block(&block_hash, &events);
    let txs = decoder.into_transactions();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].transaction_identifier.hash, block_hash.to_string());

    let ok = |b: OperationBuilder| b.status(STATUS_OK).build();
    assert_eq!(
        txs[0].operations,
        vec![
            ok(OperationBuilder::new(0, OperationType::Transfer)
                .account(&owner)
                .debit(5)),
            ok(OperationBuilder::new(1, OperationType::Transfer)
                .escrow(&escrow)
                .credit(5)
                .related(0)),
            ok(OperationBuilder::new(2, OperationType::Transfer)
                .escrow(&escrow)
                .debit(2)
                .related(1)),
            ok(OperationBuilder::new(3, OperationType::Transfer)
                .account(&COMMON_POOL_ADDRESS)
                .credit(2)
                .related(2)),
            ok(OperationBuilder::new(4, OperationType::Transfer)
                .escrow(&escrow)
                .debit(3)
                .related(3)),
            ok(OperationBuilder::new(5, OperationType::Transfer)
                .account(&owner)
                .credit(3)
                .related(4)),
            ok(OperationBuilder::new(6, OperationType::Burn)
                .account(&owner)
                .debit(1)
                .related(5)),
        ]
    );
}

#[test]
fn test_operation_type_names() {
    assert_eq!(
        OperationType::all()
            .iter()
            .map(OperationType::as_str)
            .collect::<Vec<_>>(),
        vec!["Transfer", "Burn", "ReclaimEscrow"]
    );
    assert_eq!("Burn".parse::<OperationType>(), Ok(OperationType::Burn));
    assert!("burn".parse::<OperationType>().is_err());
}

fn plain_transfer(from: &Address, to: &Address) -> Vec<Operation> {
    vec![
        OperationBuilder::new(0, OperationType::Transfer)
            .account(from)
            .debit(10)
            .build(),
        OperationBuilder::new(1, OperationType::Transfer)
            .account(to)
            .credit(10)
            .related(0)
            .build(),
    ]
}

#[test]
fn test_operation_indices_must_be_sequential() {
    let (a, b) = (address(1), address(2));
    assert!(operations_to_transaction(&plain_transfer(&a, &b)).is_ok());

    let mut shuffled = plain_transfer(&a, &b);
    shuffled[0].operation_identifier.index = 7;
    shuffled[1].operation_identifier.index = 3;
    assert!(matches!(
        operations_to_transaction(&shuffled),
        Err(OperationsError::Malformed(_))
    ));

    let mut gap = plain_transfer(&a, &b);
    gap[1].operation_identifier.index = 2;
    assert!(matches!(
        operations_to_transaction(&gap),
        Err(OperationsError::Malformed(_))
    ));

    // Indices are checked before the fee pair is looked at.
    let mut fee_first = fee_ops(&a, 1, 1);
    fee_first.extend(plain_transfer(&a, &b));
    assert!(matches!(
        operations_to_transaction(&fee_first),
        Err(OperationsError::Malformed(_))
    ));
}

#[test]
fn test_related_operations_must_precede() {
    let (a, b) = (address(1), address(2));

    let mut forward = plain_transfer(&a, &b);
    forward[0].related_operations = Some(vec![OperationIdentifier::new(1)]);
    assert!(matches!(
        operations_to_transaction(&forward),
        Err(OperationsError::Malformed(_))
    ));

    let mut itself = plain_transfer(&a, &b);
    itself[1].related_operations = Some(vec![OperationIdentifier::new(1)]);
    assert!(matches!(
        operations_to_transaction(&itself),
        Err(OperationsError::Malformed(_))
    ));

    let mut dangling = plain_transfer(&a, &b);
    dangling[1].related_operations = Some(vec![OperationIdentifier::new(42)]);
    assert!(matches!(
        operations_to_transaction(&dangling),
        Err(OperationsError::Malformed(_))
    ));

    let mut negative = plain_transfer(&a, &b);
    negative[1].related_operations = Some(vec![OperationIdentifier::new(-1)]);
    assert!(matches!(
        operations_to_transaction(&negative),
        Err(OperationsError::Malformed(_))
    ));
}

#[test]
fn test_fee_gas_accepts_integral_floats() {
    let (a, b) = (address(1), address(2));
    let with_gas = |gas: Value| {
        let mut ops = fee_ops(&a, 5, 0);
        ops[0].metadata = json!({ "fee_gas": gas }).as_object().cloned();
        ops.push(
            OperationBuilder::new(2, OperationType::Transfer)
                .account(&a)
                .debit(10)
                .build(),
        );
        ops.push(
            OperationBuilder::new(3, OperationType::Transfer)
                .account(&b)
                .credit(10)
                .related(2)
                .build(),
        );
        operations_to_transaction(&ops).map(|(_, tx)| tx.fee.map(|f| f.gas))
    };

    assert_eq!(with_gas(json!(2000)), Ok(Some(2000)));
    assert_eq!(with_gas(json!(2000.0)), Ok(Some(2000)));
    assert!(matches!(
        with_gas(json!(2000.5)),
        Err(OperationsError::Malformed(_))
    ));
    assert!(matches!(
        with_gas(json!(-1)),
        Err(OperationsError::Malformed(_))
    ));
}

#[test]
fn test_decode_failed_tx_with_bad_body_keeps_events() {
    let a = address(1);
    let tx = Transaction {
        fee: Some(Fee {
            gas: 1000,
            amount: Quantity::from(3u64),
        }),
        body: Some(serde_cbor::Value::Integer(1)),
        nonce: 0,
        method: staking::METHOD_TRANSFER.to_string(),
    };
    let raw = sign(&tx, 1);
    let mut result = failed_result();
    result.events.push(staking_event(Event {
        tx_hash: Hash::digest(&raw),
        transfer: Some(TransferEvent {
            from: a,
            to: *FEE_ACCUMULATOR_ADDRESS,
            amount: Quantity::from(3u64),
        }),
        ..Default::default()
    }));

    let mut decoder = TransactionsDecoder::new(CHAIN_ID);
    assert!(matches!(
        decoder.decode_tx(&raw, Some(&result)),
        Err(DecodeError::BadTransaction(_))
    ));

    // A well-formed transaction after it is unaffected.
    let good = sign(&burn_tx(0), 2);
    decoder.decode_tx(&good, Some(&failed_result())).unwrap();

    let txs = decoder.into_transactions();
    assert_eq!(txs.len(), 2);
    assert_eq!(
        txs[0].transaction_identifier.hash,
        Hash::digest(&raw).to_string()
    );
    assert_eq!(
        txs[0].operations,
        vec![
            OperationBuilder::new(0, OperationType::Transfer)
                .account(&a)
                .debit(3)
                .status(STATUS_OK)
                .build(),
            OperationBuilder::new(1, OperationType::Transfer)
                .account(&FEE_ACCUMULATOR_ADDRESS)
                .credit(3)
                .related(0)
                .status(STATUS_OK)
                .build(),
        ]
    );
}
