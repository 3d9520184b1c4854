pub mod convert;
pub mod hash;
pub mod models;
pub mod node_client;
pub mod operations;
pub mod quantity;
pub mod rosetta_server;
pub mod staking;
pub mod transaction;

use crate::convert::{
    account_identifier, from_hex, from_public_key, into_error, malformed_value, to_address,
    to_amount, to_hex, BLOCKCHAIN, SUB_ACCOUNT_ESCROW, SUB_ACCOUNT_GENERAL,
};
use crate::hash::Hash;
use crate::node_client::{NodeClient, NodeError, HEIGHT_LATEST};
use crate::operations::{
    operations_to_transaction, Emitter, OperationType, TransactionsDecoder, NONCE_KEY,
    STATUS_FAILED, STATUS_OK,
};
use crate::staking::Address;
use crate::transaction::{SignedTransaction, UnsignedTransaction};

use models::*;

use log::{debug, error, info, warn};
use serde_json::{json, map::Map, Value};
use std::sync::Arc;

pub const API_VERSION: &str = "1.4.10";
pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reported as the node version when running without a node.
pub const OFFLINE_NODE_VERSION: &str = "unknown";

const OPTIONS_ID_KEY: &str = "id";

const ACTIVE_BALANCE_KEY: &str = "active_balance";
const ACTIVE_SHARES_KEY: &str = "active_shares";
const DEBONDING_BALANCE_KEY: &str = "debonding_balance";
const DEBONDING_SHARES_KEY: &str = "debonding_shares";
const DELEGATIONS_KEY: &str = "delegations";
const DEBONDING_DELEGATIONS_KEY: &str = "debonding_delegations";

const GENESIS_HASH_NOT_AVAILABLE: &str = "not available";

fn node_error(e: &NodeError) -> Option<Object> {
    into_error(e.to_string())
}

fn verify_network_blockchain(net_id: &NetworkIdentifier) -> Result<(), ApiError> {
    if net_id.blockchain != BLOCKCHAIN {
        return Err(ApiError::InvalidBlockchain(into_error(format!(
            "unknown blockchain {}",
            net_id.blockchain
        ))));
    }
    if net_id.sub_network_identifier.is_some() {
        return Err(ApiError::InvalidSubnetwork(None));
    }
    Ok(())
}

/// Height to query for a partial block identifier. Blocks can only be looked
/// up by index, no identifier at all means the latest block.
fn block_height(block_id: Option<PartialBlockIdentifier>) -> Result<i64, ApiError> {
    match block_id {
        Some(PartialBlockIdentifier {
            index: Some(height),
            ..
        }) => Ok(height),
        Some(PartialBlockIdentifier {
            index: None,
            hash: Some(_),
        }) => Err(ApiError::MustQueryByIndex(None)),
        _ => Ok(HEIGHT_LATEST),
    }
}

#[derive(Clone)]
enum Backend {
    Online(Arc<dyn NodeClient>),
    Offline { chain_id: String },
}

#[derive(Clone)]
pub struct RosettaRequestHandler {
    backend: Backend,
}

impl RosettaRequestHandler {
    pub fn new<T: 'static + NodeClient>(node: Arc<T>) -> Self {
        Self {
            backend: Backend::Online(node),
        }
    }

    /// A handler with no node behind it. Only the endpoints that can be
    /// answered from the chain ID alone are available.
    pub fn new_offline(chain_id: String) -> Self {
        Self {
            backend: Backend::Offline { chain_id },
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.backend, Backend::Offline { .. })
    }

    fn node(&self) -> Result<&Arc<dyn NodeClient>, ApiError> {
        match &self.backend {
            Backend::Online(node) => Ok(node),
            Backend::Offline { .. } => Err(ApiError::NotAvailableInOfflineMode(None)),
        }
    }

    async fn chain_id(&self) -> Result<String, ApiError> {
        match &self.backend {
            Backend::Offline { chain_id } => Ok(chain_id.clone()),
            Backend::Online(node) => node.chain_id().await.map_err(|e| {
                error!("Unable to get chain ID: {}", e);
                ApiError::UnableToGetChainId(node_error(&e))
            }),
        }
    }

    pub async fn network_id(&self) -> Result<NetworkIdentifier, ApiError> {
        Ok(NetworkIdentifier::new(
            BLOCKCHAIN.to_string(),
            self.chain_id().await?,
        ))
    }

    /// Checks the request's network identifier against the chain we serve
    /// and returns the chain ID.
    async fn verify_network_id(
        &self,
        net_id: &Option<NetworkIdentifier>,
    ) -> Result<String, ApiError> {
        let net_id = net_id
            .as_ref()
            .ok_or(ApiError::MissingNetworkIdentifier(None))?;
        verify_network_blockchain(net_id)?;

        let chain_id = self.chain_id().await?;
        if net_id.network != chain_id {
            return Err(ApiError::InvalidNetwork(into_error(format!(
                "unknown network {}",
                net_id.network
            ))));
        }
        Ok(chain_id)
    }

    /// Get an Account Balance
    pub async fn account_balance(
        &self,
        msg: models::AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse, ApiError> {
        let node = self.node()?;
        self.verify_network_id(&msg.network_identifier).await?;

        let height = block_height(msg.block_identifier)?;
        let owner = to_address(&msg.account_identifier.address)?;
        let escrow = match msg
            .account_identifier
            .sub_account
            .as_ref()
            .map(|s| s.address.as_str())
        {
            None | Some(SUB_ACCOUNT_GENERAL) => false,
            Some(SUB_ACCOUNT_ESCROW) => true,
            Some(other) => {
                error!("AccountBalance: invalid sub-account {}", other);
                return Err(ApiError::MustSpecifySubAccount(None));
            }
        };

        let account = node.account(height, &owner).await.map_err(|e| {
            error!(
                "AccountBalance: unable to get account {} at height {}: {}",
                owner, height, e
            );
            ApiError::UnableToGetAccount(node_error(&e))
        })?;
        let block = node.block(height).await.map_err(|e| {
            error!("AccountBalance: unable to get block {}: {}", height, e);
            ApiError::UnableToGetBlock(node_error(&e))
        })?;

        let mut md = Map::new();
        md.insert(NONCE_KEY.to_string(), json!(account.general.nonce));

        let value = if !escrow {
            account.general.balance
        } else {
            let active = &account.escrow.active;
            let debonding = &account.escrow.debonding;
            md.insert(
                ACTIVE_BALANCE_KEY.to_string(),
                json!(active.balance.to_string()),
            );
            md.insert(
                ACTIVE_SHARES_KEY.to_string(),
                json!(active.total_shares.to_string()),
            );
            md.insert(
                DEBONDING_BALANCE_KEY.to_string(),
                json!(debonding.balance.to_string()),
            );
            md.insert(
                DEBONDING_SHARES_KEY.to_string(),
                json!(debonding.total_shares.to_string()),
            );

            let delegations = node.delegations(height, &owner).await.map_err(|e| {
                error!("AccountBalance: unable to get delegations of {}: {}", owner, e);
                ApiError::UnableToGetAccount(node_error(&e))
            })?;
            let delegations: Map<String, Value> = delegations
                .iter()
                .map(|(to, d)| (to.to_string(), json!({ "shares": d.shares.to_string() })))
                .collect();
            md.insert(DELEGATIONS_KEY.to_string(), Value::Object(delegations));

            let debonding_delegations = node
                .debonding_delegations(height, &owner)
                .await
                .map_err(|e| {
                    error!(
                        "AccountBalance: unable to get debonding delegations of {}: {}",
                        owner, e
                    );
                    ApiError::UnableToGetAccount(node_error(&e))
                })?;
            let debonding_delegations: Map<String, Value> = debonding_delegations
                .iter()
                .map(|(to, ds)| {
                    let ds: Vec<Value> = ds
                        .iter()
                        .map(|d| {
                            json!({
                                "shares": d.shares.to_string(),
                                "debond_end": d.debond_end,
                            })
                        })
                        .collect();
                    (to.to_string(), Value::Array(ds))
                })
                .collect();
            md.insert(
                DEBONDING_DELEGATIONS_KEY.to_string(),
                Value::Object(debonding_delegations),
            );

            &active.balance + &debonding.balance
        };

        let mut resp = AccountBalanceResponse::new(
            BlockIdentifier::new(block.height, block.hash.to_string()),
            vec![to_amount(&value, false)],
        );
        resp.metadata = Some(md);
        debug!(
            "AccountBalance OK for {} (escrow: {}) at height {}",
            owner, escrow, block.height
        );
        Ok(resp)
    }

    /// Get Account Coins. Accounts on this chain hold no coins.
    pub async fn account_coins(
        &self,
        msg: models::AccountCoinsRequest,
    ) -> Result<AccountCoinsResponse, ApiError> {
        self.node()?;
        self.verify_network_id(&msg.network_identifier).await?;
        Err(ApiError::NotImplemented(None))
    }

    /// Get a Block
    pub async fn block(&self, msg: models::BlockRequest) -> Result<BlockResponse, ApiError> {
        let node = self.node()?;
        let chain_id = self.verify_network_id(&msg.network_identifier).await?;
        let height = block_height(msg.block_identifier)?;

        let blk = node.block(height).await.map_err(|e| {
            error!("Block: unable to get block {}: {}", height, e);
            ApiError::UnableToGetBlock(node_error(&e))
        })?;
        let txs = node
            .transactions_with_results(blk.height)
            .await
            .map_err(|e| {
                error!("Block: unable to get transactions at {}: {}", blk.height, e);
                ApiError::UnableToGetTransactions(node_error(&e))
            })?;
        let events = node.staking_events(blk.height).await.map_err(|e| {
            error!("Block: unable to get staking events at {}: {}", blk.height, e);
            ApiError::UnableToGetTransactions(node_error(&e))
        })?;

        let raw_txs: Vec<Vec<u8>> = txs
            .transactions
            .into_iter()
            .map(serde_bytes::ByteBuf::into_vec)
            .collect();
        let mut decoder = TransactionsDecoder::new(&chain_id);
        for (i, e) in decoder.decode_txs(&raw_txs, &txs.results) {
            warn!(
                "Block: unable to decode transaction {} in block {}: {}",
                i, blk.height, e
            );
        }
        decoder.decode_block(&blk.hash, &events);

        let block = Block::new(
            BlockIdentifier::new(blk.height, blk.hash.to_string()),
            BlockIdentifier::new(blk.parent_height, blk.parent_hash.to_string()),
            Timestamp::from(blk.timestamp),
            decoder.into_transactions(),
        );
        debug!(
            "Block OK: height {} with {} transactions",
            blk.height,
            block.transactions.len()
        );
        Ok(BlockResponse::new(Some(block)))
    }

    /// Get a Block Transaction. Whole blocks must be fetched instead.
    pub async fn block_transaction(
        &self,
        msg: models::BlockTransactionRequest,
    ) -> Result<BlockTransactionResponse, ApiError> {
        self.node()?;
        self.verify_network_id(&msg.network_identifier).await?;
        Err(ApiError::NotImplemented(None))
    }

    /// Create Network Transaction from Signatures
    pub async fn construction_combine(
        &self,
        msg: models::ConstructionCombineRequest,
    ) -> Result<ConstructionCombineResponse, ApiError> {
        self.verify_network_id(&msg.network_identifier).await?;

        let unsigned = UnsignedTransaction::from_base64(&msg.unsigned_transaction).map_err(|e| {
            error!("ConstructionCombine: malformed unsigned transaction: {}", e);
            malformed_value(format!("unsigned transaction: {}", e))
        })?;
        let sig = match msg.signatures.as_slice() {
            [sig] => sig,
            sigs => {
                error!(
                    "ConstructionCombine: need exactly one signature, got {}",
                    sigs.len()
                );
                return Err(malformed_value(format!(
                    "need exactly one signature, got {}",
                    sigs.len()
                )));
            }
        };

        let public_key = from_hex(&sig.public_key.hex_bytes)?;
        let signature = from_hex(&sig.hex_bytes)?;
        let signature = transaction::Signature::new(&public_key, &signature).map_err(|e| {
            error!("ConstructionCombine: {}", e);
            malformed_value(e)
        })?;
        let signed = SignedTransaction {
            signature,
            blob: unsigned.tx_bytes().map_err(malformed_value)?,
        };

        let signed_transaction = signed.to_base64().map_err(malformed_value)?;
        debug!("ConstructionCombine OK");
        Ok(ConstructionCombineResponse { signed_transaction })
    }

    /// Derive an Address from a PublicKey
    pub async fn construction_derive(
        &self,
        msg: models::ConstructionDeriveRequest,
    ) -> Result<ConstructionDeriveResponse, ApiError> {
        self.verify_network_id(&msg.network_identifier).await?;

        let pk = from_public_key(&msg.public_key).map_err(|e| {
            error!(
                "ConstructionDerive: malformed public key {}",
                msg.public_key.hex_bytes
            );
            e
        })?;
        let address = Address::from_public_key(&pk);
        debug!("ConstructionDerive OK: {}", address);
        Ok(ConstructionDeriveResponse {
            address: Some(address.to_string()),
            account_identifier: Some(account_identifier(&address)),
            metadata: None,
        })
    }

    /// Get the Hash of a Signed Transaction
    pub async fn construction_hash(
        &self,
        msg: models::ConstructionHashRequest,
    ) -> Result<TransactionIdentifierResponse, ApiError> {
        self.verify_network_id(&msg.network_identifier).await?;

        let hash = decode_signed_transaction(&msg.signed_transaction)?
            .hash()
            .map_err(malformed_value)?;
        debug!("ConstructionHash OK: {}", hash);
        Ok(TransactionIdentifierResponse::new(TransactionIdentifier::new(
            hash.to_string(),
        )))
    }

    /// Get Metadata for Transaction Construction
    pub async fn construction_metadata(
        &self,
        msg: models::ConstructionMetadataRequest,
    ) -> Result<ConstructionMetadataResponse, ApiError> {
        let node = self.node().map_err(|e| {
            error!("ConstructionMetadata: not available in offline mode");
            e
        })?;
        self.verify_network_id(&msg.network_identifier).await?;

        let id = match msg.options.as_ref().and_then(|o| o.get(OPTIONS_ID_KEY)) {
            Some(Value::String(id)) => id,
            Some(_) => {
                error!("ConstructionMetadata: malformed account ID option");
                return Err(convert::invalid_account_address("malformed account ID option"));
            }
            None => {
                error!("ConstructionMetadata: account ID option not given");
                return Err(convert::invalid_account_address("account ID option not given"));
            }
        };
        let owner = to_address(id)?;

        let nonce = node.next_nonce(HEIGHT_LATEST, &owner).await.map_err(|e| {
            error!("ConstructionMetadata: unable to get next nonce of {}: {}", owner, e);
            ApiError::UnableToGetNextNonce(node_error(&e))
        })?;

        let mut md = Map::new();
        md.insert(NONCE_KEY.to_string(), json!(nonce));
        debug!("ConstructionMetadata OK: {} has nonce {}", owner, nonce);
        Ok(ConstructionMetadataResponse::new(md))
    }

    /// Parse a Transaction
    pub async fn construction_parse(
        &self,
        msg: models::ConstructionParseRequest,
    ) -> Result<ConstructionParseResponse, ApiError> {
        let chain_id = self.verify_network_id(&msg.network_identifier).await?;

        let (signer, tx, signers) = if msg.signed {
            let signed = decode_signed_transaction(&msg.transaction)?;
            let (signer, tx) = signed.open(&chain_id).map_err(|e| {
                error!("ConstructionParse: unable to open signed transaction: {}", e);
                malformed_value(e)
            })?;
            (signer, tx, vec![signer])
        } else {
            let unsigned = UnsignedTransaction::from_base64(&msg.transaction).map_err(|e| {
                error!("ConstructionParse: malformed unsigned transaction: {}", e);
                malformed_value(e)
            })?;
            let tx = unsigned.transaction().map_err(|e| {
                error!("ConstructionParse: malformed inner transaction: {}", e);
                malformed_value(e)
            })?;
            let signer = to_address(&unsigned.signer)?;
            (signer, tx, vec![])
        };

        let mut emitter = Emitter::new(&tx, &signer, None, vec![]);
        emitter.emit_fee_ops();
        emitter.emit_tx_ops().map_err(|e| {
            error!("ConstructionParse: malformed transaction: {}", e);
            malformed_value(e)
        })?;

        let mut md = Map::new();
        md.insert(NONCE_KEY.to_string(), json!(tx.nonce));
        debug!("ConstructionParse OK (signed: {})", msg.signed);
        Ok(ConstructionParseResponse {
            operations: emitter.operations(),
            signers: Some(signers.iter().map(Address::to_string).collect()),
            account_identifier_signers: Some(signers.iter().map(account_identifier).collect()),
            metadata: Some(md),
        })
    }

    /// Generate an Unsigned Transaction and Signing Payloads
    pub async fn construction_payloads(
        &self,
        msg: models::ConstructionPayloadsRequest,
    ) -> Result<ConstructionPayloadsResponse, ApiError> {
        let chain_id = self.verify_network_id(&msg.network_identifier).await?;

        let nonce = msg
            .metadata
            .as_ref()
            .and_then(|md| md.get(NONCE_KEY))
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                error!("ConstructionPayloads: nonce metadata missing or malformed");
                malformed_value("nonce metadata missing or malformed")
            })?;

        let (signer, mut tx) = operations_to_transaction(&msg.operations).map_err(|e| {
            error!("ConstructionPayloads: bad operations: {}", e);
            malformed_value(e)
        })?;
        tx.nonce = nonce;

        let unsigned = UnsignedTransaction::new(&tx, &signer).map_err(malformed_value)?;
        let tx_bytes = unsigned.tx_bytes().map_err(malformed_value)?;
        let message = transaction::signer_message(&chain_id, &tx_bytes);

        let payload = SigningPayload {
            address: Some(signer.to_string()),
            account_identifier: Some(account_identifier(&signer)),
            hex_bytes: to_hex(&message),
            signature_type: Some(SignatureType::ED25519),
        };
        let unsigned_transaction = unsigned.to_base64().map_err(malformed_value)?;
        debug!("ConstructionPayloads OK: signer {} nonce {}", signer, nonce);
        Ok(ConstructionPayloadsResponse {
            unsigned_transaction,
            payloads: vec![payload],
        })
    }

    /// Create a Request to Fetch Metadata
    pub async fn construction_preprocess(
        &self,
        msg: models::ConstructionPreprocessRequest,
    ) -> Result<ConstructionPreprocessResponse, ApiError> {
        self.verify_network_id(&msg.network_identifier).await?;

        let (signer, _) = operations_to_transaction(&msg.operations).map_err(|e| {
            error!("ConstructionPreprocess: bad operations: {}", e);
            malformed_value(e)
        })?;

        let mut options = Map::new();
        options.insert(OPTIONS_ID_KEY.to_string(), json!(signer.to_string()));
        debug!("ConstructionPreprocess OK: signer {}", signer);
        Ok(ConstructionPreprocessResponse {
            options: Some(options),
        })
    }

    /// Submit a Signed Transaction
    pub async fn construction_submit(
        &self,
        msg: models::ConstructionSubmitRequest,
    ) -> Result<TransactionIdentifierResponse, ApiError> {
        let node = self.node().map_err(|e| {
            error!("ConstructionSubmit: not available in offline mode");
            e
        })?;
        self.verify_network_id(&msg.network_identifier).await?;

        let signed = decode_signed_transaction(&msg.signed_transaction)?;
        let hash = signed.hash().map_err(malformed_value)?;

        match node.submit_transaction(&signed).await {
            Ok(()) => {}
            Err(NodeError::DuplicateTransaction) => {
                info!("ConstructionSubmit: {} already submitted, treating as success", hash);
            }
            Err(e) => {
                error!("ConstructionSubmit: submitting {} failed: {}", hash, e);
                return Err(ApiError::UnableToSubmitTransaction(node_error(&e)));
            }
        }

        debug!("ConstructionSubmit OK: {}", hash);
        Ok(TransactionIdentifierResponse::new(TransactionIdentifier::new(
            hash.to_string(),
        )))
    }

    /// Get All Mempool Transactions
    pub async fn mempool(&self, msg: models::NetworkRequest) -> Result<MempoolResponse, ApiError> {
        let node = self.node()?;
        self.verify_network_id(&msg.network_identifier).await?;

        let txs = node.unconfirmed_transactions().await.map_err(|e| {
            error!("Mempool: unable to get unconfirmed transactions: {}", e);
            ApiError::UnableToGetTransactions(node_error(&e))
        })?;
        let ids: Vec<TransactionIdentifier> = txs
            .iter()
            .map(|raw| TransactionIdentifier::new(Hash::digest(raw).to_string()))
            .collect();
        debug!("Mempool OK: {} transactions", ids.len());
        Ok(MempoolResponse::new(ids))
    }

    /// Get a Mempool Transaction
    pub async fn mempool_transaction(
        &self,
        msg: models::MempoolTransactionRequest,
    ) -> Result<MempoolTransactionResponse, ApiError> {
        let node = self.node()?;
        let chain_id = self.verify_network_id(&msg.network_identifier).await?;

        let txs = node.unconfirmed_transactions().await.map_err(|e| {
            error!("MempoolTransaction: unable to get unconfirmed transactions: {}", e);
            ApiError::UnableToGetTransactions(node_error(&e))
        })?;
        let wanted = msg.transaction_identifier.hash.to_lowercase();
        let raw = txs
            .iter()
            .find(|raw| Hash::digest(raw).to_string() == wanted)
            .ok_or(ApiError::TransactionNotFound(None))?;

        let mut decoder = TransactionsDecoder::new(&chain_id);
        decoder.decode_tx(raw, None).map_err(|e| {
            error!("MempoolTransaction: unable to decode {}: {}", wanted, e);
            ApiError::UnableToGetTransactions(into_error(e.to_string()))
        })?;
        let transaction = decoder
            .into_transactions()
            .into_iter()
            .next()
            .ok_or(ApiError::UnableToGetTransactions(None))?;
        debug!("MempoolTransaction OK: {}", wanted);
        Ok(MempoolTransactionResponse::new(transaction))
    }

    /// Get List of Available Networks
    pub async fn network_list(
        &self,
        _: models::MetadataRequest,
    ) -> Result<NetworkListResponse, ApiError> {
        let net_id = self.network_id().await?;
        debug!("NetworkList OK: {}", net_id.network);
        Ok(NetworkListResponse::new(vec![net_id]))
    }

    /// Get Network Options
    pub async fn network_options(
        &self,
        msg: models::NetworkRequest,
    ) -> Result<NetworkOptionsResponse, ApiError> {
        self.verify_network_id(&msg.network_identifier).await?;

        let node_version = match &self.backend {
            Backend::Offline { .. } => OFFLINE_NODE_VERSION.to_string(),
            Backend::Online(node) => {
                node.node_status()
                    .await
                    .map_err(|e| {
                        error!("NetworkOptions: unable to get node status: {}", e);
                        ApiError::UnableToGetNodeStatus(node_error(&e))
                    })?
                    .software_version
            }
        };

        let version = Version::new(
            API_VERSION.to_string(),
            node_version,
            Some(MIDDLEWARE_VERSION.to_string()),
        );
        let statuses = vec![
            OperationStatus::new(STATUS_OK.to_string(), true),
            OperationStatus::new(STATUS_FAILED.to_string(), false),
        ];
        let types = OperationType::all()
            .iter()
            .map(|t| t.to_string())
            .collect();
        let errors = ApiError::all().iter().map(Error::new).collect();

        debug!("NetworkOptions OK");
        Ok(NetworkOptionsResponse::new(
            version,
            Allow::new(statuses, types, errors, true),
        ))
    }

    /// Get Network Status
    pub async fn network_status(
        &self,
        msg: models::NetworkRequest,
    ) -> Result<NetworkStatusResponse, ApiError> {
        let node = self.node()?;
        self.verify_network_id(&msg.network_identifier).await?;

        let status = node.node_status().await.map_err(|e| {
            error!("NetworkStatus: unable to get node status: {}", e);
            ApiError::UnableToGetNodeStatus(node_error(&e))
        })?;
        let cs = status.consensus;

        let genesis_hash = if cs.genesis_hash.is_empty() {
            GENESIS_HASH_NOT_AVAILABLE.to_string()
        } else {
            cs.genesis_hash.to_string()
        };
        let oldest = if cs.last_retained_hash.is_empty() {
            None
        } else {
            Some(BlockIdentifier::new(
                cs.last_retained_height,
                cs.last_retained_hash.to_string(),
            ))
        };
        let peers = cs.node_peers.into_iter().map(Peer::new).collect();

        debug!("NetworkStatus OK: latest height {}", cs.latest_height);
        Ok(NetworkStatusResponse::new(
            BlockIdentifier::new(cs.latest_height, cs.latest_hash.to_string()),
            Timestamp::from(cs.latest_time.saturating_mul(1000)),
            BlockIdentifier::new(cs.genesis_height, genesis_hash),
            oldest,
            peers,
        ))
    }
}

fn decode_signed_transaction(text: &str) -> Result<SignedTransaction, ApiError> {
    SignedTransaction::from_base64(text).map_err(|e| {
        error!("Malformed signed transaction: {}", e);
        malformed_value(format!("signed transaction: {}", e))
    })
}
