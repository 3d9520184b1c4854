use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;

// Rosetta API objects, following https://github.com/coinbase/rosetta-specifications
// Only the objects and fields this gateway reads or writes are modelled.

pub type Object = serde_json::map::Map<String, serde_json::Value>;

// Identifiers

/// The network_identifier specifies which network a particular object is
/// associated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkIdentifier {
    pub blockchain: String,

    /// For the consensus layer this is the chain ID (the chain domain
    /// separation context derived from the genesis document).
    pub network: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_network_identifier: Option<SubNetworkIdentifier>,
}

impl NetworkIdentifier {
    pub fn new(blockchain: String, network: String) -> NetworkIdentifier {
        NetworkIdentifier {
            blockchain,
            network,
            sub_network_identifier: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubNetworkIdentifier {
    pub network: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl SubNetworkIdentifier {
    pub fn new(network: String) -> SubNetworkIdentifier {
        SubNetworkIdentifier {
            network,
            metadata: None,
        }
    }
}

/// The account_identifier uniquely identifies an account within a network.
/// Addresses are bech32 encoded staking addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_account: Option<SubAccountIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl AccountIdentifier {
    pub fn new(address: String) -> AccountIdentifier {
        AccountIdentifier {
            address,
            sub_account: None,
            metadata: None,
        }
    }

    pub fn with_sub_account(address: String, sub_account: &str) -> AccountIdentifier {
        AccountIdentifier {
            address,
            sub_account: Some(SubAccountIdentifier::new(sub_account.to_string())),
            metadata: None,
        }
    }
}

/// An account may have state specific to a contract address or, as here, a
/// separately tracked escrow balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAccountIdentifier {
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl SubAccountIdentifier {
    pub fn new(address: String) -> SubAccountIdentifier {
        SubAccountIdentifier {
            address,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockIdentifier {
    /// This is also known as the block height.
    pub index: i64,
    pub hash: String,
}

impl BlockIdentifier {
    pub fn new(index: i64, hash: String) -> BlockIdentifier {
        BlockIdentifier { index, hash }
    }
}

/// When fetching data by BlockIdentifier, it may be possible to only specify
/// the index or hash. If neither property is specified, it is assumed that
/// the client is making a request at the current block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialBlockIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl PartialBlockIdentifier {
    pub fn by_index(index: i64) -> PartialBlockIdentifier {
        PartialBlockIdentifier {
            index: Some(index),
            hash: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

impl TransactionIdentifier {
    pub fn new(hash: String) -> TransactionIdentifier {
        TransactionIdentifier { hash }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    /// Relative to the transaction, starting from 0.
    pub index: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_index: Option<i64>,
}

impl OperationIdentifier {
    pub fn new(index: i64) -> OperationIdentifier {
        OperationIdentifier {
            index,
            network_index: None,
        }
    }
}

// Amounts

/// Amount is some Value of a Currency. It is considered invalid to specify a
/// Value without a Currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    /// Value of the transaction in atomic units represented as an
    /// arbitrary-sized signed integer.
    pub value: String,

    pub currency: Currency,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Amount {
    pub fn new(value: String, currency: Currency) -> Amount {
        Amount {
            value,
            currency,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,

    /// Number of decimal places in the standard unit representation of the
    /// amount.
    pub decimals: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Currency {
    pub fn new(symbol: String, decimals: u32) -> Currency {
        Currency {
            symbol,
            decimals,
            metadata: None,
        }
    }
}

// Blocks, transactions and operations

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_identifier: BlockIdentifier,
    pub parent_block_identifier: BlockIdentifier,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Block {
    pub fn new(
        block_identifier: BlockIdentifier,
        parent_block_identifier: BlockIdentifier,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
    ) -> Block {
        Block {
            block_identifier,
            parent_block_identifier,
            timestamp,
            transactions,
            metadata: None,
        }
    }
}

/// Transactions contain an array of Operations that are attributable to the
/// same TransactionIdentifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_identifier: TransactionIdentifier,
    pub operations: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Transaction {
    pub fn new(
        transaction_identifier: TransactionIdentifier,
        operations: Vec<Operation>,
    ) -> Transaction {
        Transaction {
            transaction_identifier,
            operations,
            metadata: None,
        }
    }
}

/// Operations contain all balance-changing information within a transaction.
/// They are always one-sided (only affect 1 AccountIdentifier) and can succeed
/// or fail independently from a Transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,

    /// Restricted to indexes lower than this operation's index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_operations: Option<Vec<OperationIdentifier>>,

    #[serde(rename = "type")]
    pub _type: String,

    /// Unset while constructing, set once the operation is on chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Operation {
    pub fn new(
        op_id: i64,
        _type: String,
        status: Option<String>,
        account: Option<AccountIdentifier>,
        amount: Option<Amount>,
    ) -> Operation {
        Operation {
            operation_identifier: OperationIdentifier::new(op_id),
            related_operations: None,
            _type,
            status,
            account,
            amount,
            metadata: None,
        }
    }
}

/// OperationStatus is utilized to indicate which Operation status are
/// considered successful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    pub successful: bool,
}

impl OperationStatus {
    pub fn new(status: String, successful: bool) -> OperationStatus {
        OperationStatus { status, successful }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl From<i64> for Timestamp {
    fn from(x: i64) -> Self {
        Timestamp(x)
    }
}

impl From<Timestamp> for i64 {
    fn from(x: Timestamp) -> Self {
        x.0
    }
}

impl ::std::ops::Deref for Timestamp {
    type Target = i64;
    fn deref(&self) -> &i64 {
        &self.0
    }
}

// Network

/// A MetadataRequest is utilized in any request where the only argument is
/// optional metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl MetadataRequest {
    pub fn new() -> MetadataRequest {
        MetadataRequest { metadata: None }
    }
}

/// A NetworkRequest is utilized to retrieve some data specific exclusively to
/// a NetworkIdentifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl NetworkRequest {
    pub fn new(network_identifier: NetworkIdentifier) -> NetworkRequest {
        NetworkRequest {
            network_identifier: Some(network_identifier),
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkListResponse {
    pub network_identifiers: Vec<NetworkIdentifier>,
}

impl NetworkListResponse {
    pub fn new(network_identifiers: Vec<NetworkIdentifier>) -> NetworkListResponse {
        NetworkListResponse {
            network_identifiers,
        }
    }
}

/// NetworkStatusResponse contains basic information about the node's view of
/// a blockchain network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatusResponse {
    pub current_block_identifier: BlockIdentifier,

    /// Milliseconds since the Unix epoch.
    pub current_block_timestamp: Timestamp,

    pub genesis_block_identifier: BlockIdentifier,

    /// The oldest block the node can still serve, if it has pruned history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_block_identifier: Option<BlockIdentifier>,

    pub peers: Vec<Peer>,
}

impl NetworkStatusResponse {
    pub fn new(
        current_block_identifier: BlockIdentifier,
        current_block_timestamp: Timestamp,
        genesis_block_identifier: BlockIdentifier,
        oldest_block_identifier: Option<BlockIdentifier>,
        peers: Vec<Peer>,
    ) -> NetworkStatusResponse {
        NetworkStatusResponse {
            current_block_identifier,
            current_block_timestamp,
            genesis_block_identifier,
            oldest_block_identifier,
            peers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub peer_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Peer {
    pub fn new(peer_id: String) -> Peer {
        Peer {
            peer_id,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkOptionsResponse {
    pub version: Version,
    pub allow: Allow,
}

impl NetworkOptionsResponse {
    pub fn new(version: Version, allow: Allow) -> NetworkOptionsResponse {
        NetworkOptionsResponse { version, allow }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub rosetta_version: String,
    pub node_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl Version {
    pub fn new(
        rosetta_version: String,
        node_version: String,
        middleware_version: Option<String>,
    ) -> Version {
        Version {
            rosetta_version,
            node_version,
            middleware_version,
            metadata: None,
        }
    }
}

/// Allow specifies supported Operation status, Operation types, and all
/// possible error statuses. Clients use it to validate the correctness of the
/// implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allow {
    pub operation_statuses: Vec<OperationStatus>,
    pub operation_types: Vec<String>,
    pub errors: Vec<Error>,
    pub historical_balance_lookup: bool,
}

impl Allow {
    pub fn new(
        operation_statuses: Vec<OperationStatus>,
        operation_types: Vec<String>,
        errors: Vec<Error>,
        historical_balance_lookup: bool,
    ) -> Allow {
        Allow {
            operation_statuses,
            operation_types,
            errors,
            historical_balance_lookup,
        }
    }
}

// Account

/// If the block_identifier is populated, a historical balance query should be
/// performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub account_identifier: AccountIdentifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_identifier: Option<PartialBlockIdentifier>,
}

impl AccountBalanceRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        account_identifier: AccountIdentifier,
    ) -> AccountBalanceRequest {
        AccountBalanceRequest {
            network_identifier: Some(network_identifier),
            account_identifier,
            block_identifier: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceResponse {
    pub block_identifier: BlockIdentifier,
    pub balances: Vec<Amount>,

    /// Carries the account nonce, and for the escrow sub-account the share
    /// pool and delegation breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl AccountBalanceResponse {
    pub fn new(block_identifier: BlockIdentifier, balances: Vec<Amount>) -> AccountBalanceResponse {
        AccountBalanceResponse {
            block_identifier,
            balances,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCoinsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub account_identifier: AccountIdentifier,

    #[serde(default)]
    pub include_mempool: bool,
}

impl AccountCoinsRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        account_identifier: AccountIdentifier,
    ) -> AccountCoinsRequest {
        AccountCoinsRequest {
            network_identifier: Some(network_identifier),
            account_identifier,
            include_mempool: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinIdentifier {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub coin_identifier: CoinIdentifier,
    pub amount: Amount,
}

/// Account-based chains have no coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCoinsResponse {
    pub block_identifier: BlockIdentifier,
    pub coins: Vec<Coin>,
}

// Block

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_identifier: Option<PartialBlockIdentifier>,
}

impl BlockRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        block_identifier: PartialBlockIdentifier,
    ) -> BlockRequest {
        BlockRequest {
            network_identifier: Some(network_identifier),
            block_identifier: Some(block_identifier),
        }
    }
}

/// A BlockResponse includes a fully-populated block. All transactions are
/// returned inline, so other_transactions is never populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_transactions: Option<Vec<TransactionIdentifier>>,
}

impl BlockResponse {
    pub fn new(block: Option<Block>) -> BlockResponse {
        BlockResponse {
            block,
            other_transactions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub block_identifier: BlockIdentifier,
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTransactionResponse {
    pub transaction: Transaction,
}

// Mempool

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MempoolResponse {
    pub transaction_identifiers: Vec<TransactionIdentifier>,
}

impl MempoolResponse {
    pub fn new(transaction_identifiers: Vec<TransactionIdentifier>) -> MempoolResponse {
        MempoolResponse {
            transaction_identifiers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MempoolTransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub transaction_identifier: TransactionIdentifier,
}

impl MempoolTransactionRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        transaction_identifier: TransactionIdentifier,
    ) -> MempoolTransactionRequest {
        MempoolTransactionRequest {
            network_identifier: Some(network_identifier),
            transaction_identifier,
        }
    }
}

/// A MempoolTransactionResponse contains an estimate of a mempool transaction.
/// Operations are reported with status OK since the transaction has not been
/// executed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MempoolTransactionResponse {
    pub transaction: Transaction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl MempoolTransactionResponse {
    pub fn new(transaction: Transaction) -> MempoolTransactionResponse {
        MempoolTransactionResponse {
            transaction,
            metadata: None,
        }
    }
}

// Construction

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    #[serde(rename = "secp256k1")]
    SECP256K1,
    #[serde(rename = "secp256r1")]
    SECP256R1,
    #[serde(rename = "edwards25519")]
    EDWARDS25519,
    #[serde(rename = "tweedle")]
    TWEEDLE,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    #[serde(rename = "ecdsa")]
    ECDSA,
    #[serde(rename = "ecdsa_recovery")]
    ECDSA_RECOVERY,
    #[serde(rename = "ed25519")]
    ED25519,
    #[serde(rename = "schnorr_1")]
    SCHNORR_1,
    #[serde(rename = "schnorr_poseidon")]
    SCHNORR_POSEIDON,
}

/// PublicKey contains a public key byte array for a particular CurveType
/// encoded in hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
    pub hex_bytes: String,
    pub curve_type: CurveType,
}

impl PublicKey {
    pub fn new(hex_bytes: String, curve_type: CurveType) -> PublicKey {
        PublicKey {
            hex_bytes,
            curve_type,
        }
    }
}

/// SigningPayload is signed by the client with the keypair associated with
/// the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningPayload {
    /// Deprecated in favour of account_identifier, kept for older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier: Option<AccountIdentifier>,

    pub hex_bytes: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<SignatureType>,
}

/// Signature contains the payload that was signed, the public keys of the
/// keypairs used to produce the signature, the signature (encoded in hex),
/// and the SignatureType.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signing_payload: SigningPayload,
    pub public_key: PublicKey,
    pub signature_type: SignatureType,
    pub hex_bytes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionDeriveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub public_key: PublicKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl ConstructionDeriveRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        public_key: PublicKey,
    ) -> ConstructionDeriveRequest {
        ConstructionDeriveRequest {
            network_identifier: Some(network_identifier),
            public_key,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionDeriveResponse {
    /// Deprecated in favour of account_identifier, kept for older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier: Option<AccountIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionPreprocessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub operations: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl ConstructionPreprocessRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        operations: Vec<Operation>,
    ) -> ConstructionPreprocessRequest {
        ConstructionPreprocessRequest {
            network_identifier: Some(network_identifier),
            operations,
            metadata: None,
        }
    }
}

/// The options object is passed verbatim to /construction/metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionPreprocessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionMetadataRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Object>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<PublicKey>>,
}

impl ConstructionMetadataRequest {
    pub fn new(network_identifier: NetworkIdentifier) -> ConstructionMetadataRequest {
        ConstructionMetadataRequest {
            network_identifier: Some(network_identifier),
            options: None,
            public_keys: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionMetadataResponse {
    pub metadata: Object,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fee: Option<Vec<Amount>>,
}

impl ConstructionMetadataResponse {
    pub fn new(metadata: Object) -> ConstructionMetadataResponse {
        ConstructionMetadataResponse {
            metadata,
            suggested_fee: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionPayloadsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub operations: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<PublicKey>>,
}

impl ConstructionPayloadsRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        operations: Vec<Operation>,
    ) -> ConstructionPayloadsRequest {
        ConstructionPayloadsRequest {
            network_identifier: Some(network_identifier),
            operations,
            metadata: None,
            public_keys: None,
        }
    }
}

/// The unsigned transaction is a base64 encoded CBOR envelope, the payloads
/// list the bytes each signer needs to sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionPayloadsResponse {
    pub unsigned_transaction: String,
    pub payloads: Vec<SigningPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionCombineRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub unsigned_transaction: String,
    pub signatures: Vec<Signature>,
}

impl ConstructionCombineRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        unsigned_transaction: String,
        signatures: Vec<Signature>,
    ) -> ConstructionCombineRequest {
        ConstructionCombineRequest {
            network_identifier: Some(network_identifier),
            unsigned_transaction,
            signatures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionCombineResponse {
    pub signed_transaction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionParseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    /// Whether transaction is the combined, signed form or the output of
    /// /construction/payloads.
    pub signed: bool,

    pub transaction: String,
}

impl ConstructionParseRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        signed: bool,
        transaction: String,
    ) -> ConstructionParseRequest {
        ConstructionParseRequest {
            network_identifier: Some(network_identifier),
            signed,
            transaction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionParseResponse {
    pub operations: Vec<Operation>,

    /// Deprecated in favour of account_identifier_signers, kept for older
    /// clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier_signers: Option<Vec<AccountIdentifier>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionHashRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub signed_transaction: String,
}

impl ConstructionHashRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        signed_transaction: String,
    ) -> ConstructionHashRequest {
        ConstructionHashRequest {
            network_identifier: Some(network_identifier),
            signed_transaction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionSubmitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,

    pub signed_transaction: String,
}

impl ConstructionSubmitRequest {
    pub fn new(
        network_identifier: NetworkIdentifier,
        signed_transaction: String,
    ) -> ConstructionSubmitRequest {
        ConstructionSubmitRequest {
            network_identifier: Some(network_identifier),
            signed_transaction,
        }
    }
}

/// Returned by /construction/hash and /construction/submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionIdentifierResponse {
    pub transaction_identifier: TransactionIdentifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Object>,
}

impl TransactionIdentifierResponse {
    pub fn new(transaction_identifier: TransactionIdentifier) -> TransactionIdentifierResponse {
        TransactionIdentifierResponse {
            transaction_identifier,
            metadata: None,
        }
    }
}

// Errors

/// Instead of utilizing HTTP status codes to describe node errors (which often
/// do not have a good analog), rich errors are returned using this object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    pub code: u32,

    /// The message never changes for a given code, contextual information
    /// goes into details.
    pub message: String,

    pub retriable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Object>,
}

impl Error {
    pub fn new(err_type: &ApiError) -> Self {
        use ApiError::*;
        let (code, msg, retriable, details) = match err_type {
            UnableToGetChainId(d) => (1, "unable to get chain ID", true, d),
            InvalidBlockchain(d) => (
                2,
                "invalid blockchain specified in network identifier",
                false,
                d,
            ),
            InvalidSubnetwork(d) => (3, "invalid sub-network identifier", false, d),
            InvalidNetwork(d) => (
                4,
                "invalid network specified in network identifier",
                false,
                d,
            ),
            MissingNetworkIdentifier(d) => (5, "network identifier is missing", false, d),
            UnableToGetLatestBlock(d) => (6, "unable to get latest block", true, d),
            UnableToGetGenesisBlock(d) => (7, "unable to get genesis block", true, d),
            UnableToGetAccount(d) => (8, "unable to get account", true, d),
            MustQueryByIndex(d) => (9, "blocks must be queried by index and not hash", false, d),
            InvalidAccountAddress(d) => (10, "invalid account address", false, d),
            MustSpecifySubAccount(d) => (
                11,
                "a valid subaccount must be specified ('general' or 'escrow')",
                false,
                d,
            ),
            UnableToGetBlock(d) => (12, "unable to get block", true, d),
            NotImplemented(d) => (13, "operation not implemented", false, d),
            UnableToGetTransactions(d) => (14, "unable to get transactions", true, d),
            UnableToSubmitTransaction(d) => (15, "unable to submit transaction", false, d),
            UnableToGetNextNonce(d) => (16, "unable to get next nonce", true, d),
            MalformedValue(d) => (17, "malformed value", false, d),
            UnableToGetNodeStatus(d) => (18, "unable to get node status", true, d),
            TransactionNotFound(d) => (19, "transaction not found", false, d),
            NotAvailableInOfflineMode(d) => (20, "not available in offline mode", false, d),
        };
        Self {
            code,
            message: msg.to_string(),
            retriable,
            details: details.clone(),
        }
    }

    pub fn serialization_error_json_str(details: Option<Object>) -> String {
        // Must match the code and message of ApiError::MalformedValue
        json!({
                "code": 17,
                "message": "malformed value",
                "retriable": false,
                "details": details
        })
        .to_string()
    }
}

/// The closed set of errors the gateway reports. Code, message and
/// retriability are fixed per variant, the optional object carries details.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    UnableToGetChainId(Option<Object>),
    InvalidBlockchain(Option<Object>),
    InvalidSubnetwork(Option<Object>),
    InvalidNetwork(Option<Object>),
    MissingNetworkIdentifier(Option<Object>),
    UnableToGetLatestBlock(Option<Object>),
    UnableToGetGenesisBlock(Option<Object>),
    UnableToGetAccount(Option<Object>),
    MustQueryByIndex(Option<Object>),
    InvalidAccountAddress(Option<Object>),
    MustSpecifySubAccount(Option<Object>),
    UnableToGetBlock(Option<Object>),
    NotImplemented(Option<Object>),
    UnableToGetTransactions(Option<Object>),
    UnableToSubmitTransaction(Option<Object>),
    UnableToGetNextNonce(Option<Object>),
    MalformedValue(Option<Object>),
    UnableToGetNodeStatus(Option<Object>),
    TransactionNotFound(Option<Object>),
    NotAvailableInOfflineMode(Option<Object>),
}

impl ApiError {
    /// Every error the gateway can return, in code order and without details.
    pub fn all() -> Vec<ApiError> {
        use ApiError::*;
        vec![
            UnableToGetChainId(None),
            InvalidBlockchain(None),
            InvalidSubnetwork(None),
            InvalidNetwork(None),
            MissingNetworkIdentifier(None),
            UnableToGetLatestBlock(None),
            UnableToGetGenesisBlock(None),
            UnableToGetAccount(None),
            MustQueryByIndex(None),
            InvalidAccountAddress(None),
            MustSpecifySubAccount(None),
            UnableToGetBlock(None),
            NotImplemented(None),
            UnableToGetTransactions(None),
            UnableToSubmitTransaction(None),
            UnableToGetNextNonce(None),
            MalformedValue(None),
            UnableToGetNodeStatus(None),
            TransactionNotFound(None),
            NotAvailableInOfflineMode(None),
        ]
    }

    pub fn code(&self) -> u32 {
        Error::new(self).code
    }

    pub fn details(&self) -> Option<&Object> {
        use ApiError::*;
        match self {
            UnableToGetChainId(d)
            | InvalidBlockchain(d)
            | InvalidSubnetwork(d)
            | InvalidNetwork(d)
            | MissingNetworkIdentifier(d)
            | UnableToGetLatestBlock(d)
            | UnableToGetGenesisBlock(d)
            | UnableToGetAccount(d)
            | MustQueryByIndex(d)
            | InvalidAccountAddress(d)
            | MustSpecifySubAccount(d)
            | UnableToGetBlock(d)
            | NotImplemented(d)
            | UnableToGetTransactions(d)
            | UnableToSubmitTransaction(d)
            | UnableToGetNextNonce(d)
            | MalformedValue(d)
            | UnableToGetNodeStatus(d)
            | TransactionNotFound(d)
            | NotAvailableInOfflineMode(d) => d.as_ref(),
        }
    }
}

impl serde::Serialize for ApiError {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        Error::new(self).serialize(s)
    }
}
