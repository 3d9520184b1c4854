pub mod codec;

use crate::hash::Hash;
use crate::staking::{Account, Address, DebondingDelegations, Delegations, Event};
use crate::transaction::{null_as_default, SignedTransaction, TransactionResult};
use async_trait::async_trait;
use codec::CborCodec;
use log::{debug, info, warn};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::sync::RwLock;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint, Uri};
use tonic::{Code, Request, Status};
use tower::service_fn;

/// Height meaning "the latest block" in every node query.
pub const HEIGHT_LATEST: i64 = 0;

const METHOD_GET_CHAIN_CONTEXT: &str = "/oasis-core.Consensus/GetChainContext";
const METHOD_GET_BLOCK: &str = "/oasis-core.Consensus/GetBlock";
const METHOD_GET_TRANSACTIONS_WITH_RESULTS: &str =
    "/oasis-core.Consensus/GetTransactionsWithResults";
const METHOD_GET_UNCONFIRMED_TRANSACTIONS: &str =
    "/oasis-core.Consensus/GetUnconfirmedTransactions";
const METHOD_SUBMIT_TX_NO_WAIT: &str = "/oasis-core.Consensus/SubmitTxNoWait";
const METHOD_GET_SIGNER_NONCE: &str = "/oasis-core.Consensus/GetSignerNonce";
const METHOD_ACCOUNT: &str = "/oasis-core.Staking/Account";
const METHOD_DELEGATIONS_FOR: &str = "/oasis-core.Staking/DelegationsFor";
const METHOD_DEBONDING_DELEGATIONS_FOR: &str = "/oasis-core.Staking/DebondingDelegationsFor";
const METHOD_GET_EVENTS: &str = "/oasis-core.Staking/GetEvents";
const METHOD_GET_STATUS: &str = "/oasis-core.NodeController/GetStatus";

const DUPLICATE_TRANSACTION: &str = "duplicate transaction";

const UNIX_PREFIX: &str = "unix:";

/// The socket path when `addr` names a UNIX socket (`unix:<path>`).
pub fn unix_socket_path(addr: &str) -> Option<&Path> {
    addr.strip_prefix(UNIX_PREFIX).map(Path::new)
}

/// Waits until the node's UNIX socket exists. Returns right away for TCP
/// addresses.
pub async fn wait_for_socket(addr: &str, poll: Duration) {
    if let Some(path) = unix_socket_path(addr) {
        while !path.exists() {
            info!("Waiting for node socket {} to appear", path.display());
            tokio::time::sleep(poll).await;
        }
    }
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("failed to connect to node at {addr}: {reason}")]
    Connect { addr: String, reason: String },
    #[error("node call failed ({code}): {message}")]
    Rpc { code: Code, message: String },
    #[error("transaction is already known to the node")]
    DuplicateTransaction,
}

impl From<Status> for NodeError {
    fn from(status: Status) -> Self {
        if status.message().contains(DUPLICATE_TRANSACTION) {
            return NodeError::DuplicateTransaction;
        }
        NodeError::Rpc {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

/// A block header as seen by the gateway. Timestamps are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBlock {
    pub height: i64,
    pub hash: Hash,
    pub parent_height: i64,
    pub parent_hash: Hash,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionsWithResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub transactions: Vec<serde_bytes::ByteBuf>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<TransactionResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConsensusStatus {
    #[serde(default)]
    pub latest_height: i64,
    #[serde(default)]
    pub latest_hash: Hash,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub latest_time: i64,
    #[serde(default)]
    pub genesis_height: i64,
    #[serde(default)]
    pub genesis_hash: Hash,
    #[serde(default)]
    pub last_retained_height: i64,
    #[serde(default)]
    pub last_retained_hash: Hash,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node_peers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub software_version: String,
    #[serde(default)]
    pub consensus: ConsensusStatus,
}

/// Everything the gateway needs from a consensus node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn chain_id(&self) -> Result<String, NodeError>;
    async fn block(&self, height: i64) -> Result<NodeBlock, NodeError>;
    async fn account(&self, height: i64, owner: &Address) -> Result<Account, NodeError>;
    async fn delegations(&self, height: i64, owner: &Address) -> Result<Delegations, NodeError>;
    async fn debonding_delegations(
        &self,
        height: i64,
        owner: &Address,
    ) -> Result<DebondingDelegations, NodeError>;
    async fn transactions_with_results(
        &self,
        height: i64,
    ) -> Result<TransactionsWithResults, NodeError>;
    async fn unconfirmed_transactions(&self) -> Result<Vec<Vec<u8>>, NodeError>;
    async fn staking_events(&self, height: i64) -> Result<Vec<Event>, NodeError>;
    async fn submit_transaction(&self, tx: &SignedTransaction) -> Result<(), NodeError>;
    async fn next_nonce(&self, height: i64, address: &Address) -> Result<u64, NodeError>;
    async fn node_status(&self) -> Result<NodeStatus, NodeError>;
}

// Request bodies. Field order is the canonical CBOR key order.

#[derive(Serialize)]
struct OwnerQuery {
    owner: Address,
    height: i64,
}

#[derive(Serialize)]
struct SignerNonceQuery {
    height: i64,
    account_address: Address,
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    height: i64,
    #[serde(default)]
    hash: Hash,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    time: i64,
}

#[derive(Clone)]
struct Connection {
    /// Distinguishes successive dials, so a failed call only tears down the
    /// connection it was made on.
    id: u64,
    channel: Channel,
    chain_id: String,
    genesis_height: i64,
}

/// Connection manager for the node's gRPC endpoint. The channel, chain ID and
/// genesis height are resolved on first use and dropped whenever the node
/// reports itself unavailable.
pub struct GrpcNodeClient {
    addr: String,
    state: RwLock<Option<Connection>>,
    dials: AtomicU64,
}

async fn unary<Req, Resp>(channel: Channel, path: &'static str, req: Req) -> Result<Resp, Status>
where
    Req: Serialize + Send + Sync + 'static,
    Resp: DeserializeOwned + Send + Sync + 'static,
{
    let mut grpc = tonic::client::Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| Status::unavailable(format!("node is not ready: {}", e)))?;
    let resp = grpc
        .unary(
            Request::new(req),
            PathAndQuery::from_static(path),
            CborCodec::default(),
        )
        .await?;
    Ok(resp.into_inner())
}

impl GrpcNodeClient {
    /// `addr` is either `unix:<path>` or a `host:port` pair. Nothing is dialed
    /// until the first call.
    pub fn new(addr: String) -> Self {
        GrpcNodeClient {
            addr,
            state: RwLock::new(None),
            dials: AtomicU64::new(0),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn connect_error<E: std::fmt::Display>(&self, e: E) -> NodeError {
        NodeError::Connect {
            addr: self.addr.clone(),
            reason: e.to_string(),
        }
    }

    async fn dial(&self) -> Result<Channel, NodeError> {
        if let Some(path) = unix_socket_path(&self.addr) {
            let path = PathBuf::from(path);
            // The URI is ignored by the connector.
            Endpoint::try_from("http://[::]:50051")
                .map_err(|e| self.connect_error(e))?
                .connect_with_connector(service_fn(move |_: Uri| {
                    UnixStream::connect(path.clone())
                }))
                .await
                .map_err(|e| self.connect_error(e))
        } else {
            let uri = if self.addr.starts_with("http://") || self.addr.starts_with("https://") {
                self.addr.clone()
            } else {
                format!("http://{}", self.addr)
            };
            Endpoint::from_shared(uri)
                .map_err(|e| self.connect_error(e))?
                .connect()
                .await
                .map_err(|e| self.connect_error(e))
        }
    }

    async fn connection(&self) -> Result<Connection, NodeError> {
        if let Some(conn) = self.state.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut state = self.state.write().await;
        if let Some(conn) = state.as_ref() {
            return Ok(conn.clone());
        }

        debug!("Dialing node at {}", self.addr);
        let channel = self.dial().await?;
        let status: NodeStatus = unary(channel.clone(), METHOD_GET_STATUS, ()).await?;
        let chain_id: String = unary(channel.clone(), METHOD_GET_CHAIN_CONTEXT, ()).await?;
        info!(
            "Connected to node {} (chain {}, genesis height {})",
            status.software_version, chain_id, status.consensus.genesis_height
        );

        let conn = Connection {
            id: self.dials.fetch_add(1, Ordering::SeqCst),
            channel,
            chain_id,
            genesis_height: status.consensus.genesis_height,
        };
        *state = Some(conn.clone());
        Ok(conn)
    }

    async fn call<Req, Resp>(&self, path: &'static str, req: Req) -> Result<Resp, NodeError>
    where
        Req: Serialize + Send + Sync + 'static,
        Resp: DeserializeOwned + Send + Sync + 'static,
    {
        let conn = self.connection().await?;
        let id = conn.id;
        let result = unary(conn.channel, path, req).await;
        if let Err(status) = &result {
            debug!("{} failed: {}", path, status);
            if status.code() == Code::Unavailable && self.reset_connection(id).await {
                warn!("Node at {} is unavailable, will re-dial", self.addr);
            }
        }
        result.map_err(NodeError::from)
    }

    /// Forgets the cached connection if it is still the one numbered `id`.
    /// Another task may already have replaced it with a fresh one.
    async fn reset_connection(&self, id: u64) -> bool {
        let mut state = self.state.write().await;
        if state.as_ref().map(|c| c.id) != Some(id) {
            return false;
        }
        *state = None;
        true
    }
}

#[async_trait]
impl NodeClient for GrpcNodeClient {
    async fn chain_id(&self) -> Result<String, NodeError> {
        Ok(self.connection().await?.chain_id)
    }

    async fn block(&self, height: i64) -> Result<NodeBlock, NodeError> {
        let genesis_height = self.connection().await?.genesis_height;
        let blk: RawBlock = self.call(METHOD_GET_BLOCK, height).await?;

        let parent_height = std::cmp::max(blk.height - 1, genesis_height);
        let parent_hash = if parent_height == blk.height {
            blk.hash
        } else {
            let parent: RawBlock = self.call(METHOD_GET_BLOCK, parent_height).await?;
            parent.hash
        };

        Ok(NodeBlock {
            height: blk.height,
            hash: blk.hash,
            parent_height,
            parent_hash,
            timestamp: blk.time.saturating_mul(1000),
        })
    }

    async fn account(&self, height: i64, owner: &Address) -> Result<Account, NodeError> {
        self.call(
            METHOD_ACCOUNT,
            OwnerQuery {
                owner: *owner,
                height,
            },
        )
        .await
    }

    async fn delegations(&self, height: i64, owner: &Address) -> Result<Delegations, NodeError> {
        let delegations: Option<Delegations> = self
            .call(
                METHOD_DELEGATIONS_FOR,
                OwnerQuery {
                    owner: *owner,
                    height,
                },
            )
            .await?;
        Ok(delegations.unwrap_or_default())
    }

    async fn debonding_delegations(
        &self,
        height: i64,
        owner: &Address,
    ) -> Result<DebondingDelegations, NodeError> {
        let delegations: Option<DebondingDelegations> = self
            .call(
                METHOD_DEBONDING_DELEGATIONS_FOR,
                OwnerQuery {
                    owner: *owner,
                    height,
                },
            )
            .await?;
        Ok(delegations.unwrap_or_default())
    }

    async fn transactions_with_results(
        &self,
        height: i64,
    ) -> Result<TransactionsWithResults, NodeError> {
        self.call(METHOD_GET_TRANSACTIONS_WITH_RESULTS, height)
            .await
    }

    async fn unconfirmed_transactions(&self) -> Result<Vec<Vec<u8>>, NodeError> {
        let txs: Option<Vec<serde_bytes::ByteBuf>> =
            self.call(METHOD_GET_UNCONFIRMED_TRANSACTIONS, ()).await?;
        Ok(txs
            .unwrap_or_default()
            .into_iter()
            .map(serde_bytes::ByteBuf::into_vec)
            .collect())
    }

    async fn staking_events(&self, height: i64) -> Result<Vec<Event>, NodeError> {
        let events: Option<Vec<Event>> = self.call(METHOD_GET_EVENTS, height).await?;
        Ok(events.unwrap_or_default())
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> Result<(), NodeError> {
        let _: IgnoredAny = self.call(METHOD_SUBMIT_TX_NO_WAIT, tx.clone()).await?;
        Ok(())
    }

    async fn next_nonce(&self, height: i64, address: &Address) -> Result<u64, NodeError> {
        self.call(
            METHOD_GET_SIGNER_NONCE,
            SignerNonceQuery {
                height,
                account_address: *address,
            },
        )
        .await
    }

    async fn node_status(&self) -> Result<NodeStatus, NodeError> {
        self.call(METHOD_GET_STATUS, ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_cbor::Value;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::marker::PhantomData;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Mutex};
    use tokio::net::UnixListener;
    use tokio_stream::wrappers::UnixListenerStream;
    use tonic::body::BoxBody;
    use tonic::codegen::{http, BoxFuture, Context, Poll, Service};
    use tonic::server::{Grpc, NamedService, UnaryService};
    use tonic::transport::{Body, Server};

    /// Answers the handful of node methods the connection manager touches and
    /// counts how often each one was called.
    #[derive(Default)]
    struct FakeNode {
        calls: Mutex<HashMap<String, usize>>,
        unavailable_once: AtomicBool,
    }

    fn text_map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::Text(k.to_string()), v))
                .collect(),
        )
    }

    impl FakeNode {
        fn calls(&self, path: &str) -> usize {
            self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
        }

        fn answer(&self, path: &str) -> Result<Value, Status> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default() += 1;
            match path {
                METHOD_GET_STATUS => Ok(text_map(vec![
                    ("software_version", Value::Text("21.3".to_string())),
                    (
                        "consensus",
                        text_map(vec![("genesis_height", Value::Integer(5))]),
                    ),
                ])),
                METHOD_GET_CHAIN_CONTEXT => Ok(Value::Text("test-chain".to_string())),
                METHOD_GET_SIGNER_NONCE => {
                    if self.unavailable_once.swap(false, Ordering::SeqCst) {
                        Err(Status::unavailable("node is restarting"))
                    } else {
                        Ok(Value::Integer(9))
                    }
                }
                _ => Err(Status::unimplemented(path.to_string())),
            }
        }
    }

    trait ServiceName {
        const NAME: &'static str;
    }

    #[derive(Clone)]
    struct Consensus;

    impl ServiceName for Consensus {
        const NAME: &'static str = "oasis-core.Consensus";
    }

    #[derive(Clone)]
    struct NodeController;

    impl ServiceName for NodeController {
        const NAME: &'static str = "oasis-core.NodeController";
    }

    /// One gRPC service of the fake node, speaking the same CBOR codec as
    /// the client.
    #[derive(Clone)]
    struct FakeService<S> {
        node: Arc<FakeNode>,
        _name: PhantomData<S>,
    }

    impl<S> FakeService<S> {
        fn new(node: Arc<FakeNode>) -> Self {
            FakeService {
                node,
                _name: PhantomData,
            }
        }
    }

    impl<S: ServiceName> NamedService for FakeService<S> {
        const NAME: &'static str = S::NAME;
    }

    struct FakeMethod {
        node: Arc<FakeNode>,
        path: String,
    }

    impl UnaryService<Value> for FakeMethod {
        type Response = Value;
        type Future = BoxFuture<tonic::Response<Value>, Status>;

        fn call(&mut self, _req: tonic::Request<Value>) -> Self::Future {
            let resp = self.node.answer(&self.path).map(tonic::Response::new);
            Box::pin(async move { resp })
        }
    }

    impl<S> Service<http::Request<Body>> for FakeService<S> {
        type Response = http::Response<BoxBody>;
        type Error = Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<Body>) -> Self::Future {
            let method = FakeMethod {
                node: self.node.clone(),
                path: req.uri().path().to_string(),
            };
            Box::pin(async move {
                let mut grpc = Grpc::new(CborCodec::<Value, Value>::default());
                Ok(grpc.unary(method, req).await)
            })
        }
    }

    /// Serves a fresh fake node on a UNIX socket in `dir`.
    fn serve_fake_node(dir: &Path) -> (Arc<FakeNode>, GrpcNodeClient) {
        let path = dir.join("internal.sock");
        let node = Arc::new(FakeNode::default());
        let listener = UnixListener::bind(&path).unwrap();
        let server = Server::builder()
            .add_service(FakeService::<NodeController>::new(node.clone()))
            .add_service(FakeService::<Consensus>::new(node.clone()))
            .serve_with_incoming(UnixListenerStream::new(listener));
        tokio::spawn(server);
        (node, GrpcNodeClient::new(format!("unix:{}", path.display())))
    }

    #[actix_rt::test]
    async fn connection_is_cached_until_node_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let (node, client) = serve_fake_node(dir.path());
        let signer = Address::from_public_key(&[4u8; 32]);

        // Nothing is dialed before the first request.
        assert_eq!(node.calls(METHOD_GET_STATUS), 0);

        assert_eq!(client.chain_id().await.unwrap(), "test-chain");
        assert_eq!(client.next_nonce(HEIGHT_LATEST, &signer).await.unwrap(), 9);
        assert_eq!(client.next_nonce(HEIGHT_LATEST, &signer).await.unwrap(), 9);
        assert_eq!(client.chain_id().await.unwrap(), "test-chain");
        assert_eq!(node.calls(METHOD_GET_STATUS), 1);
        assert_eq!(node.calls(METHOD_GET_CHAIN_CONTEXT), 1);
        assert_eq!(node.calls(METHOD_GET_SIGNER_NONCE), 2);
        assert_eq!(client.connection().await.unwrap().genesis_height, 5);

        node.unavailable_once.store(true, Ordering::SeqCst);
        match client.next_nonce(HEIGHT_LATEST, &signer).await {
            Err(NodeError::Rpc { code, .. }) => assert_eq!(code, Code::Unavailable),
            r => panic!("unexpected result {:?}", r),
        }
        assert!(client.state.read().await.is_none());

        assert_eq!(client.next_nonce(HEIGHT_LATEST, &signer).await.unwrap(), 9);
        assert_eq!(node.calls(METHOD_GET_STATUS), 2);
        assert_eq!(node.calls(METHOD_GET_CHAIN_CONTEXT), 2);
    }

    #[actix_rt::test]
    async fn stale_failure_keeps_newer_connection() {
        let dir = tempfile::tempdir().unwrap();
        let (node, client) = serve_fake_node(dir.path());

        let first = client.connection().await.unwrap().id;
        assert!(client.reset_connection(first).await);
        let second = client.connection().await.unwrap().id;
        assert_ne!(first, second);

        // A call that failed on the first connection reports in late.
        assert!(!client.reset_connection(first).await);
        assert_eq!(
            client.state.read().await.as_ref().map(|c| c.id),
            Some(second)
        );
        assert_eq!(node.calls(METHOD_GET_STATUS), 2);
    }

    #[test]
    fn duplicate_submissions_are_recognized() {
        let dup = Status::invalid_argument("txpool: duplicate transaction");
        assert!(matches!(
            NodeError::from(dup),
            NodeError::DuplicateTransaction
        ));

        let other = Status::unavailable("connection refused");
        match NodeError::from(other) {
            NodeError::Rpc { code, message } => {
                assert_eq!(code, Code::Unavailable);
                assert_eq!(message, "connection refused");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn status_tolerates_missing_fields() {
        let raw = serde_cbor::to_vec(&serde_cbor::Value::Map(
            vec![(
                serde_cbor::Value::Text("software_version".to_string()),
                serde_cbor::Value::Text("21.1".to_string()),
            )]
            .into_iter()
            .collect(),
        ))
        .unwrap();
        let status: NodeStatus = serde_cbor::from_slice(&raw).unwrap();
        assert_eq!(status.software_version, "21.1");
        assert!(status.consensus.genesis_hash.is_empty());
        assert!(status.consensus.node_peers.is_empty());
    }

    #[test]
    fn unix_addresses() {
        assert_eq!(
            unix_socket_path("unix:/node/internal.sock"),
            Some(Path::new("/node/internal.sock"))
        );
        assert_eq!(unix_socket_path("127.0.0.1:42261"), None);
    }

    #[actix_rt::test]
    async fn waits_for_socket_to_appear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("internal.sock");
        let addr = format!("unix:{}", path.display());

        let creator = {
            let path = path.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                std::fs::write(path, b"").unwrap();
            })
        };
        tokio::time::timeout(
            Duration::from_secs(5),
            wait_for_socket(&addr, Duration::from_millis(10)),
        )
        .await
        .expect("socket never showed up");
        assert!(path.exists());
        creator.await.unwrap();

        // TCP addresses never wait.
        wait_for_socket("localhost:42261", Duration::from_secs(60)).await;
    }

    #[test]
    fn owner_query_uses_canonical_key_order() {
        let q = OwnerQuery {
            owner: Address::from_public_key(&[3u8; 32]),
            height: 5,
        };
        let raw = serde_cbor::to_vec(&q).unwrap();
        // map(2), text(5) "owner" comes before text(6) "height"
        assert_eq!(&raw[..7], &[0xa2, 0x65, b'o', b'w', b'n', b'e', b'r']);
    }
}
