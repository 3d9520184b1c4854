use structopt::clap::AppSettings;
use structopt::StructOpt;

use oasis_rosetta_gateway::node_client::{wait_for_socket, GrpcNodeClient};
use oasis_rosetta_gateway::rosetta_server::RosettaApiServer;
use oasis_rosetta_gateway::{RosettaRequestHandler, API_VERSION, MIDDLEWARE_VERSION};

use log::{error, info};
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

const SOCKET_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, StructOpt)]
#[structopt(global_settings = &[AppSettings::DisableVersion])]
struct Opt {
    #[structopt(short = "a", long = "address", default_value = "0.0.0.0")]
    listen_address: String,
    #[structopt(
        short = "p",
        long = "port",
        env = "OASIS_ROSETTA_GATEWAY_PORT",
        default_value = "8080"
    )]
    listen_port: u16,
    /// Node gRPC endpoint, either `unix:<path>` or `host:port`.
    #[structopt(long = "node-grpc-addr", env = "OASIS_NODE_GRPC_ADDR")]
    node_grpc_addr: Option<String>,
    /// Any non-empty value serves only the endpoints that need no node.
    #[structopt(long = "offline-mode", env = "OASIS_ROSETTA_GATEWAY_OFFLINE_MODE")]
    offline_mode: Option<String>,
    #[structopt(
        long = "offline-mode-chain-id",
        env = "OASIS_ROSETTA_GATEWAY_OFFLINE_MODE_CHAIN_ID"
    )]
    offline_mode_chain_id: Option<String>,
    /// Print the gateway and Rosetta API versions and exit.
    #[structopt(short = "V", long = "version")]
    version: bool,
}

impl Opt {
    fn offline(&self) -> bool {
        self.offline_mode.as_deref().map_or(false, |v| !v.is_empty())
    }
}

fn config_error(msg: &str) -> Error {
    error!("{}", msg);
    Error::new(ErrorKind::InvalidInput, msg)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let opt = Opt::from_args();
    if opt.version {
        println!("Software version: {}", MIDDLEWARE_VERSION);
        println!("Rosetta API version: {}", API_VERSION);
        return Ok(());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let req_handler = if opt.offline() {
        let chain_id = opt
            .offline_mode_chain_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| config_error("offline mode requires the chain ID to be set"))?;
        info!("Offline mode, serving chain {}", chain_id);
        RosettaRequestHandler::new_offline(chain_id)
    } else {
        let grpc_addr = opt
            .node_grpc_addr
            .clone()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| config_error("the node gRPC address must be set"))?;
        wait_for_socket(&grpc_addr, SOCKET_POLL_INTERVAL).await;
        let client = GrpcNodeClient::new(grpc_addr);
        info!("Using node at {}", client.addr());
        RosettaRequestHandler::new(Arc::new(client))
    };

    let addr = format!("{}:{}", opt.listen_address, opt.listen_port);
    info!("Listening on {}", addr);
    let serv = RosettaApiServer::new(req_handler, addr)?;

    // actix server catches kill signals and stops by itself
    serv.run().await
}
