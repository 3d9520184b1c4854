use actix_web::dev::{Server, ServerHandle};
use actix_web::error::InternalError;
use actix_web::{post, web, App, HttpResponse, HttpServer};

use crate::convert::into_error;
use crate::models::*;
use crate::RosettaRequestHandler;

use log::{error, info};

const MAX_JSON_BODY: usize = 4 * 1024 * 1024;

fn to_rosetta_response<S: serde::Serialize>(result: Result<S, ApiError>) -> HttpResponse {
    match result {
        Ok(x) => match serde_json::to_string(&x) {
            Ok(resp) => HttpResponse::Ok()
                .content_type("application/json")
                .body(resp),
            Err(e) => HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(Error::serialization_error_json_str(into_error(e.to_string()))),
        },
        Err(err) => match serde_json::to_string(&err) {
            Ok(resp) => HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(resp),
            Err(e) => HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(Error::serialization_error_json_str(into_error(e.to_string()))),
        },
    }
}

/// Request bodies over 4 MiB are rejected, and every body that fails to
/// deserialize is answered with a MalformedValue error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(|err, _req| {
            error!("Malformed request body: {}", err);
            let resp = HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(Error::serialization_error_json_str(into_error(
                    err.to_string(),
                )));
            InternalError::from_response(err, resp).into()
        })
}

#[post("/account/balance")]
async fn account_balance(
    msg: web::Json<AccountBalanceRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.account_balance(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/account/coins")]
async fn account_coins(
    msg: web::Json<AccountCoinsRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.account_coins(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/block")]
async fn block(
    msg: web::Json<BlockRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.block(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/block/transaction")]
async fn block_transaction(
    msg: web::Json<BlockTransactionRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.block_transaction(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/combine")]
async fn construction_combine(
    msg: web::Json<ConstructionCombineRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_combine(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/derive")]
async fn construction_derive(
    msg: web::Json<ConstructionDeriveRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_derive(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/hash")]
async fn construction_hash(
    msg: web::Json<ConstructionHashRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_hash(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/metadata")]
async fn construction_metadata(
    msg: web::Json<ConstructionMetadataRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_metadata(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/parse")]
async fn construction_parse(
    msg: web::Json<ConstructionParseRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_parse(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/payloads")]
async fn construction_payloads(
    msg: web::Json<ConstructionPayloadsRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_payloads(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/preprocess")]
async fn construction_preprocess(
    msg: web::Json<ConstructionPreprocessRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_preprocess(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/construction/submit")]
async fn construction_submit(
    msg: web::Json<ConstructionSubmitRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.construction_submit(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/network/list")]
async fn network_list(
    msg: web::Json<MetadataRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.network_list(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/network/options")]
async fn network_options(
    msg: web::Json<NetworkRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.network_options(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/network/status")]
async fn network_status(
    msg: web::Json<NetworkRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.network_status(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/mempool")]
async fn mempool(
    msg: web::Json<NetworkRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.mempool(msg.into_inner()).await;
    to_rosetta_response(res)
}

#[post("/mempool/transaction")]
async fn mempool_transaction(
    msg: web::Json<MempoolTransactionRequest>,
    req_handler: web::Data<RosettaRequestHandler>,
) -> HttpResponse {
    let res = req_handler.mempool_transaction(msg.into_inner()).await;
    to_rosetta_response(res)
}

/// Registers every Rosetta route. The handler and [`json_config`] must be
/// provided as app data by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(account_balance)
        .service(account_coins)
        .service(block)
        .service(block_transaction)
        .service(construction_combine)
        .service(construction_derive)
        .service(construction_hash)
        .service(construction_metadata)
        .service(construction_parse)
        .service(construction_payloads)
        .service(construction_preprocess)
        .service(construction_submit)
        .service(mempool)
        .service(mempool_transaction)
        .service(network_list)
        .service(network_options)
        .service(network_status);
}

pub struct RosettaApiServer {
    server: Server,
    offline: bool,
}

impl RosettaApiServer {
    pub fn new(req_handler: RosettaRequestHandler, addr: String) -> std::io::Result<Self> {
        let offline = req_handler.is_offline();
        let req_handler = web::Data::new(req_handler);

        let server = HttpServer::new(move || {
            App::new()
                .app_data(json_config())
                .app_data(req_handler.clone())
                .configure(configure)
        })
        .bind(addr)?
        .run();

        Ok(Self { server, offline })
    }

    /// A handle that can stop the server from another task.
    pub fn handle(&self) -> ServerHandle {
        self.server.handle()
    }

    pub async fn run(self) -> std::io::Result<()> {
        info!("Starting Rosetta API server");
        if self.offline {
            info!("Running in offline mode");
        }
        // actix catches the kill signals and resolves this future once the
        // workers have shut down.
        self.server.await?;
        info!("Rosetta API server stopped");
        Ok(())
    }
}
