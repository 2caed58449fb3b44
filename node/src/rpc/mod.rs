pub mod rpc;

use std::{net::SocketAddr, sync::Arc};

use actix_web::{
    dev::ServerHandle,
    get,
    web::{self, Data},
    App, HttpResponse, HttpServer, Responder,
};
use anyhow::Context;
use log::{info, warn};
use lottery_common::{
    config::{self, HEALTH_PATH, JSON_RPC_PATH},
    rpc::{
        server::{health, json_rpc, RPCServerHandler},
        RPCHandler,
    },
};
use tokio::sync::Mutex;

use crate::{config::RPCConfig, core::blockchain::Blockchain};

pub type SharedNodeRpcServer = Arc<NodeRpcServer>;

pub struct NodeRpcServer {
    handle: Mutex<Option<ServerHandle>>,
    rpc_handler: RPCHandler<Arc<Blockchain>>,
    bound_addresses: Mutex<Vec<SocketAddr>>,
}

impl NodeRpcServer {
    pub async fn new(
        blockchain: Arc<Blockchain>,
        config: RPCConfig,
    ) -> anyhow::Result<SharedNodeRpcServer> {
        // create the RPC Handler which will register and contains all available methods
        let mut rpc_handler = RPCHandler::new(blockchain);
        rpc::register_methods(&mut rpc_handler);

        if config.rpc_bind_address.starts_with("0.0.0.0") {
            warn!("RPC server is bound to all interfaces, anyone reaching this host can submit transactions");
        }

        if log::log_enabled!(log::Level::Info) {
            info!("Starting RPC server on {}", config.rpc_bind_address);
        }

        let server = Arc::new(Self {
            handle: Mutex::new(None),
            rpc_handler,
            bound_addresses: Mutex::new(Vec::new()),
        });

        {
            let clone = Arc::clone(&server);
            let builder = HttpServer::new(move || {
                let server = Arc::clone(&clone);
                App::new()
                    .app_data(Data::from(server))
                    .route(
                        JSON_RPC_PATH,
                        web::post().to(json_rpc::<Arc<Blockchain>, NodeRpcServer>),
                    )
                    .route(HEALTH_PATH, web::get().to(health))
                    .service(index)
            })
            .disable_signals()
            .bind(&config.rpc_bind_address)
            .with_context(|| {
                format!("Error while binding RPC server on {}", config.rpc_bind_address)
            })?;

            *server.bound_addresses.lock().await = builder.addrs();

            let http_server = builder.workers(config.rpc_threads.max(1)).run();
            {
                // save the server handle to be able to stop it later
                let handle = http_server.handle();
                let mut lock = server.handle.lock().await;
                *lock = Some(handle);
            }
            tokio::spawn(http_server);
        }

        Ok(server)
    }

    // Addresses the HTTP server actually listens on
    pub async fn get_bound_addresses(&self) -> Vec<SocketAddr> {
        self.bound_addresses.lock().await.clone()
    }

    pub async fn stop(&self) {
        info!("Stopping RPC Server...");
        let mut handle = self.handle.lock().await;
        if let Some(handle) = handle.take() {
            handle.stop(false).await;
            info!("RPC Server is now stopped!");
        } else {
            warn!("RPC Server is not running!");
        }
    }
}

impl RPCServerHandler<Arc<Blockchain>> for NodeRpcServer {
    fn get_rpc_handler(&self) -> &RPCHandler<Arc<Blockchain>> {
        &self.rpc_handler
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body(format!("Lottery node\nRunning on: {}", config::VERSION))
}
