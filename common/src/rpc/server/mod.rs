use actix_web::{
    web::{self, Data},
    HttpRequest, HttpResponse, Responder,
};
use std::net::IpAddr;

use super::{RPCHandler, RpcResponseError};
use crate::context::Context;

/// Client address information for RPC requests.
#[derive(Debug, Clone)]
pub struct ClientAddr(pub Option<IpAddr>);

// trait to retrieve easily a JSON RPC handler for registered route
pub trait RPCServerHandler<T: Send + Clone> {
    fn get_rpc_handler(&self) -> &RPCHandler<T>;
}

// JSON RPC handler endpoint
pub async fn json_rpc<T, H>(
    server: Data<H>,
    request: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, RpcResponseError>
where
    T: Send + Sync + Clone + 'static,
    H: RPCServerHandler<T>,
{
    let mut context = Context::new();
    context.store(server.get_rpc_handler().get_data().clone());
    context.store(ClientAddr(request.peer_addr().map(|addr| addr.ip())));

    let result = server
        .get_rpc_handler()
        .handle_request_with_context(context, &body)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

// Liveness probe, answers as soon as the HTTP server accepts connections
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}
