use lottery_common::{
    api::node::GetInfoResult,
    network::Network,
    rpc::client::{JsonRPCClient, JsonRPCError},
};
use lottery_node::{config::RPCConfig, core::blockchain::Blockchain, rpc::NodeRpcServer};

async fn start_server() -> (std::sync::Arc<NodeRpcServer>, String) {
    let config = RPCConfig {
        rpc_bind_address: "127.0.0.1:0".to_owned(),
        rpc_threads: 1,
    };
    let server = NodeRpcServer::new(Blockchain::new(Network::Standalone), config)
        .await
        .expect("start rpc server");
    let address = server.get_bound_addresses().await[0];
    (server, format!("http://{}", address))
}

#[actix_rt::test]
async fn test_json_rpc_over_http() {
    let (server, base) = start_server().await;
    let client = JsonRPCClient::new(format!("{}/json_rpc", base)).expect("client");

    let info: GetInfoResult = client.call("get_info").await.expect("get_info");
    assert_eq!(info.height, 0);
    assert_eq!(info.network, Network::Standalone);

    let err = client
        .call::<serde_json::Value>("get_missing_method")
        .await
        .unwrap_err();
    assert!(matches!(err, JsonRPCError::MethodNotFound { .. }));

    server.stop().await;
}

#[actix_rt::test]
async fn test_health_route() {
    let (server, base) = start_server().await;
    let response = reqwest::get(format!("{}/health", base))
        .await
        .expect("health request");
    assert!(response.status().is_success());
    server.stop().await;
}
