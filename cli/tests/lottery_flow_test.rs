use std::sync::Arc;

use lottery_cli::{
    api::{ApiError, LotteryApi},
    providers::{LotteryProviders, NodeClient, ProviderError},
    wallet::Wallet,
};
use lottery_common::{
    contract::{Circuit, LotteryError},
    crypto::hash,
    network::Network,
    transaction::ProvenTransaction,
};
use lottery_node::{
    config::RPCConfig,
    core::blockchain::Blockchain,
    rpc::{NodeRpcServer, SharedNodeRpcServer},
};
use tempfile::tempdir;

async fn start_node() -> (SharedNodeRpcServer, Arc<NodeClient>) {
    let config = RPCConfig {
        rpc_bind_address: "127.0.0.1:0".to_owned(),
        rpc_threads: 1,
    };
    let server = NodeRpcServer::new(Blockchain::new(Network::Standalone), config)
        .await
        .expect("start node");
    let address = server.get_bound_addresses().await[0];
    let node = NodeClient::new(&format!("http://{}", address)).expect("node client");
    (server, Arc::new(node))
}

fn providers(node: &Arc<NodeClient>, wallet: Wallet) -> LotteryProviders {
    LotteryProviders::new(Arc::clone(node), Arc::new(wallet))
}

fn seeded_wallet(byte: u8) -> Wallet {
    Wallet::from_seed([byte; 32], Network::Standalone)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_round() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let wallet = Wallet::genesis(Network::Standalone);
    let info = wallet.wait_for_sync(&node).await.unwrap();
    assert_eq!(info.height, 0);

    let (api, receipt) = LotteryApi::deploy(providers(&node, wallet), dir.path())
        .await
        .unwrap();
    assert_eq!(&receipt.contract_address, api.get_contract_address());
    assert_eq!(api.get_cached_state().await.unwrap().total_tickets, 0);

    assert_eq!(api.buy_ticket().await.unwrap().ticket_id, 1);
    assert_eq!(api.buy_ticket().await.unwrap().ticket_id, 2);
    assert_eq!(api.get_owned_tickets().await, vec![1, 2]);

    api.draw_winner(2).await.unwrap();
    let (ticket, _) = api.claim_prize().await.unwrap();
    assert_eq!(ticket, 2);

    let state = api.get_ledger_state().await.unwrap();
    assert_eq!(state.round, 1);
    assert_eq!(state.total_tickets, 2);
    assert_eq!(state.winning_ticket, 2);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_claim_without_winning_ticket_submits_nothing() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let (alice, receipt) = LotteryApi::deploy(providers(&node, seeded_wallet(1)), dir.path())
        .await
        .unwrap();
    let bob = LotteryApi::join(
        providers(&node, seeded_wallet(2)),
        receipt.contract_address.clone(),
        dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(alice.buy_ticket().await.unwrap().ticket_id, 1);
    assert_eq!(bob.buy_ticket().await.unwrap().ticket_id, 2);
    bob.draw_winner(2).await.unwrap();

    let height = node.get_info().await.unwrap().height;
    match alice.claim_prize().await {
        Err(ApiError::NoWinningTicket { winning, owned }) => {
            assert_eq!(winning, 2);
            assert_eq!(owned, vec![1]);
        }
        other => panic!("unexpected claim result: {:?}", other),
    }
    assert_eq!(node.get_info().await.unwrap().height, height);

    // Explicit losing claim is stopped by the local circuit
    assert!(matches!(
        alice.claim_ticket(1).await,
        Err(ApiError::Provider(ProviderError::Contract(LotteryError::NotWinningTicket { ticket_id: 1 })))
    ));
    assert_eq!(node.get_info().await.unwrap().height, height);

    bob.claim_prize().await.unwrap();
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_local_proof_failure_submits_nothing() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let (api, _) = LotteryApi::deploy(providers(&node, seeded_wallet(3)), dir.path())
        .await
        .unwrap();
    let height = node.get_info().await.unwrap().height;

    assert!(matches!(
        api.draw_winner(1).await,
        Err(ApiError::Provider(ProviderError::Contract(
            LotteryError::InvalidWinningTicket { winning_ticket: 1, total_tickets: 0 }
        )))
    ));
    assert_eq!(node.get_info().await.unwrap().height, height);
    assert_eq!(api.get_ledger_state().await.unwrap().round, 0);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_claim_before_draw_uses_ticket_zero() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let (api, _) = LotteryApi::deploy(providers(&node, seeded_wallet(4)), dir.path())
        .await
        .unwrap();

    // Nobody owns ticket 0 so the reconciliation flow refuses
    assert!(matches!(
        api.claim_prize().await,
        Err(ApiError::NoWinningTicket { winning: 0, .. })
    ));
    // The contract itself only compares numbers
    api.claim_ticket(0).await.unwrap();

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_node_assertion_is_reported() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let bundle = providers(&node, seeded_wallet(5));
    let (api, _) = LotteryApi::deploy(bundle.clone(), dir.path()).await.unwrap();

    // Skip the local proof to reach the node with a failing call
    let tx = bundle.wallet.balance_tx(
        api.get_contract_address().clone(),
        Circuit::DrawWinner { winning_ticket: 9 },
    );
    let result = bundle
        .submission
        .submit_tx(ProvenTransaction {
            transaction: tx,
            simulated_output: None,
        })
        .await;
    assert!(matches!(result, Err(ProviderError::Assertion(_))));

    let unknown = bundle.wallet.balance_tx(hash(b"nowhere"), Circuit::BuyTicket);
    let result = bundle
        .submission
        .submit_tx(ProvenTransaction {
            transaction: unknown,
            simulated_output: Some(1),
        })
        .await;
    assert!(matches!(result, Err(ProviderError::ContractNotFound(_))));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_join_unknown_contract_fails() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let result = LotteryApi::join(providers(&node, seeded_wallet(6)), hash(b"nowhere"), dir.path()).await;
    assert!(matches!(
        result,
        Err(ApiError::Provider(ProviderError::ContractNotFound(_)))
    ));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_owned_tickets_survive_rejoin() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let (api, receipt) = LotteryApi::deploy(providers(&node, seeded_wallet(7)), dir.path())
        .await
        .unwrap();
    api.buy_ticket().await.unwrap();
    api.buy_ticket().await.unwrap();
    drop(api);

    let rejoined = LotteryApi::join(
        providers(&node, seeded_wallet(7)),
        receipt.contract_address.clone(),
        dir.path(),
    )
    .await
    .unwrap();
    assert_eq!(rejoined.get_owned_tickets().await, vec![1, 2]);

    let stranger = LotteryApi::join(
        providers(&node, seeded_wallet(8)),
        receipt.contract_address,
        dir.path(),
    )
    .await
    .unwrap();
    assert!(stranger.get_owned_tickets().await.is_empty());

    // Ticket 1 of the old contract must not win on a new one
    let (next, next_receipt) = LotteryApi::deploy(providers(&node, seeded_wallet(7)), dir.path())
        .await
        .unwrap();
    assert!(next.get_owned_tickets().await.is_empty());
    let buyer = LotteryApi::join(
        providers(&node, seeded_wallet(11)),
        next_receipt.contract_address,
        dir.path(),
    )
    .await
    .unwrap();
    assert_eq!(buyer.buy_ticket().await.unwrap().ticket_id, 1);
    buyer.draw_winner(1).await.unwrap();
    assert!(matches!(
        next.claim_prize().await,
        Err(ApiError::NoWinningTicket { winning: 1, owned }) if owned.is_empty()
    ));
    buyer.claim_prize().await.unwrap();

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_refresh_task_updates_cache() {
    let (server, node) = start_node().await;
    let dir = tempdir().unwrap();

    let (watcher, receipt) = LotteryApi::deploy(providers(&node, seeded_wallet(9)), dir.path())
        .await
        .unwrap();
    let buyer = LotteryApi::join(
        providers(&node, seeded_wallet(10)),
        receipt.contract_address,
        dir.path(),
    )
    .await
    .unwrap();

    let task = watcher.spawn_state_refresh(std::time::Duration::from_millis(50));
    buyer.buy_ticket().await.unwrap();

    let mut refreshed = false;
    for _ in 0..40 {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        if watcher.get_cached_state().await.map(|s| s.total_tickets) == Some(1) {
            refreshed = true;
            break;
        }
    }
    task.abort();
    assert!(refreshed);

    server.stop().await;
}
