use chainhost_client::engine::loopback::{LoopbackConfig, LoopbackEngine};
use chainhost_client::{AddChainOptions, Chain, Client, ClientError, Logger};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

type LoopbackClient = Client<Arc<LoopbackEngine>>;

fn loopback_client(config: LoopbackConfig) -> LoopbackClient {
    Client::with_logger(Arc::new(LoopbackEngine::new(config, Logger::silent())), Logger::silent())
}

fn relay_spec(id: &str) -> String {
    json!({
        "name": format!("{id} relay"),
        "id": id,
        "chainType": "Live",
        "bootNodes": [],
        "properties": { "tokenDecimals": 10 },
        "genesis": { "raw": { "top": {}, "childrenDefault": {} } }
    })
    .to_string()
}

fn para_spec(relay: &str) -> String {
    json!({
        "name": "Asset Hub",
        "id": "asset-hub",
        "relay_chain": relay,
        "para_id": 1000,
        "genesis": { "raw": { "top": {}, "childrenDefault": {} } }
    })
    .to_string()
}

fn request(id: u64, method: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method }).to_string()
}

async fn next_json(chain: &Chain<Arc<LoopbackEngine>>) -> JsonValue {
    let response = tokio::time::timeout(Duration::from_secs(5), chain.next_json_rpc_response())
        .await
        .expect("response in time")
        .expect("response");
    serde_json::from_str(&response).expect("response is JSON")
}

#[tokio::test]
async fn parachain_round_trip_through_relay_chain() {
    let client = loopback_client(LoopbackConfig::default());
    let relay = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("relay");
    let para = client
        .add_chain(
            AddChainOptions::new(para_spec("polkadot"))
                .with_potential_relay_chains([relay.token()])
                .with_database_content("cached"),
        )
        .await
        .expect("parachain");
    assert_eq!(client.engine().relay_chain_of(para.id()), Some(relay.id()));

    para.send_json_rpc(request(1, "system_chain")).expect("send");
    let response = next_json(&para).await;
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"], "Asset Hub");

    para.send_json_rpc(request(2, "chainHead_unstable_finalizedDatabase")).expect("send");
    assert_eq!(next_json(&para).await["result"], "cached");

    relay.send_json_rpc(request(3, "system_properties")).expect("send");
    assert_eq!(next_json(&relay).await["result"]["tokenDecimals"], 10);
}

#[tokio::test]
async fn unknown_method_is_answered_not_rejected() {
    let client = loopback_client(LoopbackConfig::default());
    let chain = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain");

    chain.send_json_rpc(request(7, "eth_chainId")).expect("valid JSON-RPC is forwarded");
    let response = next_json(&chain).await;
    assert_eq!(response["id"], 7);
    assert_eq!(response["error"]["code"], -32601);

    let err = chain.send_json_rpc("definitely not json").expect_err("malformed");
    assert!(matches!(err, ClientError::MalformedJsonRpc { .. }));
}

#[tokio::test]
async fn removed_relay_candidate_is_excluded_not_fatal() {
    let client = loopback_client(LoopbackConfig::default());
    let stale = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("stale");
    let live = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("live");
    stale.remove().expect("remove stale relay");

    // With both candidates alive the engine would refuse the ambiguity.
    let para = client
        .add_chain(
            AddChainOptions::new(para_spec("polkadot"))
                .with_potential_relay_chains([stale.token(), live.token()]),
        )
        .await
        .expect("stale candidate is skipped");
    assert_eq!(client.engine().relay_chain_of(para.id()), Some(live.id()));
}

#[tokio::test]
async fn parachain_without_relay_candidates_is_refused() {
    let client = loopback_client(LoopbackConfig::default());
    let err = client
        .add_chain(AddChainOptions::new(para_spec("polkadot")))
        .await
        .expect_err("no relay chain");
    assert!(matches!(err, ClientError::AddChain { .. }));

    let err = client.add_chain(AddChainOptions::new("{}")).await.expect_err("invalid spec");
    assert!(matches!(err, ClientError::AddChain { .. }));
    assert!(!client.is_terminated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_each_get_a_distinct_response() {
    const READERS: u64 = 16;
    let client = loopback_client(LoopbackConfig::default());
    let chain =
        Arc::new(client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain"));

    let mut readers = JoinSet::new();
    for _ in 0..READERS {
        let chain = Arc::clone(&chain);
        readers.spawn(async move { chain.next_json_rpc_response().await });
    }
    for id in 0..READERS {
        chain.send_json_rpc(request(id, "system_name")).expect("send");
    }

    let mut seen = BTreeSet::new();
    while let Some(joined) = readers.join_next().await {
        let response = joined.expect("reader panicked").expect("response");
        let parsed: JsonValue = serde_json::from_str(&response).expect("JSON");
        let id = parsed["id"].as_u64().expect("numeric id");
        assert!(seen.insert(id), "response {id} delivered twice");
    }
    assert_eq!(seen, (0..READERS).collect::<BTreeSet<_>>());
}

#[tokio::test]
async fn saturated_response_queue_pushes_back_on_send() {
    let client = loopback_client(LoopbackConfig { max_pending_responses: 3, ..Default::default() });
    let chain = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain");

    for id in 0..3 {
        chain.send_json_rpc(request(id, "system_name")).expect("room in queue");
    }
    assert_eq!(chain.send_json_rpc(request(3, "system_name")), Err(ClientError::QueueFull));

    next_json(&chain).await;
    chain.send_json_rpc(request(4, "system_name")).expect("room after reading");
}

#[tokio::test]
async fn removing_a_chain_fails_pending_readers() {
    let client = loopback_client(LoopbackConfig::default());
    let chain = Arc::new(client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain"));

    let reader = tokio::spawn({
        let chain = Arc::clone(&chain);
        async move { chain.next_json_rpc_response().await }
    });
    tokio::task::yield_now().await;
    chain.remove().expect("remove");

    let outcome = tokio::time::timeout(Duration::from_secs(5), reader)
        .await
        .expect("reader finishes")
        .expect("reader panicked");
    assert_eq!(outcome, Err(ClientError::chain_removed()));
    assert_eq!(client.engine().chain_count(), 0);
}

#[tokio::test]
async fn removed_relay_chain_stays_alive_for_its_parachain() {
    let client = loopback_client(LoopbackConfig::default());
    let relay = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("relay");
    let para = client
        .add_chain(AddChainOptions::new(para_spec("polkadot")).with_potential_relay_chains([relay.token()]))
        .await
        .expect("parachain");

    relay.remove().expect("remove relay");
    assert_eq!(relay.send_json_rpc(request(1, "system_name")), Err(ClientError::chain_removed()));
    assert!(client.engine().is_alive(relay.id()));

    para.send_json_rpc(request(2, "system_chain")).expect("parachain unaffected");
    assert_eq!(next_json(&para).await["result"], "Asset Hub");

    para.remove().expect("remove parachain");
    assert_eq!(client.engine().chain_count(), 0);
}

#[tokio::test]
async fn terminate_shuts_the_engine_down() {
    let client = loopback_client(LoopbackConfig::default());
    let chain = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain");

    client.terminate().await.expect("terminate");
    assert_eq!(client.engine().chain_count(), 0);
    assert_eq!(client.terminate().await, Err(ClientError::client_destroyed()));
    assert_eq!(chain.send_json_rpc(request(1, "system_name")), Err(ClientError::client_destroyed()));
    assert_eq!(chain.next_json_rpc_response().await, Err(ClientError::client_destroyed()));
}

#[tokio::test]
async fn engine_crash_is_sticky() {
    let engine = Arc::new(LoopbackEngine::new(LoopbackConfig::default(), Logger::silent()));
    let client = Client::with_logger(Arc::clone(&engine), Logger::silent());
    let chain = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain");

    engine.simulate_crash("runtime trapped");
    let crash = ClientError::crash("runtime trapped");
    assert_eq!(chain.send_json_rpc(request(1, "system_name")), Err(crash.clone()));
    assert!(client.is_terminated());
    assert_eq!(chain.remove(), Err(crash.clone()));
    assert_eq!(client.terminate().await, Err(crash));
}

#[tokio::test]
async fn activity_is_reported_through_the_log_sink() {
    let lines = Arc::new(Mutex::new(Vec::<(u32, String)>::new()));
    let captured = Arc::clone(&lines);
    let logger = Logger::new(
        Arc::new(move |level: u32, target: &str, _message: &str| {
            captured.lock().expect("lines mutex poisoned").push((level, target.to_owned()));
        }),
        5,
    );
    let engine = LoopbackEngine::new(LoopbackConfig::default(), logger.clone());
    let client = Client::with_logger(engine, logger);
    let chain = client.add_chain(AddChainOptions::new(relay_spec("polkadot"))).await.expect("chain");
    chain.remove().expect("remove");
    client.terminate().await.expect("terminate");

    let lines = lines.lock().expect("lines mutex poisoned");
    assert!(lines.iter().all(|(level, _)| (1..=5).contains(level)));
    assert!(lines.iter().any(|(_, target)| target == "chainhost::loopback"));
    assert!(lines.iter().any(|(_, target)| target == "chainhost::client"));
}
