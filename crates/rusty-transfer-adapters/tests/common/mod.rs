#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::{Address, B256};
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use rusty_transfer_adapters::{
    Eip1193Adapter, ExplorerAdapter, RuntimeProfile, TransferAdapterConfig,
};
use rusty_transfer_core::{ChainClient, TokenInfo};

pub type AdapterClient = ChainClient<Eip1193Adapter, ExplorerAdapter>;

/// Reply to one request: HTTP status and JSON body.
pub type Reply = (u16, Value);

/// Start a local HTTP server answering with `handler`. Each request's path
/// and body are recorded in the returned log.
pub fn spawn_mock_server<F>(handler: F) -> (String, Arc<Mutex<Vec<(String, Value)>>>)
where
    F: Fn(&str, &Value) -> Reply + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);

    thread::spawn(move || loop {
        let mut req = match server.recv() {
            Ok(r) => r,
            Err(_) => break,
        };
        let path = req.url().to_owned();
        let mut raw = String::new();
        let _ = req.as_reader().read_to_string(&mut raw);
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        if let Ok(mut g) = log.lock() {
            g.push((path.clone(), body.clone()));
        }
        let (code, payload) = handler(&path, &body);
        let response = Response::from_string(payload.to_string()).with_status_code(StatusCode(code));
        let _ = req.respond(response);
    });

    (addr, calls)
}

/// Spawn a JSON-RPC wallet whose `handler` maps method and params to either
/// `Ok(result)` or `Err((code, message))`.
pub fn spawn_rpc_wallet<F>(handler: F) -> (String, Arc<Mutex<Vec<(String, Value)>>>)
where
    F: Fn(&str, &Value) -> Result<Value, (i64, &'static str)> + Send + 'static,
{
    spawn_mock_server(move |_, body| {
        let method = body["method"].as_str().unwrap_or_default();
        let id = body["id"].clone();
        match handler(method, &body["params"]) {
            Ok(result) => (200, json!({"jsonrpc": "2.0", "id": id, "result": result})),
            Err((code, message)) => (
                200,
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}),
            ),
        }
    })
}

pub fn rpc_methods(calls: &Arc<Mutex<Vec<(String, Value)>>>) -> Vec<String> {
    calls
        .lock()
        .expect("calls lock")
        .iter()
        .filter_map(|(_, body)| body["method"].as_str().map(str::to_owned))
        .collect()
}

pub fn proxy_config(url: &str) -> TransferAdapterConfig {
    TransferAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        eip1193_proxy_url: Some(url.to_owned()),
        request_timeout_ms: 5_000,
        receipt_poll_interval_ms: 10,
        receipt_timeout_ms: 2_000,
        ..TransferAdapterConfig::default()
    }
}

pub fn dev_config() -> TransferAdapterConfig {
    TransferAdapterConfig {
        runtime_profile: RuntimeProfile::Development,
        token: Some(token()),
        ..TransferAdapterConfig::default()
    }
}

/// Deterministic wallet wired to an in-memory explorer over its ledger.
pub fn deterministic_client(cfg: TransferAdapterConfig) -> AdapterClient {
    let assets = cfg.assets();
    let chain_id = cfg.chain_id;
    let wallet = Eip1193Adapter::with_config(cfg);
    let ledger = wallet.ledger().expect("deterministic ledger");
    let client = ChainClient::new(wallet, ExplorerAdapter::in_memory(ledger), assets)
        .with_chain_id(chain_id);
    client.initialize().expect("initialize");
    client
}

pub fn dev_account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("dev account")
}

pub fn receiver() -> Address {
    "0x000000000000000000000000000000000000cafe"
        .parse()
        .expect("receiver")
}

pub fn token() -> TokenInfo {
    TokenInfo {
        address: "0x000000000000000000000000000000000000beef"
            .parse()
            .expect("token"),
        symbol: "USDX".to_owned(),
        decimals: 6,
    }
}

pub fn hash(byte: u8) -> B256 {
    B256::repeat_byte(byte)
}
