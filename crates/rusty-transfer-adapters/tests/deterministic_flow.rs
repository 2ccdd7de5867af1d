mod common;

use alloy::primitives::U256;

use rusty_transfer_adapters::{Eip1193Adapter, SystemClockAdapter, TransferAdapterConfig};
use rusty_transfer_core::{
    fetch_with_retry, Asset, ChainError, HistoryRefresh, RetryPolicy, TransferEvent,
    TransferRequest, WalletPort,
};

use common::{deterministic_client, dev_account, dev_config, receiver, token};

fn request(amount: &str, asset: Asset) -> TransferRequest {
    TransferRequest {
        receiver: receiver().to_string(),
        amount: amount.to_owned(),
        asset,
    }
}

#[test]
fn seeded_account_has_ten_ether_and_tokens() {
    let client = deterministic_client(dev_config());

    let eth = client.account_info(&Asset::Ether).expect("eth");
    assert_eq!(eth.address, dev_account());
    assert_eq!(eth.balance.formatted, "10.0");

    let usdx = client.account_info(&Asset::Token(token())).expect("token");
    assert_eq!(usdx.balance.formatted, "1000.0");
}

#[test]
fn ether_transfer_moves_balance_and_lands_in_history() {
    let client = deterministic_client(dev_config());

    let events: Vec<TransferEvent> = client
        .transfer(request("1.5", Asset::Ether))
        .collect::<Result<_, _>>()
        .expect("transfer");
    let tx_hash = events[3].tx_hash().expect("hash");
    assert!(events[3].is_done());

    assert_eq!(
        client.wallet_balance(&Asset::Ether).expect("balance").formatted,
        "8.5"
    );
    assert_eq!(
        client.wallet.balance(receiver()).expect("receiver balance"),
        U256::from(1_500_000_000_000_000_000u64)
    );

    let clock = SystemClockAdapter;
    match fetch_with_retry(&client, Some(tx_hash), &RetryPolicy::default(), &clock) {
        HistoryRefresh::Fetched { rows, attempts } => {
            assert_eq!(attempts, 1);
            assert_eq!(rows[0].hash, tx_hash);
            assert_eq!(rows[0].from, dev_account());
            assert_eq!(rows[0].to, Some(receiver()));
        }
        other => panic!("expected rows, got {other:?}"),
    }
}

#[test]
fn token_transfer_moves_token_balance_only() {
    let client = deterministic_client(dev_config());

    client
        .transfer(request("250.5", Asset::Token(token())))
        .collect::<Result<Vec<_>, _>>()
        .expect("token transfer");

    assert_eq!(
        client
            .wallet_balance(&Asset::Token(token()))
            .expect("token")
            .formatted,
        "749.5"
    );
    assert_eq!(
        client.wallet_balance(&Asset::Ether).expect("eth").formatted,
        "10.0"
    );
    let history = client.history().expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to, Some(token().address));
}

#[test]
fn consecutive_transfers_get_distinct_hashes() {
    let client = deterministic_client(dev_config());
    let mut hashes = Vec::new();
    for _ in 0..2 {
        let events: Vec<TransferEvent> = client
            .transfer(request("1", Asset::Ether))
            .collect::<Result<_, _>>()
            .expect("transfer");
        hashes.push(events[2].tx_hash().expect("hash"));
    }
    assert_ne!(hashes[0], hashes[1]);

    let history = client.history().expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].hash, hashes[1]);
}

#[test]
fn configured_approvals_delay_account_access() {
    let client = deterministic_client(TransferAdapterConfig {
        dev_pending_approvals: 1,
        ..dev_config()
    });

    let err = client.account_info(&Asset::Ether).expect_err("pending");
    assert!(err.is_pending_approval());
    let info = client.account_info(&Asset::Ether).expect("approved");
    assert_eq!(info.address, dev_account());
}

#[test]
fn overdraft_is_caught_before_sending() {
    let client = deterministic_client(dev_config());
    client
        .wallet
        .debug_set_balance(dev_account(), U256::from(1u64))
        .expect("set balance");

    let result: Result<Vec<_>, _> = client.transfer(request("0.5", Asset::Ether)).collect();
    assert!(matches!(
        result,
        Err(ChainError::InsufficientBalance { .. })
    ));
    assert!(client.history().expect("history").is_empty());
}

#[test]
fn token_overdraft_is_caught_before_sending() {
    let client = deterministic_client(dev_config());
    client
        .wallet
        .debug_set_token_balance(token().address, dev_account(), U256::from(5_000_000u64))
        .expect("set token balance");

    let result: Result<Vec<_>, _> = client
        .transfer(request("5.000001", Asset::Token(token())))
        .collect();
    match result {
        Err(ChainError::InsufficientBalance { amount, balance }) => {
            assert_eq!(amount, "5.000001");
            assert_eq!(balance, "5.0");
        }
        other => panic!("expected insufficient balance, got {other:?}"),
    }
}

#[test]
fn debug_hooks_need_the_deterministic_wallet() {
    let adapter = Eip1193Adapter::with_config(TransferAdapterConfig {
        eip1193_proxy_url: Some("http://127.0.0.1:1".to_owned()),
        ..TransferAdapterConfig::default()
    });
    assert!(adapter.ledger().is_none());
    assert!(adapter.debug_require_approval(1).is_err());
}
