#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::Value;

use rusty_transfer_core::{
    erc20, Asset, ChainClient, ClockPort, HistoryPort, HistoryRow, PortError, TokenInfo,
    TransferReceipt, WalletPort, PENDING_APPROVAL_CODE,
};

pub const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Default)]
pub struct WalletScript {
    pub present: bool,
    pub chain_id: u64,
    pub accounts: Vec<Address>,
    pub balance: U256,
    pub token_balance: U256,
    pub pending_approvals: u32,
    pub prompt_delay: Duration,
    pub reject_send: Option<PortError>,
    pub revert: bool,
    pub request_accounts_calls: u32,
    pub sent: Vec<Value>,
    pub calls: Vec<(Address, Bytes)>,
    pub next_block: u64,
}

#[derive(Debug, Default)]
pub struct ScriptedWallet {
    pub script: Mutex<WalletScript>,
}

impl ScriptedWallet {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            script: Mutex::new(WalletScript {
                present: true,
                chain_id: 1,
                accounts: vec![sender()],
                balance,
                next_block: 100,
                ..WalletScript::default()
            }),
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn edit(&self, f: impl FnOnce(&mut WalletScript)) {
        let mut g = self.script.lock().expect("wallet script lock");
        f(&mut g);
    }

    pub fn request_accounts_calls(&self) -> u32 {
        self.script.lock().expect("wallet script lock").request_accounts_calls
    }

    pub fn sent(&self) -> Vec<Value> {
        self.script.lock().expect("wallet script lock").sent.clone()
    }
}

impl WalletPort for ScriptedWallet {
    fn detect(&self) -> Result<(), PortError> {
        if self.script.lock().expect("wallet script lock").present {
            Ok(())
        } else {
            Err(PortError::NotFound("no wallet in test".to_owned()))
        }
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        let delay = {
            let mut g = self.script.lock().expect("wallet script lock");
            g.request_accounts_calls += 1;
            if g.pending_approvals > 0 {
                g.pending_approvals -= 1;
                return Err(PortError::Rpc {
                    code: PENDING_APPROVAL_CODE,
                    message: "Already processing eth_requestAccounts. Please wait.".to_owned(),
                });
            }
            g.prompt_delay
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(self.script.lock().expect("wallet script lock").accounts.clone())
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        Ok(self.script.lock().expect("wallet script lock").chain_id)
    }

    fn balance(&self, _account: Address) -> Result<U256, PortError> {
        Ok(self.script.lock().expect("wallet script lock").balance)
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError> {
        let mut g = self.script.lock().expect("wallet script lock");
        g.calls.push((to, data));
        Ok(Bytes::from(g.token_balance.to_be_bytes::<32>().to_vec()))
    }

    fn send_transaction(&self, tx_payload: &Value) -> Result<B256, PortError> {
        let mut g = self.script.lock().expect("wallet script lock");
        if let Some(err) = g.reject_send.clone() {
            return Err(err);
        }
        g.sent.push(tx_payload.clone());
        Ok(tx_hash(g.sent.len() as u8))
    }

    fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransferReceipt, PortError> {
        let mut g = self.script.lock().expect("wallet script lock");
        g.next_block += 1;
        Ok(TransferReceipt {
            tx_hash,
            block_number: g.next_block,
            success: !g.revert,
        })
    }
}

/// Returns queued responses in order, then repeats the last one.
#[derive(Debug, Default)]
pub struct ScriptedHistory {
    responses: Mutex<VecDeque<Result<Vec<HistoryRow>, PortError>>>,
    last: Mutex<Option<Result<Vec<HistoryRow>, PortError>>>,
    pub calls: AtomicU64,
}

impl ScriptedHistory {
    pub fn new(responses: Vec<Result<Vec<HistoryRow>, PortError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(None),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistoryPort for ScriptedHistory {
    fn transactions(&self, _account: Address) -> Result<Vec<HistoryRow>, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().expect("history lock").pop_front();
        let mut last = self.last.lock().expect("history last lock");
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last.clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock lock").clone()
    }
}

impl ClockPort for RecordingClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(1_739_750_400_000)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("clock lock").push(duration);
    }
}

pub type TestClient = ChainClient<ScriptedWallet, ScriptedHistory>;

pub fn new_client(wallet: ScriptedWallet, history: ScriptedHistory) -> TestClient {
    ChainClient::new(wallet, history, vec![Asset::Ether, Asset::Token(token())])
}

pub fn ready_client(balance: U256) -> TestClient {
    let client = new_client(ScriptedWallet::with_balance(balance), ScriptedHistory::default());
    client.initialize().expect("initialize");
    client
}

pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(ONE_ETHER)
}

pub fn sender() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid sender")
}

pub fn receiver() -> Address {
    "0x000000000000000000000000000000000000cafe"
        .parse()
        .expect("valid receiver")
}

pub fn token() -> TokenInfo {
    TokenInfo {
        address: "0x000000000000000000000000000000000000beef"
            .parse()
            .expect("valid token"),
        symbol: "USDX".to_owned(),
        decimals: 6,
    }
}

pub fn tx_hash(n: u8) -> B256 {
    B256::repeat_byte(n)
}

pub fn history_row(hash: B256) -> HistoryRow {
    HistoryRow {
        hash,
        from: sender(),
        to: Some(receiver()),
        value: U256::from(ONE_ETHER),
        gas_price: U256::from(21_000_000_000u64),
        timestamp: Some(1_700_000_000),
        block_number: Some(101),
    }
}

pub fn token_transfer_data(amount: U256) -> String {
    let data = erc20::transfer_calldata(receiver(), amount).expect("encode");
    alloy::hex::encode_prefixed(&data)
}
