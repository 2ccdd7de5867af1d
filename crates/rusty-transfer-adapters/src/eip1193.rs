use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use alloy::primitives::{address, keccak256, Address, Bytes, B256, U256};
use serde_json::Value;

use rusty_transfer_core::{
    erc20, ClockPort, HistoryRow, PortError, TransferReceipt, WalletPort, PENDING_APPROVAL_CODE,
};

use crate::{SharedLedger, SystemClockAdapter, TransferAdapterConfig};

const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// Geth's code for a transaction the sender cannot pay for.
const INSUFFICIENT_FUNDS_CODE: i64 = -32000;
const DETERMINISTIC_GAS_PRICE: u64 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    clock: SystemClockAdapter,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic(Arc<Mutex<DeterministicWallet>>),
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

/// In-process wallet used in development and tests. Transactions are mined
/// immediately, one block each.
#[derive(Debug)]
struct DeterministicWallet {
    accounts: Vec<Address>,
    chain_id: u64,
    balances: HashMap<Address, U256>,
    token_balances: HashMap<(Address, Address), U256>,
    pending_approvals: u32,
    nonce: u64,
    block_number: u64,
    receipts: HashMap<B256, u64>,
    ledger: SharedLedger,
}

impl DeterministicWallet {
    fn seeded(config: &TransferAdapterConfig) -> Self {
        let account = deterministic_account();
        let mut balances = HashMap::new();
        balances.insert(account, U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64)));
        let mut token_balances = HashMap::new();
        if let Some(token) = &config.token {
            token_balances.insert(
                (token.address, account),
                U256::from(1_000u64) * U256::from(10u64).pow(U256::from(token.decimals)),
            );
        }
        Self {
            accounts: vec![account],
            chain_id: config.chain_id,
            balances,
            token_balances,
            pending_approvals: config.dev_pending_approvals,
            nonce: 0,
            block_number: 1_000_000,
            receipts: HashMap::new(),
            ledger: SharedLedger::default(),
        }
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(TransferAdapterConfig::default())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: TransferAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = Duration::from_millis(config.request_timeout_ms);
            match reqwest::blocking::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                    receipt_poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
                    receipt_timeout: Duration::from_millis(config.receipt_timeout_ms),
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        tracing::warn!(error = %e, "proxy client unavailable; using deterministic wallet");
                        ProviderMode::Deterministic(Arc::new(Mutex::new(
                            DeterministicWallet::seeded(&config),
                        )))
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "no wallet provider configured; set RUSTY_TRANSFER_WALLET_URL to your wallet's RPC endpoint"
                    .to_owned(),
            )
        } else {
            ProviderMode::Deterministic(Arc::new(Mutex::new(DeterministicWallet::seeded(&config))))
        };

        Self {
            mode,
            clock: SystemClockAdapter,
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self.mode, ProviderMode::Deterministic(_))
    }

    /// Transactions sent through the deterministic wallet, for the in-memory explorer.
    pub fn ledger(&self) -> Option<SharedLedger> {
        match &self.mode {
            ProviderMode::Deterministic(state) => {
                lock(state).ok().map(|g| g.ledger.clone())
            }
            _ => None,
        }
    }

    pub fn debug_set_balance(&self, account: Address, balance: U256) -> Result<(), PortError> {
        let mut g = self.deterministic_state()?;
        g.balances.insert(account, balance);
        Ok(())
    }

    pub fn debug_set_token_balance(
        &self,
        token: Address,
        owner: Address,
        balance: U256,
    ) -> Result<(), PortError> {
        let mut g = self.deterministic_state()?;
        g.token_balances.insert((token, owner), balance);
        Ok(())
    }

    /// Make the next `times` account requests answer "pending approval".
    pub fn debug_require_approval(&self, times: u32) -> Result<(), PortError> {
        let mut g = self.deterministic_state()?;
        g.pending_approvals = times;
        Ok(())
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn deterministic_state(&self) -> Result<MutexGuard<'_, DeterministicWallet>, PortError> {
        match &self.mode {
            ProviderMode::Deterministic(state) => lock(state),
            _ => Err(PortError::Policy(
                "debug hooks require the deterministic wallet".to_owned(),
            )),
        }
    }

    fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic(_) => {
                return Err(PortError::NotImplemented("eip1193 proxy runtime not enabled"))
            }
        };

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {}: {}",
                status, body
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    fn proxy_wait_for_receipt(
        &self,
        proxy: &ProxyRuntime,
        tx_hash: B256,
    ) -> Result<TransferReceipt, PortError> {
        let started = Instant::now();
        loop {
            let result = self.proxy_call(
                "eth_getTransactionReceipt",
                serde_json::json!([tx_hash.to_string()]),
            )?;
            if !result.is_null() {
                return parse_receipt(tx_hash, &result);
            }
            if started.elapsed() >= proxy.receipt_timeout {
                return Err(PortError::Transport(format!(
                    "timed out waiting for receipt of {tx_hash}"
                )));
            }
            tracing::debug!(%tx_hash, "receipt not available yet");
            self.clock.sleep(proxy.receipt_poll_interval);
        }
    }

    fn deterministic_send(
        &self,
        state: &Mutex<DeterministicWallet>,
        tx_payload: &Value,
    ) -> Result<B256, PortError> {
        let mut g = lock(state)?;
        let from = match tx_payload.get("from").and_then(Value::as_str) {
            Some(raw) => parse_address(raw)?,
            None => g
                .accounts
                .first()
                .copied()
                .ok_or_else(|| PortError::Validation("no sender account".to_owned()))?,
        };
        if !g.accounts.contains(&from) {
            return Err(PortError::Rpc {
                code: 4100,
                message: format!("account {from} is not authorized"),
            });
        }
        let to = tx_payload
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| PortError::Validation("transaction without recipient".to_owned()))
            .and_then(parse_address)?;
        let value = match tx_payload.get("value") {
            Some(v) => parse_quantity(v)?,
            None => U256::ZERO,
        };
        let data: Bytes = match tx_payload.get("data").and_then(Value::as_str) {
            Some(raw) => raw
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid calldata: {e}")))?,
            None => Bytes::new(),
        };

        let sender_balance = g.balances.get(&from).copied().unwrap_or_default();
        if sender_balance < value {
            return Err(PortError::Rpc {
                code: INSUFFICIENT_FUNDS_CODE,
                message: "insufficient funds for transfer".to_owned(),
            });
        }

        if data.len() >= 4 && data[..4] == TRANSFER_SELECTOR {
            if data.len() < 68 {
                return Err(PortError::Validation("truncated transfer calldata".to_owned()));
            }
            let recipient = Address::from_slice(&data[16..36]);
            let amount = erc20::decode_uint256(&data[36..68])
                .map_err(|e| PortError::Validation(e.to_string()))?;
            let held = g.token_balances.get(&(to, from)).copied().unwrap_or_default();
            if held < amount {
                return Err(PortError::Rpc {
                    code: 3,
                    message: "execution reverted: ERC20: transfer amount exceeds balance"
                        .to_owned(),
                });
            }
            g.token_balances.insert((to, from), held - amount);
            *g.token_balances.entry((to, recipient)).or_default() += amount;
        }

        g.balances.insert(from, sender_balance - value);
        *g.balances.entry(to).or_default() += value;

        g.nonce += 1;
        g.block_number += 1;
        let mut seed = serde_json::to_vec(tx_payload)
            .map_err(|e| PortError::Validation(format!("tx payload serialization failed: {e}")))?;
        seed.extend_from_slice(&g.nonce.to_be_bytes());
        let hash = keccak256(seed);
        let block_number = g.block_number;
        g.receipts.insert(hash, block_number);

        let timestamp = self.clock.now_ms().ok().map(|ms| ms / 1000);
        let row = HistoryRow {
            hash,
            from,
            to: Some(to),
            value,
            gas_price: U256::from(DETERMINISTIC_GAS_PRICE),
            timestamp,
            block_number: Some(block_number),
        };
        lock(&g.ledger)?.push(row);
        Ok(hash)
    }
}

impl WalletPort for Eip1193Adapter {
    fn detect(&self) -> Result<(), PortError> {
        match &self.mode {
            ProviderMode::Disabled(reason) => Err(PortError::NotFound(reason.clone())),
            ProviderMode::Deterministic(_) => Ok(()),
            ProviderMode::Proxy(proxy) => match self.proxy_call("eth_chainId", serde_json::json!([])) {
                Ok(_) => Ok(()),
                Err(PortError::Transport(e)) => Err(PortError::NotFound(format!(
                    "wallet provider unreachable at {}: {e}",
                    proxy.base_url
                ))),
                Err(other) => Err(other),
            },
        }
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;
        match &self.mode {
            ProviderMode::Proxy(_) => {
                let result = self.proxy_call("eth_requestAccounts", serde_json::json!([]))?;
                let arr = result.as_array().ok_or_else(|| {
                    PortError::Transport("eth_requestAccounts: array expected".to_owned())
                })?;
                arr.iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| {
                                PortError::Transport(
                                    "eth_requestAccounts: string expected".to_owned(),
                                )
                            })
                            .and_then(parse_address)
                    })
                    .collect()
            }
            ProviderMode::Deterministic(state) => {
                let mut g = lock(state)?;
                if g.pending_approvals > 0 {
                    g.pending_approvals -= 1;
                    return Err(PortError::Rpc {
                        code: PENDING_APPROVAL_CODE,
                        message: "Request of type 'eth_requestAccounts' already pending".to_owned(),
                    });
                }
                Ok(g.accounts.clone())
            }
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        self.check_mode()?;
        match &self.mode {
            ProviderMode::Proxy(_) => {
                let result = self.proxy_call("eth_chainId", serde_json::json!([]))?;
                json_chain_id_to_u64(&result)
            }
            ProviderMode::Deterministic(state) => Ok(lock(state)?.chain_id),
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    fn balance(&self, account: Address) -> Result<U256, PortError> {
        self.check_mode()?;
        match &self.mode {
            ProviderMode::Proxy(_) => {
                let result = self.proxy_call(
                    "eth_getBalance",
                    serde_json::json!([account.to_string(), "latest"]),
                )?;
                parse_quantity(&result)
            }
            ProviderMode::Deterministic(state) => {
                Ok(lock(state)?.balances.get(&account).copied().unwrap_or_default())
            }
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError> {
        self.check_mode()?;
        match &self.mode {
            ProviderMode::Proxy(_) => {
                let result = self.proxy_call(
                    "eth_call",
                    serde_json::json!([
                        {"to": to.to_string(), "data": alloy::hex::encode_prefixed(&data)},
                        "latest"
                    ]),
                )?;
                let raw = result
                    .as_str()
                    .ok_or_else(|| PortError::Transport("eth_call must return hex".to_owned()))?;
                raw.parse()
                    .map_err(|e| PortError::Validation(format!("invalid eth_call result: {e}")))
            }
            ProviderMode::Deterministic(state) => {
                if data.len() < 36 || data[..4] != BALANCE_OF_SELECTOR {
                    return Err(PortError::NotImplemented(
                        "deterministic wallet only answers balanceOf calls",
                    ));
                }
                let owner = Address::from_slice(&data[16..36]);
                let balance = lock(state)?
                    .token_balances
                    .get(&(to, owner))
                    .copied()
                    .unwrap_or_default();
                Ok(Bytes::from(balance.to_be_bytes::<32>().to_vec()))
            }
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    fn send_transaction(&self, tx_payload: &Value) -> Result<B256, PortError> {
        self.check_mode()?;
        match &self.mode {
            ProviderMode::Proxy(_) => {
                let result =
                    self.proxy_call("eth_sendTransaction", serde_json::json!([tx_payload]))?;
                let hash = result.as_str().ok_or_else(|| {
                    PortError::Transport("eth_sendTransaction must return hash".to_owned())
                })?;
                hash.parse()
                    .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
            }
            ProviderMode::Deterministic(state) => self.deterministic_send(state, tx_payload),
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransferReceipt, PortError> {
        self.check_mode()?;
        match &self.mode {
            ProviderMode::Proxy(proxy) => self.proxy_wait_for_receipt(proxy, tx_hash),
            ProviderMode::Deterministic(state) => {
                let block_number = lock(state)?
                    .receipts
                    .get(&tx_hash)
                    .copied()
                    .ok_or_else(|| PortError::Validation(format!("unknown transaction {tx_hash}")))?;
                Ok(TransferReceipt {
                    tx_hash,
                    block_number,
                    success: true,
                })
            }
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, PortError> {
    mutex
        .lock()
        .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
}

fn deterministic_account() -> Address {
    address!("1000000000000000000000000000000000000001")
}

fn rpc_error(err: &Value) -> PortError {
    match err.get("code").and_then(Value::as_i64) {
        Some(code) => PortError::Rpc {
            code,
            message: err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        },
        None => PortError::Transport(format!("eip1193 proxy returned error: {err}")),
    }
}

fn parse_address(raw: &str) -> Result<Address, PortError> {
    raw.parse()
        .map_err(|e| PortError::Validation(format!("invalid account address {raw}: {e}")))
}

fn parse_receipt(tx_hash: B256, receipt: &Value) -> Result<TransferReceipt, PortError> {
    let block_number = receipt
        .get("blockNumber")
        .ok_or_else(|| PortError::Transport("receipt missing blockNumber".to_owned()))
        .and_then(parse_quantity)?;
    let block_number = u64::try_from(block_number)
        .map_err(|e| PortError::Validation(format!("block number out of range: {e}")))?;
    // Pre-Byzantium receipts carry no status.
    let success = match receipt.get("status") {
        Some(status) if !status.is_null() => parse_quantity(status)? == U256::from(1u64),
        _ => true,
    };
    Ok(TransferReceipt {
        tx_hash,
        block_number,
        success,
    })
}

fn parse_quantity(value: &Value) -> Result<U256, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(U256::from(n));
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| PortError::Validation(format!("quantity must be 0x-prefixed: {raw}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| PortError::Validation(format!("invalid quantity {raw}: {e}")))
}

fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        u64::from_str_radix(raw.trim_start_matches("0x").trim_start_matches("0X"), 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}
