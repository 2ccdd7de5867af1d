use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;

use rusty_transfer_core::{HistoryPort, HistoryRow, PortError};

use crate::TransferAdapterConfig;

/// Transactions recorded by the deterministic wallet, shared with the
/// in-memory explorer.
pub type SharedLedger = Arc<Mutex<Vec<HistoryRow>>>;

const NO_TRANSACTIONS: &str = "No transactions found";

#[derive(Debug, Clone)]
pub struct ExplorerAdapter {
    mode: ExplorerMode,
}

#[derive(Debug, Clone)]
enum ExplorerMode {
    Disabled(String),
    InMemory(SharedLedger),
    Http(HttpRuntime),
}

#[derive(Debug, Clone)]
struct HttpRuntime {
    base_url: String,
    api_key: Option<String>,
    chain_id: u64,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxListEntry {
    hash: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(default)]
    gas_price: String,
    #[serde(default)]
    time_stamp: String,
    #[serde(default)]
    block_number: String,
}

impl ExplorerAdapter {
    pub fn with_config(config: &TransferAdapterConfig) -> Self {
        let Some(base_url) = config.explorer_api_url.clone() else {
            return Self {
                mode: ExplorerMode::Disabled(
                    "no block explorer API configured; set RUSTY_TRANSFER_EXPLORER_API_URL"
                        .to_owned(),
                ),
            };
        };
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let mode = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => ExplorerMode::Http(HttpRuntime {
                base_url,
                api_key: config.explorer_api_key.clone(),
                chain_id: config.chain_id,
                client,
            }),
            Err(e) => ExplorerMode::Disabled(format!("failed to initialize explorer client: {e}")),
        };
        Self { mode }
    }

    pub fn in_memory(ledger: SharedLedger) -> Self {
        Self {
            mode: ExplorerMode::InMemory(ledger),
        }
    }

    fn http_transactions(
        &self,
        http: &HttpRuntime,
        account: Address,
    ) -> Result<Vec<HistoryRow>, PortError> {
        let address = account.to_string();
        let chain_id = http.chain_id.to_string();
        let mut query = vec![
            ("chainid", chain_id.as_str()),
            ("module", "account"),
            ("action", "txlist"),
            ("address", address.as_str()),
            ("sort", "desc"),
        ];
        if let Some(key) = &http.api_key {
            query.push(("apikey", key.as_str()));
        }

        let response = http
            .client
            .get(&http.base_url)
            .query(&query)
            .send()
            .map_err(|e| PortError::Transport(format!("explorer request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Transport(format!("explorer status {status}")));
        }
        let body: TxListResponse = response
            .json()
            .map_err(|e| PortError::Transport(format!("explorer json decode failed: {e}")))?;
        parse_tx_list(body)
    }
}

impl HistoryPort for ExplorerAdapter {
    fn transactions(&self, account: Address) -> Result<Vec<HistoryRow>, PortError> {
        match &self.mode {
            ExplorerMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ExplorerMode::InMemory(ledger) => {
                let rows = ledger
                    .lock()
                    .map_err(|e| PortError::Transport(format!("ledger lock poisoned: {e}")))?;
                Ok(rows
                    .iter()
                    .rev()
                    .filter(|row| row.from == account || row.to == Some(account))
                    .cloned()
                    .collect())
            }
            ExplorerMode::Http(http) => self.http_transactions(http, account),
        }
    }
}

fn parse_tx_list(body: TxListResponse) -> Result<Vec<HistoryRow>, PortError> {
    if body.status != "1" {
        if body.message.starts_with(NO_TRANSACTIONS) {
            return Ok(Vec::new());
        }
        let detail = body.result.as_str().unwrap_or_default();
        return Err(PortError::Transport(format!(
            "explorer error: {} {detail}",
            body.message
        )));
    }
    let entries: Vec<TxListEntry> = serde_json::from_value(body.result)
        .map_err(|e| PortError::Validation(format!("unexpected txlist result: {e}")))?;
    entries.into_iter().map(parse_entry).collect()
}

fn parse_entry(entry: TxListEntry) -> Result<HistoryRow, PortError> {
    let hash: B256 = entry
        .hash
        .parse()
        .map_err(|e| PortError::Validation(format!("invalid tx hash {}: {e}", entry.hash)))?;
    let from = parse_address(&entry.from)?;
    // Contract creations have an empty `to`.
    let to = if entry.to.is_empty() {
        None
    } else {
        Some(parse_address(&entry.to)?)
    };
    Ok(HistoryRow {
        hash,
        from,
        to,
        value: parse_decimal(&entry.value)?,
        gas_price: parse_decimal(&entry.gas_price)?,
        timestamp: entry.time_stamp.parse().ok(),
        block_number: entry.block_number.parse().ok(),
    })
}

fn parse_address(raw: &str) -> Result<Address, PortError> {
    raw.parse()
        .map_err(|e| PortError::Validation(format!("invalid address {raw}: {e}")))
}

fn parse_decimal(raw: &str) -> Result<U256, PortError> {
    if raw.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(raw, 10)
        .map_err(|e| PortError::Validation(format!("invalid decimal {raw}: {e}")))
}
