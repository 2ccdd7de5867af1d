use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{HistoryRow, TransferReceipt};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// JSON-RPC error object returned by the wallet provider.
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// EIP-1193 wallet provider.
pub trait WalletPort {
    /// Fails with `PortError::NotFound` when no provider is reachable.
    fn detect(&self) -> Result<(), PortError>;
    fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    fn chain_id(&self) -> Result<u64, PortError>;
    fn balance(&self, account: Address) -> Result<U256, PortError>;
    fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError>;
    fn send_transaction(&self, tx_payload: &Value) -> Result<B256, PortError>;
    /// Blocks until the transaction is mined.
    fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransferReceipt, PortError>;
}

/// Read-only block data service used for the history table.
pub trait HistoryPort {
    fn transactions(&self, account: Address) -> Result<Vec<HistoryRow>, PortError>;
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, PortError>;
    fn sleep(&self, duration: Duration);
}
