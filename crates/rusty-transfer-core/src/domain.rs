use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::units::{format_amount, format_gwei, format_timestamp, ETHER_DECIMALS};

/// Raw on-chain quantity paired with its display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub formatted: String,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self {
            raw,
            formatted: format_amount(raw, decimals),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    Ether,
    Token(TokenInfo),
}

impl Asset {
    pub fn symbol(&self) -> &str {
        match self {
            Asset::Ether => "ETH",
            Asset::Token(token) => &token.symbol,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Asset::Ether => ETHER_DECIMALS,
            Asset::Token(token) => token.decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub balance: Amount,
    pub asset: Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub receiver: String,
    pub amount: String,
    pub asset: Asset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

/// One entry of the account's transaction list as reported by the block data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub gas_price: U256,
    pub timestamp: Option<u64>,
    pub block_number: Option<u64>,
}

/// Render-time projection of a [`HistoryRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDisplayRow {
    pub hash: B256,
    pub date: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas: String,
}

impl HistoryDisplayRow {
    pub fn from_row(row: &HistoryRow) -> Self {
        Self {
            hash: row.hash,
            date: row.timestamp.map(format_timestamp).unwrap_or_default(),
            from: row.from.to_string(),
            to: row.to.map(|a| a.to_string()).unwrap_or_default(),
            value: format_amount(row.value, ETHER_DECIMALS),
            gas: format_gwei(row.gas_price),
        }
    }
}
