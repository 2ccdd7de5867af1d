pub mod client;
pub mod domain;
pub mod erc20;
pub mod error;
pub mod history;
pub mod ports;
pub mod progress;
pub mod transfer_view;
pub mod units;

pub use client::{ChainClient, TransferProgress};
pub use domain::{
    AccountInfo, Amount, Asset, HistoryDisplayRow, HistoryRow, TokenInfo, TransferReceipt,
    TransferRequest,
};
pub use error::{ChainError, PENDING_APPROVAL_CODE};
pub use history::{fetch_with_retry, HistoryRefresh, HistoryView, RetryPolicy};
pub use ports::{ClockPort, HistoryPort, PortError, WalletPort};
pub use progress::{TransferEntry, TransferEvent, TransferLog, TransferStage, TransferSteps};
pub use transfer_view::{TransferForm, TransferView, ViewState};
pub use units::{format_amount, format_gwei, format_timestamp, parse_amount, ETHER_DECIMALS};
