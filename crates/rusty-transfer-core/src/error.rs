use thiserror::Error;

use crate::ports::PortError;
use crate::progress::TransferStage;

/// JSON-RPC code a wallet returns while its permission prompt is still open.
pub const PENDING_APPROVAL_CODE: i64 = -32002;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("no wallet provider available: {0}")]
    MissingProvider(String),
    #[error("chain client used before initialize()")]
    NeedsInitialize,
    #[error("wallet is waiting for user approval ({code}): {message}")]
    PendingApproval { code: i64, message: String },
    #[error("Insufficient balance, transferring amount: {amount}. You have {balance}")]
    InsufficientBalance { amount: String, balance: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("wallet is on chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("wallet returned no accounts")]
    NoAccount,
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("provider error {code}: {message}")]
    Provider { code: i64, message: String },
    #[error("transfer event out of order: expected {expected}, got {got}")]
    OutOfOrder {
        expected: &'static str,
        got: &'static str,
    },
    #[error("transfer attempt already finished at {0:?}")]
    AttemptFinished(Option<TransferStage>),
    #[error(transparent)]
    Port(PortError),
}

impl ChainError {
    pub fn is_pending_approval(&self) -> bool {
        matches!(self, ChainError::PendingApproval { .. })
    }

    /// Stable short code for the error category.
    pub fn code(&self) -> &'static str {
        match self {
            ChainError::MissingProvider(_) => "missWeb3Provider",
            ChainError::NeedsInitialize => "needInitialize",
            ChainError::PendingApproval { .. } => "pendingApproval",
            ChainError::InsufficientBalance { .. } => "insufficientBalance",
            ChainError::InvalidInput(_) => "invalidInput",
            ChainError::WrongNetwork { .. } => "wrongNetwork",
            ChainError::NoAccount => "noAccount",
            ChainError::Reverted(_) => "reverted",
            ChainError::Provider { .. } => "provider",
            ChainError::OutOfOrder { .. } => "outOfOrder",
            ChainError::AttemptFinished(_) => "attemptFinished",
            ChainError::Port(_) => "port",
        }
    }
}

impl From<PortError> for ChainError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Rpc { code, message } if code == PENDING_APPROVAL_CODE => {
                ChainError::PendingApproval { code, message }
            }
            PortError::Rpc { code, message } => ChainError::Provider { code, message },
            PortError::NotFound(reason) => ChainError::MissingProvider(reason),
            other => ChainError::Port(other),
        }
    }
}
