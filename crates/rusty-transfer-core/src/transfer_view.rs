//! Transfer board controller, independent of any UI toolkit.

use alloy::primitives::B256;

use crate::domain::{AccountInfo, Asset, TransferRequest};
use crate::error::ChainError;
use crate::progress::{TransferEvent, TransferLog, TransferStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    NoAccount,
    FetchingAccount,
    Ready,
    Transferring,
    AwaitingWalletUnlock,
    FatalProviderError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub receiver: String,
    pub amount: String,
    pub asset_index: usize,
}

impl TransferForm {
    pub fn request(&self, assets: &[Asset]) -> Option<TransferRequest> {
        let asset = assets.get(self.asset_index)?.clone();
        Some(TransferRequest {
            receiver: self.receiver.trim().to_owned(),
            amount: self.amount.trim().to_owned(),
            asset,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TransferView {
    state: ViewState,
    account: Option<AccountInfo>,
    log: TransferLog,
    latest_tx_hash: Option<B256>,
    last_error: Option<String>,
    /// Asset index the in-flight account fetch was started for.
    fetching_asset: Option<usize>,
    pub form: TransferForm,
}

impl Default for TransferView {
    fn default() -> Self {
        Self {
            state: ViewState::NoAccount,
            account: None,
            log: TransferLog::new(),
            latest_tx_hash: None,
            last_error: None,
            fetching_asset: None,
            form: TransferForm::default(),
        }
    }
}

impl TransferView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn account(&self) -> Option<&AccountInfo> {
        self.account.as_ref()
    }

    pub fn log(&self) -> &TransferLog {
        &self.log
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn latest_tx_hash(&self) -> Option<B256> {
        self.latest_tx_hash
    }

    pub fn is_awaiting_unlock(&self) -> bool {
        self.state == ViewState::AwaitingWalletUnlock
    }

    pub fn needs_account_fetch(&self) -> bool {
        self.state == ViewState::NoAccount && self.account.is_none()
    }

    /// Allowed from `NoAccount` and `Ready`; a fetch from `Ready` refreshes the
    /// balance shown. Returns `false` in any other state.
    pub fn begin_account_fetch(&mut self) -> bool {
        if !matches!(self.state, ViewState::NoAccount | ViewState::Ready) {
            return false;
        }
        self.fetching_asset = Some(self.form.asset_index);
        self.state = ViewState::FetchingAccount;
        true
    }

    pub fn apply_account(&mut self, result: Result<AccountInfo, ChainError>) {
        if self.state != ViewState::FetchingAccount {
            tracing::warn!(state = ?self.state, "account result received outside a fetch");
            return;
        }
        let fetched_for = self.fetching_asset.take();
        match result {
            Ok(_) if fetched_for != Some(self.form.asset_index) => {
                tracing::debug!(
                    fetched = ?fetched_for,
                    selected = self.form.asset_index,
                    "dropping account for a deselected asset"
                );
                self.account = None;
                self.state = ViewState::NoAccount;
            }
            Ok(info) => {
                tracing::debug!(address = %info.address, balance = %info.balance.formatted, "account loaded");
                self.account = Some(info);
                self.last_error = None;
                self.state = ViewState::Ready;
            }
            Err(err) => self.apply_error(err, ViewState::NoAccount),
        }
    }

    /// The user dismissed the unlock dialog with "Reload".
    pub fn acknowledge_unlock(&mut self) {
        if self.state == ViewState::AwaitingWalletUnlock {
            self.state = if self.account.is_some() {
                ViewState::Ready
            } else {
                ViewState::NoAccount
            };
        }
    }

    /// Reset the cached account so the next frame refetches address and balance.
    pub fn invalidate_account(&mut self) {
        self.account = None;
        if matches!(self.state, ViewState::Ready) {
            self.state = ViewState::NoAccount;
        }
    }

    /// Select a different asset; the balance shown belongs to the selected asset.
    pub fn select_asset(&mut self, index: usize) {
        if self.form.asset_index != index {
            self.form.asset_index = index;
            self.invalidate_account();
        }
    }

    /// Clears the previous attempt. Returns `false` unless the board is ready.
    pub fn begin_transfer(&mut self) -> bool {
        if self.state != ViewState::Ready {
            return false;
        }
        self.log = TransferLog::new();
        self.last_error = None;
        self.state = ViewState::Transferring;
        true
    }

    /// Record one item of the transfer sequence, in the order received.
    ///
    /// `failed_stage` is the stage the sequence was in when an error occurred.
    pub fn apply_transfer_item(
        &mut self,
        item: Result<TransferEvent, ChainError>,
        failed_stage: Option<TransferStage>,
    ) {
        if self.state != ViewState::Transferring {
            tracing::warn!(state = ?self.state, "transfer item received outside a transfer");
            return;
        }
        match item {
            Ok(event) => {
                if let TransferEvent::InProgress { tx_hash, .. } = &event {
                    self.latest_tx_hash = Some(*tx_hash);
                }
                let done = event.is_done();
                if let Err(err) = self.log.push_event(event) {
                    tracing::warn!(error = %err, "dropping transfer event");
                    self.apply_error(err, ViewState::Ready);
                    return;
                }
                if done {
                    self.account = None;
                    self.state = ViewState::NoAccount;
                }
            }
            Err(err) => {
                let stage = failed_stage.unwrap_or(TransferStage::PrepareTransaction);
                if let Err(log_err) = self.log.push_failure(stage, err.to_string()) {
                    tracing::warn!(error = %log_err, "dropping transfer failure");
                }
                self.apply_error(err, ViewState::Ready);
            }
        }
    }

    pub fn is_transfer_done(&self) -> bool {
        self.log.is_done()
    }

    pub fn is_transfer_failed(&self) -> bool {
        self.log.is_failed()
    }

    pub fn is_busy(&self) -> bool {
        self.state == ViewState::Transferring
    }

    fn apply_error(&mut self, err: ChainError, fallback: ViewState) {
        match err {
            err if err.is_pending_approval() => {
                tracing::info!("wallet is waiting for the user to unlock");
                self.state = ViewState::AwaitingWalletUnlock;
            }
            ChainError::MissingProvider(reason) => {
                tracing::warn!(%reason, "wallet provider missing");
                self.state = ViewState::FatalProviderError(reason);
            }
            ChainError::NeedsInitialize => {
                tracing::error!("chain client used before initialize");
                self.state = fallback;
            }
            other => {
                self.last_error = Some(other.to_string());
                self.state = fallback;
            }
        }
    }
}
