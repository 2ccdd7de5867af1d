//! Bridge between the egui shell and the transfer workspace crates.
//! The shell never touches ports directly; everything goes through here.

use std::sync::{Arc, Mutex};

use alloy::primitives::B256;

use rusty_transfer_adapters::{
    Eip1193Adapter, ExplorerAdapter, SystemClockAdapter, TransferAdapterConfig,
};
use rusty_transfer_core::{
    fetch_with_retry, AccountInfo, Asset, ChainClient, ChainError, HistoryRefresh, TransferEvent,
    TransferRequest, TransferStage,
};

type TransferClient = ChainClient<Eip1193Adapter, ExplorerAdapter>;

/// One transfer item with the stage it belongs to, in receipt order.
pub type TransferItem = (Result<TransferEvent, ChainError>, Option<TransferStage>);

pub type TransferInbox = Arc<Mutex<Vec<TransferItem>>>;

#[derive(Clone)]
pub struct TransferBridge {
    client: Arc<TransferClient>,
    config: Arc<TransferAdapterConfig>,
}

impl TransferBridge {
    pub fn new(config: TransferAdapterConfig) -> Self {
        let assets = config.assets();
        let wallet = Eip1193Adapter::with_config(config.clone());
        // The deterministic wallet has its own ledger; a public explorer knows nothing of it.
        let history = match wallet.ledger() {
            Some(ledger) => ExplorerAdapter::in_memory(ledger),
            None => ExplorerAdapter::with_config(&config),
        };
        if wallet.is_deterministic() {
            tracing::warn!("no wallet URL configured; using the deterministic development wallet");
        }
        Self {
            client: Arc::new(
                ChainClient::new(wallet, history, assets).with_chain_id(config.chain_id),
            ),
            config: Arc::new(config),
        }
    }

    pub fn assets(&self) -> &[Asset] {
        self.client.assets()
    }

    pub fn is_deterministic(&self) -> bool {
        self.client.wallet.is_deterministic()
    }

    /// Address and balance of the selected asset. Initializes the client on first use.
    pub fn account_info(&self, asset: &Asset) -> Result<AccountInfo, ChainError> {
        self.client.initialize()?;
        self.client.account_info(asset)
    }

    /// Drive one transfer attempt to the end, posting every item to `inbox`.
    pub fn run_transfer(
        &self,
        request: TransferRequest,
        inbox: &TransferInbox,
        notify: impl Fn(),
    ) {
        let mut progress = self.client.transfer(request);
        loop {
            let stage = progress.stage();
            let Some(item) = progress.next() else {
                break;
            };
            match inbox.lock() {
                Ok(mut pending) => pending.push((item, stage)),
                Err(e) => {
                    tracing::error!(error = %e, "transfer inbox poisoned");
                    break;
                }
            }
            notify();
        }
    }

    pub fn refresh_history(&self, expected: Option<B256>) -> HistoryRefresh {
        fetch_with_retry(
            &self.client,
            expected,
            &self.config.history_retry,
            &SystemClockAdapter,
        )
    }

    pub fn explorer_tx_url(&self, tx_hash: B256) -> String {
        self.config.explorer_tx_url(&tx_hash.to_string())
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }
}
