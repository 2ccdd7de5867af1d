//! Chain client: the single object views use to talk to the wallet and the
//! block data service.

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, B256};
use serde_json::{json, Value};

use crate::domain::{AccountInfo, Amount, Asset, HistoryRow, TransferRequest};
use crate::erc20;
use crate::error::ChainError;
use crate::ports::{HistoryPort, PortError, WalletPort};
use crate::progress::{TransferEvent, TransferStage, TransferSteps};
use crate::units::parse_amount;

pub struct ChainClient<W, H> {
    pub wallet: W,
    pub history: H,
    assets: Vec<Asset>,
    expected_chain_id: Option<u64>,
    initialized: AtomicBool,
    signer: Mutex<Option<Address>>,
}

impl<W, H> ChainClient<W, H>
where
    W: WalletPort,
    H: HistoryPort,
{
    pub fn new(wallet: W, history: H, assets: Vec<Asset>) -> Self {
        let assets = if assets.is_empty() {
            vec![Asset::Ether]
        } else {
            assets
        };
        Self {
            wallet,
            history,
            assets,
            expected_chain_id: None,
            initialized: AtomicBool::new(false),
            signer: Mutex::new(None),
        }
    }

    /// Refuse to initialize against a wallet on any other network.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.expected_chain_id = Some(chain_id);
        self
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn initialize(&self) -> Result<(), ChainError> {
        if self.is_initialized() {
            return Ok(());
        }
        self.wallet.detect().map_err(|e| match e {
            PortError::NotFound(reason) => ChainError::MissingProvider(reason),
            other => ChainError::from(other),
        })?;
        if let Some(expected) = self.expected_chain_id {
            let actual = self.wallet.chain_id()?;
            if actual != expected {
                tracing::warn!(expected, actual, "wallet is connected to another network");
                return Err(ChainError::WrongNetwork { expected, actual });
            }
        }
        self.initialized.store(true, Ordering::Release);
        tracing::info!("chain client initialized");
        Ok(())
    }

    /// Resolve the signer account, prompting the wallet at most once.
    ///
    /// The lock is held across the wallet request so a concurrent caller waits
    /// for the in-flight prompt and then reuses its result.
    pub fn signer(&self) -> Result<Address, ChainError> {
        self.ensure_initialized()?;
        let mut cached = self
            .signer
            .lock()
            .map_err(|e| PortError::Transport(format!("signer lock poisoned: {e}")))?;
        if let Some(address) = *cached {
            return Ok(address);
        }
        let accounts = self.wallet.request_accounts()?;
        let address = accounts.into_iter().next().ok_or(ChainError::NoAccount)?;
        tracing::info!(%address, "wallet connected");
        *cached = Some(address);
        Ok(address)
    }

    /// Forget the cached signer; the next call prompts the wallet again.
    pub fn reset(&self) {
        match self.signer.lock() {
            Ok(mut cached) => *cached = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn wallet_address(&self) -> Result<Address, ChainError> {
        self.signer()
    }

    pub fn wallet_balance(&self, asset: &Asset) -> Result<Amount, ChainError> {
        let owner = self.signer()?;
        self.balance_of(owner, asset)
    }

    pub fn account_info(&self, asset: &Asset) -> Result<AccountInfo, ChainError> {
        let address = self.wallet_address()?;
        let balance = self.balance_of(address, asset)?;
        Ok(AccountInfo {
            address,
            balance,
            asset: asset.clone(),
        })
    }

    /// Start a transfer attempt. Nothing is sent until the returned sequence is polled.
    pub fn transfer(&self, request: TransferRequest) -> TransferProgress<'_, W, H> {
        TransferProgress {
            client: self,
            request,
            phase: Phase::Steps,
            prepared: None,
            tx_hash: None,
        }
    }

    pub fn history(&self) -> Result<Vec<HistoryRow>, ChainError> {
        let account = self.signer()?;
        Ok(self.history.transactions(account)?)
    }

    fn ensure_initialized(&self) -> Result<(), ChainError> {
        if !self.is_initialized() {
            return Err(ChainError::NeedsInitialize);
        }
        Ok(())
    }

    fn balance_of(&self, owner: Address, asset: &Asset) -> Result<Amount, ChainError> {
        let raw = match asset {
            Asset::Ether => self.wallet.balance(owner)?,
            Asset::Token(token) => {
                let output = self
                    .wallet
                    .call(token.address, erc20::balance_of_calldata(owner)?)?;
                erc20::decode_uint256(&output)?
            }
        };
        Ok(Amount::new(raw, asset.decimals()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Steps,
    Prepare,
    Submit,
    Confirm,
    Finished,
}

#[derive(Debug, Clone)]
struct Prepared {
    from: Address,
    to: Address,
    amount: Amount,
}

/// Lazy, single-pass sequence of progress events for one transfer attempt.
///
/// Yields the step list, then one event per stage. The first error ends the
/// sequence.
pub struct TransferProgress<'a, W, H> {
    client: &'a ChainClient<W, H>,
    request: TransferRequest,
    phase: Phase,
    prepared: Option<Prepared>,
    tx_hash: Option<B256>,
}

impl<W, H> TransferProgress<'_, W, H>
where
    W: WalletPort,
    H: HistoryPort,
{
    /// Stage the next item belongs to. `None` before the step list and after the end.
    pub fn stage(&self) -> Option<TransferStage> {
        match self.phase {
            Phase::Steps | Phase::Finished => None,
            Phase::Prepare => Some(TransferStage::PrepareTransaction),
            Phase::Submit => Some(TransferStage::WorkInProgress),
            Phase::Confirm => Some(TransferStage::Done),
        }
    }

    fn advance(&mut self) -> Result<TransferEvent, ChainError> {
        match self.phase {
            Phase::Steps => {
                self.phase = Phase::Prepare;
                Ok(TransferEvent::Steps(TransferSteps::standard()))
            }
            Phase::Prepare => {
                let event = self.prepare()?;
                self.phase = Phase::Submit;
                Ok(event)
            }
            Phase::Submit => {
                let event = self.submit()?;
                self.phase = Phase::Confirm;
                Ok(event)
            }
            Phase::Confirm => {
                let event = self.confirm()?;
                self.phase = Phase::Finished;
                Ok(event)
            }
            Phase::Finished => Err(ChainError::AttemptFinished(Some(TransferStage::Done))),
        }
    }

    fn prepare(&mut self) -> Result<TransferEvent, ChainError> {
        let client = self.client;
        let asset = &self.request.asset;
        let from = client.signer()?;
        let to: Address = self.request.receiver.trim().parse().map_err(|e| {
            ChainError::InvalidInput(format!(
                "invalid receiver address {}: {e}",
                self.request.receiver
            ))
        })?;
        let amount = Amount::new(
            parse_amount(&self.request.amount, asset.decimals())?,
            asset.decimals(),
        );
        let balance = client.balance_of(from, asset)?;

        if balance.raw < amount.raw {
            return Err(ChainError::InsufficientBalance {
                amount: amount.formatted,
                balance: balance.formatted,
            });
        }

        self.prepared = Some(Prepared {
            from,
            to,
            amount: amount.clone(),
        });
        Ok(TransferEvent::Prepare { balance, amount })
    }

    fn submit(&mut self) -> Result<TransferEvent, ChainError> {
        let prepared = self
            .prepared
            .as_ref()
            .ok_or(ChainError::AttemptFinished(None))?;
        let payload = transaction_payload(prepared, &self.request.asset)?;
        let tx_hash = self.client.wallet.send_transaction(&payload)?;
        tracing::info!(%tx_hash, "transfer submitted");
        self.tx_hash = Some(tx_hash);
        Ok(TransferEvent::InProgress {
            tx_hash,
            amount: prepared.amount.clone(),
        })
    }

    fn confirm(&mut self) -> Result<TransferEvent, ChainError> {
        let tx_hash = self.tx_hash.ok_or(ChainError::AttemptFinished(None))?;
        let receipt = self.client.wallet.wait_for_receipt(tx_hash)?;
        if !receipt.success {
            return Err(ChainError::Reverted(tx_hash.to_string()));
        }
        tracing::info!(%tx_hash, block_number = receipt.block_number, "transfer confirmed");
        Ok(TransferEvent::Done {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}

impl<W, H> Iterator for TransferProgress<'_, W, H>
where
    W: WalletPort,
    H: HistoryPort,
{
    type Item = Result<TransferEvent, ChainError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase == Phase::Finished {
            return None;
        }
        match self.advance() {
            Ok(event) => {
                tracing::debug!(stage = ?event.stage(), "transfer event");
                Some(Ok(event))
            }
            Err(err) => {
                tracing::warn!(stage = ?self.stage(), error = %err, "transfer failed");
                self.phase = Phase::Finished;
                Some(Err(err))
            }
        }
    }
}

impl<W, H> FusedIterator for TransferProgress<'_, W, H>
where
    W: WalletPort,
    H: HistoryPort,
{
}

fn transaction_payload(prepared: &Prepared, asset: &Asset) -> Result<Value, ChainError> {
    let payload = match asset {
        Asset::Ether => json!({
            "from": prepared.from.to_string(),
            "to": prepared.to.to_string(),
            "value": format!("0x{:x}", prepared.amount.raw),
        }),
        Asset::Token(token) => {
            let data = erc20::transfer_calldata(prepared.to, prepared.amount.raw)?;
            json!({
                "from": prepared.from.to_string(),
                "to": token.address.to_string(),
                "value": "0x0",
                "data": alloy::hex::encode_prefixed(&data),
            })
        }
    };
    Ok(payload)
}
