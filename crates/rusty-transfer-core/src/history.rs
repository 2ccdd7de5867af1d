//! Transaction history: retrying fetch and the table state fed by it.
//!
//! The block data service indexes new transactions with a delay, so a fetch
//! right after a transfer may not contain it yet. The fetch is retried with
//! growing delays until the expected hash shows up or the attempts run out.

use std::time::Duration;

use alloy::primitives::B256;

use crate::client::ChainClient;
use crate::domain::{HistoryDisplayRow, HistoryRow};
use crate::ports::{ClockPort, HistoryPort, WalletPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_millis(500),
            multiplier: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRefresh {
    Fetched {
        rows: Vec<HistoryRow>,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
        last_error: Option<String>,
    },
}

/// Fetch the account history, retrying while it is empty or lacks `expected`.
///
/// Never fails: when all attempts are used up the outcome is
/// [`HistoryRefresh::Exhausted`] and a warning is logged.
pub fn fetch_with_retry<W, H, C>(
    client: &ChainClient<W, H>,
    expected: Option<B256>,
    policy: &RetryPolicy,
    clock: &C,
) -> HistoryRefresh
where
    W: WalletPort,
    H: HistoryPort,
    C: ClockPort,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match client.history() {
            Ok(rows) if accepts(&rows, expected) => {
                tracing::debug!(attempt, rows = rows.len(), "history fetched");
                return HistoryRefresh::Fetched {
                    rows,
                    attempts: attempt,
                };
            }
            Ok(rows) => {
                tracing::debug!(attempt, rows = rows.len(), ?expected, "history not indexed yet");
                last_error = None;
            }
            Err(err) => {
                tracing::debug!(attempt, error = %err, "history fetch failed");
                last_error = Some(err.to_string());
            }
        }

        if attempt < max_attempts {
            clock.sleep(policy.delay_for(attempt));
        }
    }

    tracing::warn!(
        attempts = max_attempts,
        ?expected,
        error = last_error.as_deref().unwrap_or("none"),
        "history retries exhausted; keeping previous rows"
    );
    HistoryRefresh::Exhausted {
        attempts: max_attempts,
        last_error,
    }
}

fn accepts(rows: &[HistoryRow], expected: Option<B256>) -> bool {
    if rows.is_empty() {
        return false;
    }
    match expected {
        Some(hash) => rows.iter().any(|row| row.hash == hash),
        None => true,
    }
}

/// State behind the history table.
#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    rows: Vec<HistoryDisplayRow>,
    tracked: Option<Option<B256>>,
    loading: bool,
}

impl HistoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[HistoryDisplayRow] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True on first use and whenever the latest transaction hash changes.
    pub fn should_refresh(&self, latest: Option<B256>) -> bool {
        !self.loading && self.tracked != Some(latest)
    }

    pub fn begin_refresh(&mut self, latest: Option<B256>) {
        self.tracked = Some(latest);
        self.loading = true;
    }

    pub fn apply(&mut self, refresh: HistoryRefresh) {
        self.loading = false;
        if let HistoryRefresh::Fetched { rows, .. } = refresh {
            self.rows = rows.iter().map(HistoryDisplayRow::from_row).collect();
        }
    }
}
