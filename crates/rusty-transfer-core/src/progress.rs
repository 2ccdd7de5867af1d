//! Transfer progress events and the per-attempt log built from them.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::domain::Amount;
use crate::error::ChainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferStage {
    PrepareTransaction,
    WorkInProgress,
    Done,
}

impl TransferStage {
    pub const ALL: [TransferStage; 3] = [
        TransferStage::PrepareTransaction,
        TransferStage::WorkInProgress,
        TransferStage::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransferStage::PrepareTransaction => "prepare-transaction",
            TransferStage::WorkInProgress => "work-in-progress",
            TransferStage::Done => "done",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransferStage::PrepareTransaction => "Prepare a transaction",
            TransferStage::WorkInProgress => "Work in progress",
            TransferStage::Done => "Transaction done",
        }
    }

    pub fn index(self) -> usize {
        match self {
            TransferStage::PrepareTransaction => 0,
            TransferStage::WorkInProgress => 1,
            TransferStage::Done => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSteps {
    pub steps: Vec<TransferStage>,
    pub init_step: usize,
}

impl TransferSteps {
    pub fn standard() -> Self {
        Self {
            steps: TransferStage::ALL.to_vec(),
            init_step: 0,
        }
    }
}

/// One payload of a transfer attempt, emitted in stage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum TransferEvent {
    Steps(TransferSteps),
    #[serde(rename = "prepare-transaction")]
    Prepare { balance: Amount, amount: Amount },
    #[serde(rename = "work-in-progress")]
    InProgress { tx_hash: B256, amount: Amount },
    Done { tx_hash: B256, block_number: u64 },
}

impl TransferEvent {
    pub fn is_steps(&self) -> bool {
        matches!(self, TransferEvent::Steps(_))
    }

    pub fn is_prepare(&self) -> bool {
        matches!(self, TransferEvent::Prepare { .. })
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, TransferEvent::InProgress { .. })
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TransferEvent::Done { .. })
    }

    /// `None` for the step list, which precedes every stage.
    pub fn stage(&self) -> Option<TransferStage> {
        match self {
            TransferEvent::Steps(_) => None,
            TransferEvent::Prepare { .. } => Some(TransferStage::PrepareTransaction),
            TransferEvent::InProgress { .. } => Some(TransferStage::WorkInProgress),
            TransferEvent::Done { .. } => Some(TransferStage::Done),
        }
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            TransferEvent::InProgress { tx_hash, .. } | TransferEvent::Done { tx_hash, .. } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEntry {
    Event(TransferEvent),
    Failed {
        stage: TransferStage,
        message: String,
    },
}

/// Append-only record of one transfer attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferLog {
    entries: Vec<TransferEntry>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_event(&mut self, event: TransferEvent) -> Result<(), ChainError> {
        self.ensure_open()?;
        let expected = self.expected_next();
        let got = event.stage();
        let in_order = match (&event, expected) {
            (TransferEvent::Steps(_), None) => self.entries.is_empty(),
            (_, Some(stage)) => got == Some(stage),
            _ => false,
        };
        if !in_order {
            return Err(ChainError::OutOfOrder {
                expected: expected.map(TransferStage::as_str).unwrap_or("steps"),
                got: got.map(TransferStage::as_str).unwrap_or("steps"),
            });
        }
        self.entries.push(TransferEntry::Event(event));
        Ok(())
    }

    pub fn push_failure(
        &mut self,
        stage: TransferStage,
        message: impl Into<String>,
    ) -> Result<(), ChainError> {
        self.ensure_open()?;
        self.entries.push(TransferEntry::Failed {
            stage,
            message: message.into(),
        });
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        matches!(
            self.entries.last(),
            Some(TransferEntry::Event(TransferEvent::Done { .. }))
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.entries.last(), Some(TransferEntry::Failed { .. }))
    }

    pub fn is_finished(&self) -> bool {
        self.is_done() || self.is_failed()
    }

    pub fn steps(&self) -> TransferSteps {
        self.entries
            .iter()
            .find_map(|entry| match entry {
                TransferEntry::Event(TransferEvent::Steps(steps)) => Some(steps.clone()),
                _ => None,
            })
            .unwrap_or_else(TransferSteps::standard)
    }

    /// Index of the step to highlight; `steps.len()` once the transfer is done.
    pub fn active_step(&self) -> Option<usize> {
        match self.entries.last()? {
            TransferEntry::Event(TransferEvent::Steps(steps)) => Some(steps.init_step),
            TransferEntry::Event(TransferEvent::Done { .. }) => Some(self.steps().steps.len()),
            TransferEntry::Event(event) => event.stage().map(TransferStage::index),
            TransferEntry::Failed { stage, .. } => Some(stage.index()),
        }
    }

    pub fn failed_step(&self) -> Option<(TransferStage, &str)> {
        match self.entries.last()? {
            TransferEntry::Failed { stage, message } => Some((*stage, message.as_str())),
            TransferEntry::Event(_) => None,
        }
    }

    pub fn latest_tx_hash(&self) -> Option<B256> {
        self.entries.iter().rev().find_map(|entry| match entry {
            TransferEntry::Event(event) => event.tx_hash(),
            TransferEntry::Failed { .. } => None,
        })
    }

    fn ensure_open(&self) -> Result<(), ChainError> {
        if self.is_finished() {
            let last_stage = match self.entries.last() {
                Some(TransferEntry::Event(event)) => event.stage(),
                Some(TransferEntry::Failed { stage, .. }) => Some(*stage),
                None => None,
            };
            return Err(ChainError::AttemptFinished(last_stage));
        }
        Ok(())
    }

    fn expected_next(&self) -> Option<TransferStage> {
        match self.entries.last() {
            None => None,
            Some(TransferEntry::Event(TransferEvent::Steps(_))) => {
                Some(TransferStage::PrepareTransaction)
            }
            Some(TransferEntry::Event(TransferEvent::Prepare { .. })) => {
                Some(TransferStage::WorkInProgress)
            }
            Some(TransferEntry::Event(TransferEvent::InProgress { .. })) => {
                Some(TransferStage::Done)
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::*;

    fn amount(raw: u64) -> Amount {
        Amount::new(U256::from(raw), 18)
    }

    fn hash() -> B256 {
        B256::repeat_byte(0xab)
    }

    #[test]
    fn events_serialize_with_stage_tag() {
        let event = TransferEvent::InProgress {
            tx_hash: hash(),
            amount: amount(1),
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["stage"], "work-in-progress");

        let done = TransferEvent::Done {
            tx_hash: hash(),
            block_number: 7,
        };
        let value = serde_json::to_value(&done).expect("serialize");
        assert_eq!(value["stage"], "done");
        assert_eq!(value["block_number"], 7);
    }

    #[test]
    fn log_accepts_stages_in_order_and_reports_done() {
        let mut log = TransferLog::new();
        log.push_event(TransferEvent::Steps(TransferSteps::standard()))
            .expect("steps");
        assert_eq!(log.active_step(), Some(0));
        log.push_event(TransferEvent::Prepare {
            balance: amount(10),
            amount: amount(1),
        })
        .expect("prepare");
        log.push_event(TransferEvent::InProgress {
            tx_hash: hash(),
            amount: amount(1),
        })
        .expect("in progress");
        assert_eq!(log.active_step(), Some(1));
        assert!(!log.is_done());
        log.push_event(TransferEvent::Done {
            tx_hash: hash(),
            block_number: 1,
        })
        .expect("done");
        assert!(log.is_done());
        assert!(!log.is_failed());
        assert_eq!(log.active_step(), Some(3));
        assert_eq!(log.latest_tx_hash(), Some(hash()));
    }

    #[test]
    fn log_rejects_skipped_stage() {
        let mut log = TransferLog::new();
        log.push_event(TransferEvent::Steps(TransferSteps::standard()))
            .expect("steps");
        let err = log
            .push_event(TransferEvent::Done {
                tx_hash: hash(),
                block_number: 1,
            })
            .expect_err("skip must fail");
        assert!(matches!(err, ChainError::OutOfOrder { .. }));
    }

    #[test]
    fn log_is_closed_after_failure() {
        let mut log = TransferLog::new();
        log.push_event(TransferEvent::Steps(TransferSteps::standard()))
            .expect("steps");
        log.push_failure(TransferStage::PrepareTransaction, "Insufficient balance")
            .expect("failure");
        assert!(log.is_failed());
        assert!(!log.is_done());
        assert_eq!(
            log.failed_step(),
            Some((TransferStage::PrepareTransaction, "Insufficient balance"))
        );

        let err = log
            .push_failure(TransferStage::WorkInProgress, "again")
            .expect_err("closed");
        assert!(matches!(
            err,
            ChainError::AttemptFinished(Some(TransferStage::PrepareTransaction))
        ));
    }
}
