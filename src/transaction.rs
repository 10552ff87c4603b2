//! Process-wide status of the single in-flight contract write.
//!
//! `idle -> pending -> success | error -> idle`. The return to idle happens
//! lazily: a settled status expires once its dismiss delay has elapsed and
//! the next snapshot reports idle.

use crate::contract::{ContractError, TxReceipt};
use serde::Serialize;
use std::time::{Duration, Instant};

pub const SUCCESS_DISMISS_AFTER: Duration = Duration::from_secs(3);
pub const ERROR_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    CheckIn,
    CreateHabit,
    UpdateHabit,
    DeleteHabit,
}

impl TxKind {
    fn pending_message(self) -> &'static str {
        match self {
            TxKind::CheckIn => "Confirming check-in...",
            TxKind::CreateHabit => "Creating habit...",
            TxKind::UpdateHabit => "Updating habit...",
            TxKind::DeleteHabit => "Deleting habit...",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            TxKind::CheckIn => "Checked in!",
            TxKind::CreateHabit => "Habit created!",
            TxKind::UpdateHabit => "Habit updated!",
            TxKind::DeleteHabit => "Habit deleted!",
        }
    }
}

/// User-facing text for a failed write.
pub fn failure_message(err: &ContractError) -> String {
    match err {
        ContractError::UserRejected => "Transaction cancelled.".to_string(),
        ContractError::AlreadyCheckedIn => "Already checked in today!".to_string(),
        ContractError::Timeout => {
            "Transaction timed out. It may still confirm; refresh to check.".to_string()
        }
        other => format!("Transaction failed: {other}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub status: TxStatus,
    pub kind: Option<TxKind>,
    pub message: Option<String>,
    pub tx_hash: Option<String>,
}

/// Handle for the write started by [`TransactionTracker::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("another transaction is still pending")]
pub struct TxBusy;

#[derive(Debug)]
pub struct TransactionTracker {
    status: TxStatus,
    kind: Option<TxKind>,
    message: Option<String>,
    tx_hash: Option<String>,
    settled_at: Option<Instant>,
    active: u64,
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self {
            status: TxStatus::Idle,
            kind: None,
            message: None,
            tx_hash: None,
            settled_at: None,
            active: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }

    pub fn begin(&mut self, kind: TxKind) -> Result<TxTicket, TxBusy> {
        if self.is_pending() {
            return Err(TxBusy);
        }
        self.active += 1;
        self.status = TxStatus::Pending;
        self.kind = Some(kind);
        self.message = Some(kind.pending_message().to_string());
        self.tx_hash = None;
        self.settled_at = None;
        Ok(TxTicket(self.active))
    }

    /// Settles the write behind `ticket` and returns the message shown for it.
    /// Stale tickets are ignored.
    pub fn finish(
        &mut self,
        ticket: TxTicket,
        outcome: &Result<TxReceipt, ContractError>,
        now: Instant,
    ) -> String {
        let message = match outcome {
            Ok(_) => self
                .kind
                .map(TxKind::success_message)
                .unwrap_or("Transaction confirmed")
                .to_string(),
            Err(err) => failure_message(err),
        };
        if ticket.0 != self.active || !self.is_pending() {
            return message;
        }

        match outcome {
            Ok(receipt) => {
                self.status = TxStatus::Success;
                self.tx_hash = Some(receipt.tx_hash.clone());
            }
            Err(_) => self.status = TxStatus::Error,
        }
        self.message = Some(message.clone());
        self.settled_at = Some(now);
        message
    }

    pub fn dismiss(&mut self) {
        if !self.is_pending() {
            self.reset();
        }
    }

    pub fn snapshot(&mut self, now: Instant) -> TransactionView {
        if let Some(settled_at) = self.settled_at {
            let delay = match self.status {
                TxStatus::Error => ERROR_DISMISS_AFTER,
                _ => SUCCESS_DISMISS_AFTER,
            };
            if now.saturating_duration_since(settled_at) >= delay {
                self.reset();
            }
        }

        TransactionView {
            status: self.status,
            kind: self.kind,
            message: self.message.clone(),
            tx_hash: self.tx_hash.clone(),
        }
    }

    fn reset(&mut self) {
        self.status = TxStatus::Idle;
        self.kind = None;
        self.message = None;
        self.tx_hash = None;
        self.settled_at = None;
    }
}
