//! The check-in contract's functional interface.
//!
//! Reads are `view` calls; writes resolve once the transaction has been
//! confirmed, so a successful return means later reads observe the change.

use crate::calendar::DayIndex;
use crate::models::{Address, RawHabit};
use async_trait::async_trait;
use serde::Serialize;

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("user rejected the request")]
    UserRejected,

    #[error("already checked in")]
    AlreadyCheckedIn,

    #[error("check-in fee too low: sent {sent} wei, need {required} wei")]
    InsufficientFee { sent: u128, required: u128 },

    #[error("habit {0} does not exist")]
    HabitNotFound(u64),

    #[error("habit limit of {0} reached")]
    HabitLimitReached(usize),

    #[error("invalid habit: {0}")]
    InvalidHabit(String),

    #[error("call timed out")]
    Timeout,

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ContractError {
    /// Classifies an unstructured failure message, for transports that only
    /// report text.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("user rejected") || lower.contains("user denied") {
            Self::UserRejected
        } else if lower.contains("already checked in") {
            Self::AlreadyCheckedIn
        } else {
            Self::Reverted(message.to_string())
        }
    }
}

#[async_trait]
pub trait HabitContract: Send + Sync {
    /// `checkIn(habitId, date) payable`
    async fn check_in(
        &self,
        caller: &Address,
        habit_id: u64,
        day: DayIndex,
        value_wei: u128,
    ) -> Result<TxReceipt, ContractError>;

    /// `hasCheckedIn(user, habitId, date) view`
    async fn has_checked_in(
        &self,
        user: &Address,
        habit_id: u64,
        day: DayIndex,
    ) -> Result<bool, ContractError>;

    async fn create_habit(
        &self,
        caller: &Address,
        name: &str,
        color_index: u64,
    ) -> Result<TxReceipt, ContractError>;

    async fn update_habit(
        &self,
        caller: &Address,
        habit_id: u64,
        name: &str,
        color_index: u64,
    ) -> Result<TxReceipt, ContractError>;

    async fn delete_habit(&self, caller: &Address, habit_id: u64) -> Result<TxReceipt, ContractError>;

    /// Every slot ever created for `user`, deleted ones included.
    async fn get_all_habits(&self, user: &Address) -> Result<Vec<RawHabit>, ContractError>;
}

/// Renders a wei amount as ether without trailing zeros, e.g. `0.00001`.
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:018}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_wallet_and_contract_messages() {
        assert_eq!(
            ContractError::from_message("MetaMask Tx Signature: User denied transaction signature."),
            ContractError::UserRejected
        );
        assert_eq!(
            ContractError::from_message("UserRejectedRequestError: User rejected the request."),
            ContractError::UserRejected
        );
        assert_eq!(
            ContractError::from_message("execution reverted: Already checked in"),
            ContractError::AlreadyCheckedIn
        );
        assert_eq!(
            ContractError::from_message("nonce too low"),
            ContractError::Reverted("nonce too low".to_string())
        );
    }

    #[test]
    fn formats_wei_as_ether() {
        assert_eq!(format_ether(10_000_000_000_000), "0.00001");
        assert_eq!(format_ether(WEI_PER_ETHER), "1");
        assert_eq!(format_ether(1_500_000_000_000_000_000), "1.5");
        assert_eq!(format_ether(0), "0");
    }
}
