//! In-process implementation of the check-in contract.
//!
//! State lives in memory behind a mutex and is written to a JSON file after
//! every accepted transaction. A write that fails to persist is not applied,
//! and a ledger file that cannot be parsed refuses to open.

use crate::calendar::DayIndex;
use crate::contract::{ContractError, HabitContract, TxReceipt};
use crate::models::{Address, RawHabit};
use crate::palette::HabitColor;
use crate::storage::{StorageError, persist_json, read_json};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};

pub const MAX_HABITS_PER_ACCOUNT: usize = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AccountLedger {
    #[serde(default)]
    habits: Vec<RawHabit>,
    #[serde(default)]
    check_ins: BTreeSet<(u64, DayIndex)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    accounts: BTreeMap<Address, AccountLedger>,
    #[serde(default)]
    tx_count: u64,
    #[serde(default)]
    collected_wei: u128,
}

pub struct LedgerContract {
    path: Option<PathBuf>,
    min_fee_wei: u128,
    state: Mutex<LedgerState>,
}

impl LedgerContract {
    pub async fn open(path: &Path, min_fee_wei: u128) -> Result<Self, StorageError> {
        let state = read_json(path).await?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            min_fee_wei,
            state: Mutex::new(state),
        })
    }

    pub fn in_memory(min_fee_wei: u128) -> Self {
        Self {
            path: None,
            min_fee_wei,
            state: Mutex::new(LedgerState::default()),
        }
    }

    #[cfg(test)]
    async fn collected_wei(&self) -> u128 {
        self.state.lock().await.collected_wei
    }

    /// Applies `apply` to a copy of the state and swaps it in once persisted.
    async fn transact<F>(&self, caller: &Address, apply: F) -> Result<TxReceipt, ContractError>
    where
        F: FnOnce(&mut LedgerState, &Address) -> Result<(), ContractError>,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        apply(&mut next, caller)?;
        next.tx_count += 1;

        if let Some(path) = &self.path {
            persist_json(path, &next).await.map_err(|err| {
                error!(path = %path.display(), "failed to persist ledger: {err}");
                ContractError::Transport(err.to_string())
            })?;
        }

        let receipt = TxReceipt {
            tx_hash: format!("0x{:064x}", next.tx_count),
        };
        *state = next;
        debug!(caller = %caller, tx_hash = %receipt.tx_hash, "transaction confirmed");
        Ok(receipt)
    }
}

fn validate_habit(name: &str, color_index: u64) -> Result<(), ContractError> {
    if name.trim().is_empty() {
        return Err(ContractError::InvalidHabit("name must not be empty".to_string()));
    }
    if HabitColor::from_index(color_index).is_none() {
        return Err(ContractError::InvalidHabit(format!(
            "color index {color_index} is out of range"
        )));
    }
    Ok(())
}

fn live_slot<'a>(state: &'a mut LedgerState, caller: &Address, habit_id: u64) -> Result<&'a mut RawHabit, ContractError> {
    state
        .accounts
        .get_mut(caller)
        .and_then(|account| account.habits.get_mut(usize::try_from(habit_id).ok()?))
        .filter(|slot| slot.exists)
        .ok_or(ContractError::HabitNotFound(habit_id))
}

#[async_trait]
impl HabitContract for LedgerContract {
    async fn check_in(
        &self,
        caller: &Address,
        habit_id: u64,
        day: DayIndex,
        value_wei: u128,
    ) -> Result<TxReceipt, ContractError> {
        let required = self.min_fee_wei;
        self.transact(caller, |state, caller| {
            if value_wei < required {
                return Err(ContractError::InsufficientFee { sent: value_wei, required });
            }
            let account = state.accounts.entry(caller.clone()).or_default();
            if !account.check_ins.insert((habit_id, day)) {
                return Err(ContractError::AlreadyCheckedIn);
            }
            state.collected_wei = state.collected_wei.saturating_add(value_wei);
            Ok(())
        })
        .await
    }

    async fn has_checked_in(
        &self,
        user: &Address,
        habit_id: u64,
        day: DayIndex,
    ) -> Result<bool, ContractError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(user)
            .is_some_and(|account| account.check_ins.contains(&(habit_id, day))))
    }

    async fn create_habit(
        &self,
        caller: &Address,
        name: &str,
        color_index: u64,
    ) -> Result<TxReceipt, ContractError> {
        validate_habit(name, color_index)?;
        self.transact(caller, |state, caller| {
            let account = state.accounts.entry(caller.clone()).or_default();
            if account.habits.len() >= MAX_HABITS_PER_ACCOUNT {
                return Err(ContractError::HabitLimitReached(MAX_HABITS_PER_ACCOUNT));
            }
            account.habits.push(RawHabit {
                name: name.trim().to_string(),
                color_index,
                exists: true,
            });
            Ok(())
        })
        .await
    }

    async fn update_habit(
        &self,
        caller: &Address,
        habit_id: u64,
        name: &str,
        color_index: u64,
    ) -> Result<TxReceipt, ContractError> {
        validate_habit(name, color_index)?;
        self.transact(caller, |state, caller| {
            let slot = live_slot(state, caller, habit_id)?;
            slot.name = name.trim().to_string();
            slot.color_index = color_index;
            Ok(())
        })
        .await
    }

    async fn delete_habit(&self, caller: &Address, habit_id: u64) -> Result<TxReceipt, ContractError> {
        self.transact(caller, |state, caller| {
            live_slot(state, caller, habit_id)?.exists = false;
            Ok(())
        })
        .await
    }

    async fn get_all_habits(&self, user: &Address) -> Result<Vec<RawHabit>, ContractError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(user)
            .map(|account| account.habits.clone())
            .unwrap_or_default())
    }
}
