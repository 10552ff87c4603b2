//! The set of habits shown for the connected account.
//!
//! Two backends exist. The contract backend reads `getAllHabits` and shows
//! only live, named slots; its mutations are contract writes and the list is
//! re-read after each one confirms. The local backend keeps one JSON list per
//! account in a file and is updated synchronously.

use crate::contract::{ContractError, HabitContract};
use crate::models::{Address, Habit, RawHabit};
use crate::palette::HabitColor;
use crate::storage::{load_json, persist_json};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};

pub const DEFAULT_HABIT_NAME: &str = "Daily Check-in App";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    Contract,
    Local,
}

impl FromStr for RegistryBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contract" => Ok(Self::Contract),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown habit registry `{other}`, expected `contract` or `local`")),
        }
    }
}

impl fmt::Display for RegistryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract => f.write_str("contract"),
            Self::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("habit {0} not found")]
    NotFound(u64),

    #[error("the last habit cannot be deleted")]
    LastHabit,

    #[error("failed to save habits: {0}")]
    Storage(String),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub fn default_habit() -> Habit {
    Habit {
        id: 0,
        name: DEFAULT_HABIT_NAME.to_string(),
        color: HabitColor::default(),
    }
}

/// Live, named slots of a `getAllHabits` result. Ids are positions in the
/// unfiltered array.
pub fn filter_habits(raw: &[RawHabit]) -> Vec<Habit> {
    raw.iter()
        .enumerate()
        .filter(|(_, slot)| slot.exists && !slot.name.is_empty())
        .map(|(index, slot)| Habit {
            id: index as u64,
            name: slot.name.clone(),
            color: HabitColor::from_index_lossy(slot.color_index),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredHabit {
    id: u64,
    name: String,
    #[serde(rename = "colorIndex")]
    color_index: u64,
}

impl From<&Habit> for StoredHabit {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            color_index: habit.color.index(),
        }
    }
}

/// Decodes one account's stored list. Unnamed entries and repeated ids are
/// dropped; a list with nothing usable yields the default habit.
pub fn decode_local(raw: &str) -> Vec<Habit> {
    match serde_json::from_str::<Vec<StoredHabit>>(raw) {
        Ok(stored) => {
            let total = stored.len();
            let mut seen = BTreeSet::new();
            let habits: Vec<Habit> = stored
                .into_iter()
                .filter(|habit| !habit.name.trim().is_empty() && seen.insert(habit.id))
                .map(|habit| Habit {
                    id: habit.id,
                    name: habit.name,
                    color: HabitColor::from_index_lossy(habit.color_index),
                })
                .collect();
            if habits.len() < total {
                warn!(dropped = total - habits.len(), "skipped unnamed or duplicate stored habits");
            }
            if habits.is_empty() {
                vec![default_habit()]
            } else {
                habits
            }
        }
        Err(err) => {
            warn!("stored habit list is corrupt, using default: {err}");
            vec![default_habit()]
        }
    }
}

fn encode_local(habits: &[Habit]) -> Result<String, RegistryError> {
    let stored: Vec<StoredHabit> = habits.iter().map(StoredHabit::from).collect();
    serde_json::to_string(&stored).map_err(|err| RegistryError::Storage(err.to_string()))
}

/// Key under which an account's id counter is kept next to its list.
fn next_id_key(account: &Address) -> String {
    format!("{}:nextId", account.as_str())
}

/// File-backed key/value store: lowercase address -> JSON-encoded habit list,
/// plus `<address>:nextId` -> the next id to hand out. The counter only
/// grows, so a deleted habit's id (and its check-ins) never come back.
pub struct LocalHabitStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalHabitStore {
    pub async fn open(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            entries: Mutex::new(load_json(path).await),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Without an account the list is a single default habit that is never saved.
    pub async fn load(&self, account: Option<&Address>) -> Vec<Habit> {
        let Some(account) = account else {
            return vec![default_habit()];
        };
        let entries = self.entries.lock().await;
        entries
            .get(account.as_str())
            .map(|raw| decode_local(raw))
            .unwrap_or_else(|| vec![default_habit()])
    }

    pub async fn create(&self, account: &Address, name: &str, color: HabitColor) -> Result<Habit, RegistryError> {
        self.mutate(account, |habits, next_id| {
            let habit = Habit {
                id: *next_id,
                name: name.to_string(),
                color,
            };
            *next_id = next_id.saturating_add(1);
            habits.push(habit.clone());
            Ok(habit)
        })
        .await
    }

    pub async fn update(&self, account: &Address, id: u64, name: &str, color: HabitColor) -> Result<Habit, RegistryError> {
        self.mutate(account, |habits, _| {
            let habit = habits
                .iter_mut()
                .find(|habit| habit.id == id)
                .ok_or(RegistryError::NotFound(id))?;
            habit.name = name.to_string();
            habit.color = color;
            Ok(habit.clone())
        })
        .await
    }

    pub async fn delete(&self, account: &Address, id: u64) -> Result<(), RegistryError> {
        self.mutate(account, |habits, _| {
            if !habits.iter().any(|habit| habit.id == id) {
                return Err(RegistryError::NotFound(id));
            }
            if habits.len() == 1 {
                return Err(RegistryError::LastHabit);
            }
            habits.retain(|habit| habit.id != id);
            Ok(())
        })
        .await
    }

    async fn mutate<T, F>(&self, account: &Address, apply: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut Vec<Habit>, &mut u64) -> Result<T, RegistryError>,
    {
        let mut entries = self.entries.lock().await;
        let mut habits = entries
            .get(account.as_str())
            .map(|raw| decode_local(raw))
            .unwrap_or_else(|| vec![default_habit()]);
        // Lists saved before the counter existed resume after their highest id.
        let counter_key = next_id_key(account);
        let stored_next = entries
            .get(&counter_key)
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);
        let mut next_id = habits
            .iter()
            .map(|habit| habit.id.saturating_add(1))
            .fold(stored_next, u64::max);
        let result = apply(&mut habits, &mut next_id)?;

        let mut staged = entries.clone();
        staged.insert(account.as_str().to_string(), encode_local(&habits)?);
        staged.insert(counter_key, next_id.to_string());
        if let Some(path) = &self.path {
            persist_json(path, &staged).await.map_err(|err| {
                error!(path = %path.display(), "failed to persist habits: {err}");
                RegistryError::Storage(err.to_string())
            })?;
        }
        *entries = staged;
        Ok(result)
    }
}

pub struct HabitRegistry {
    backend: RegistryBackend,
    contract: Arc<dyn HabitContract>,
    local: LocalHabitStore,
    read_timeout: Duration,
}

impl HabitRegistry {
    pub fn new(
        backend: RegistryBackend,
        contract: Arc<dyn HabitContract>,
        local: LocalHabitStore,
        read_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            contract,
            local,
            read_timeout,
        }
    }

    pub fn backend(&self) -> RegistryBackend {
        self.backend
    }

    pub fn local(&self) -> &LocalHabitStore {
        &self.local
    }

    /// Current snapshot for `account`. The contract backend has no habits
    /// without a connected account.
    pub async fn load(&self, account: Option<&Address>) -> Result<Vec<Habit>, RegistryError> {
        match self.backend {
            RegistryBackend::Local => Ok(self.local.load(account).await),
            RegistryBackend::Contract => {
                let Some(account) = account else {
                    return Ok(Vec::new());
                };
                let raw = match timeout(self.read_timeout, self.contract.get_all_habits(account)).await {
                    Ok(result) => result?,
                    Err(_) => return Err(ContractError::Timeout.into()),
                };
                let habits = filter_habits(&raw);
                info!(account = %account, slots = raw.len(), live = habits.len(), "loaded habits");
                Ok(habits)
            }
        }
    }
}
