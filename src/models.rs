use crate::calendar::{DayIndex, MonthLayout};
use crate::palette::{ColorStyle, HabitColor};
use crate::stats::{DayStatus, MonthStats};
use crate::transaction::TransactionView;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address, normalised to lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must have 40 hex digits, got {0}")]
    BadLength(usize),

    #[error("address contains non-hex characters")]
    NotHex,
}

impl Address {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;
        if digits.len() != 40 {
            return Err(AddressError::BadLength(digits.len()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::NotHex);
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234...abcd`
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habit {
    pub id: u64,
    pub name: String,
    pub color: HabitColor,
}

/// One habit slot as returned by `getAllHabits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHabit {
    pub name: String,
    pub color_index: u64,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitView {
    pub id: u64,
    pub name: String,
    pub color_index: u64,
    pub color: &'static ColorStyle,
}

impl From<&Habit> for HabitView {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            color_index: habit.color.index(),
            color: habit.color.style(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct HabitForm {
    pub name: String,
    #[serde(default)]
    pub color_index: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub habit_id: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct WalletView {
    pub connected: bool,
    pub address: Option<String>,
    pub short_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContractInfo {
    pub address: String,
    pub check_in_fee_wei: String,
    pub check_in_fee: String,
    pub registry: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub wallet: WalletView,
    pub year: i32,
    pub month: u32,
    pub selected_habit: Option<u64>,
    pub transaction: TransactionView,
    pub contract: ContractInfo,
}

#[derive(Debug, Serialize)]
pub struct HabitsResponse {
    pub habits: Vec<HabitView>,
    pub selected_habit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DayView {
    pub day: u32,
    pub date: String,
    pub day_index: DayIndex,
    pub is_today: bool,
    pub is_past: bool,
    pub status: DayStatus,
    pub can_check_in: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub month: MonthLayout,
    pub habit: Option<HabitView>,
    pub days: Vec<DayView>,
    pub stats: MonthStats,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub habit_id: u64,
    pub day_index: DayIndex,
    pub tx_hash: String,
}
