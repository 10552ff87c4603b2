use crate::calendar::{DayIndex, ViewCursor};
use crate::contract::{ContractError, HabitContract};
use crate::models::Address;
use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

pub const WEEK_STREAK_DAYS: u32 = 7;
pub const MONTH_STREAK_DAYS: u32 = 30;
pub const CENTURY_CHECK_INS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Checked,
    Unchecked,
    /// The read for this day failed; counted as unchecked.
    Unknown,
    /// After today, never queried.
    Upcoming,
}

impl DayStatus {
    pub fn is_checked(self) -> bool {
        self == DayStatus::Checked
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Achievements {
    pub week_streak: bool,
    pub month_streak: bool,
    pub perfect_month: bool,
    pub century: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthStats {
    pub total_checked: u32,
    pub range_length: u32,
    pub completion_percentage: u32,
    pub current_streak: u32,
    pub achievements: Achievements,
}

/// Number of days of `cursor`'s month that are evaluated: up to and including
/// today for the current month, the whole month for past months, none for
/// future months.
pub fn evaluated_days(cursor: ViewCursor, today: NaiveDate) -> u32 {
    let current = ViewCursor::containing(today);
    if cursor == current {
        today.day()
    } else if cursor < current {
        cursor.days_in_month()
    } else {
        0
    }
}

pub fn completion_percentage(total_checked: u32, range_length: u32) -> u32 {
    if range_length == 0 {
        return 0;
    }
    // round(total / range * 100), halves rounded up
    let (total, range) = (u64::from(total_checked), u64::from(range_length));
    ((total * 200 + range) / (range * 2)) as u32
}

/// Consecutive checked days counted backward from the last evaluated day.
/// When that day is today, an unchecked today does not break the streak.
pub fn current_streak(checked: &[bool], ends_today: bool) -> u32 {
    let mut streak = 0;
    for (position, &is_checked) in checked.iter().rev().enumerate() {
        if is_checked {
            streak += 1;
        } else if position == 0 && ends_today {
            continue;
        } else {
            break;
        }
    }
    streak
}

pub fn achievements(current_streak: u32, completion_percentage: u32, total_checked: u32) -> Achievements {
    Achievements {
        week_streak: current_streak >= WEEK_STREAK_DAYS,
        month_streak: current_streak >= MONTH_STREAK_DAYS,
        perfect_month: completion_percentage == 100,
        century: total_checked >= CENTURY_CHECK_INS,
    }
}

/// Reduces the settled per-day results of one month. `checked[i]` belongs to
/// day `i + 1`; the slice covers exactly the evaluated range.
pub fn build_month_stats(checked: &[bool], ends_today: bool) -> MonthStats {
    let range_length = checked.len() as u32;
    let total_checked = checked.iter().filter(|&&is_checked| is_checked).count() as u32;
    let completion_percentage = completion_percentage(total_checked, range_length);
    let current_streak = current_streak(checked, ends_today);

    MonthStats {
        total_checked,
        range_length,
        completion_percentage,
        current_streak,
        achievements: achievements(current_streak, completion_percentage, total_checked),
    }
}

/// Issues one `hasCheckedIn` read per day and waits for all of them. A failed
/// or timed-out read marks only its own day as [`DayStatus::Unknown`].
pub async fn fetch_day_statuses(
    contract: &dyn HabitContract,
    user: &Address,
    habit_id: u64,
    days: &[DayIndex],
    read_timeout: Duration,
) -> Vec<DayStatus> {
    let reads = days.iter().map(|&day| async move {
        let result = match timeout(read_timeout, contract.has_checked_in(user, habit_id, day)).await {
            Ok(result) => result,
            Err(_) => Err(ContractError::Timeout),
        };
        match result {
            Ok(true) => DayStatus::Checked,
            Ok(false) => DayStatus::Unchecked,
            Err(err) => {
                warn!(account = %user, habit_id, day_index = day, "check-in read failed: {err}");
                DayStatus::Unknown
            }
        }
    });
    join_all(reads).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TxReceipt;
    use crate::models::RawHabit;
    use async_trait::async_trait;

    #[test]
    fn streak_stops_at_the_first_gap() {
        let stats = build_month_stats(&[true, true, false, true, true], true);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.total_checked, 4);
        assert_eq!(stats.range_length, 5);
        assert_eq!(stats.completion_percentage, 80);
    }

    #[test]
    fn unchecked_today_keeps_the_streak() {
        assert_eq!(current_streak(&[true, true, true, false], true), 3);
        assert_eq!(current_streak(&[true, true, false, false], true), 0);
    }

    #[test]
    fn unchecked_last_day_of_a_past_month_breaks_the_streak() {
        assert_eq!(current_streak(&[true, true, true, false], false), 0);
    }

    #[test]
    fn completion_percentage_rounds_and_handles_empty_range() {
        assert_eq!(completion_percentage(5, 20), 25);
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(1, 8), 13);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(build_month_stats(&[], true), MonthStats::default());
    }

    #[test]
    fn achievements_fire_independently() {
        let week = achievements(7, 50, 7);
        assert!(week.week_streak);
        assert!(!week.month_streak);

        let month = achievements(30, 100, 30);
        assert!(month.week_streak && month.month_streak && month.perfect_month);
        assert!(!month.century);

        assert!(achievements(0, 0, 100).century);
    }

    #[test]
    fn reduction_is_idempotent() {
        let checked = [false, true, true, true, true, true, true, true];
        let first = build_month_stats(&checked, true);
        assert_eq!(first, build_month_stats(&checked, true));
        assert_eq!(first.current_streak, 7);
        assert!(first.achievements.week_streak);
    }

    #[test]
    fn evaluated_days_depend_on_the_cursor() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(evaluated_days(ViewCursor::containing(today), today), 19);
        assert_eq!(evaluated_days(ViewCursor::from_parts(2026, 9).unwrap(), today), 30);
        assert_eq!(evaluated_days(ViewCursor::from_parts(2026, 11).unwrap(), today), 0);
    }

    /// Checked on even days, fails on days divisible by 5.
    struct FlakyReads;

    #[async_trait]
    impl HabitContract for FlakyReads {
        async fn check_in(&self, _: &Address, _: u64, _: DayIndex, _: u128) -> Result<TxReceipt, ContractError> {
            unimplemented!()
        }

        async fn has_checked_in(&self, _: &Address, _: u64, day: DayIndex) -> Result<bool, ContractError> {
            if day % 5 == 0 {
                Err(ContractError::Transport("connection reset".to_string()))
            } else {
                Ok(day % 2 == 0)
            }
        }

        async fn create_habit(&self, _: &Address, _: &str, _: u64) -> Result<TxReceipt, ContractError> {
            unimplemented!()
        }

        async fn update_habit(&self, _: &Address, _: u64, _: &str, _: u64) -> Result<TxReceipt, ContractError> {
            unimplemented!()
        }

        async fn delete_habit(&self, _: &Address, _: u64) -> Result<TxReceipt, ContractError> {
            unimplemented!()
        }

        async fn get_all_habits(&self, _: &Address) -> Result<Vec<RawHabit>, ContractError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn failed_reads_only_affect_their_own_day() {
        let user = Address::parse("0x000000000000000000000000000000000000b0b0").unwrap();
        let statuses = fetch_day_statuses(&FlakyReads, &user, 0, &[1, 2, 3, 4, 5, 6], Duration::from_secs(1)).await;
        assert_eq!(
            statuses,
            vec![
                DayStatus::Unchecked,
                DayStatus::Checked,
                DayStatus::Unchecked,
                DayStatus::Checked,
                DayStatus::Unknown,
                DayStatus::Checked,
            ]
        );
    }
}
