//! Month grid arithmetic for the habit calendar.
//!
//! Every check-in is keyed by a day-index: whole days since the Unix epoch,
//! measured at local midnight and truncated toward negative infinity. Reads and
//! writes both go through [`day_index`], so the value sent with a check-in and
//! the value later queried always agree.

use chrono::{Datelike, Duration, Local, LocalResult, Months, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;

pub type DayIndex = i64;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Day-index of `date` in the process-local timezone.
pub fn day_index(date: NaiveDate) -> DayIndex {
    day_index_in(&Local, date)
}

pub fn day_index_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DayIndex {
    let midnight = date.and_time(NaiveTime::MIN);
    let millis = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) | LocalResult::Ambiguous(start, _) => start.timestamp_millis(),
        // Midnight skipped by a DST jump: the day begins at the first valid instant.
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|start| start.timestamp_millis())
            .unwrap_or_else(|| midnight.and_utc().timestamp_millis()),
    };
    millis.div_euclid(MILLIS_PER_DAY)
}

/// The `(year, month)` shown by the calendar, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ViewCursor {
    first: NaiveDate,
}

impl ViewCursor {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - Duration::days(i64::from(date.day0())),
        }
    }

    pub fn from_parts(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// Calendar month, 1 = January.
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        *self == Self::containing(today)
    }

    pub fn days_in_month(&self) -> u32 {
        self.first
            .checked_add_months(Months::new(1))
            .map(|next| (next - self.first).num_days() as u32)
            .unwrap_or(31)
    }

    /// Weekday of the 1st, 0 = Sunday.
    pub fn first_weekday_offset(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), day)
    }

    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    pub fn previous(&mut self) {
        if let Some(first) = self.first.checked_sub_months(Months::new(1)) {
            self.first = first;
        }
    }

    /// Moves forward one month. Returns `false` and leaves the cursor alone once
    /// it already shows the month containing `today`.
    pub fn next(&mut self, today: NaiveDate) -> bool {
        if *self >= Self::containing(today) {
            return false;
        }
        match self.first.checked_add_months(Months::new(1)) {
            Some(first) => {
                self.first = first;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::containing(today);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: String,
    pub day_index: DayIndex,
    pub is_today: bool,
    pub is_past: bool,
    pub is_future: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthLayout {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub days_in_month: u32,
    pub first_weekday_offset: u32,
    pub is_current_month: bool,
    pub can_go_next: bool,
    pub days: Vec<CalendarDay>,
}

pub fn build_month(cursor: ViewCursor, today: NaiveDate) -> MonthLayout {
    build_month_in(&Local, cursor, today)
}

pub fn build_month_in<Tz: TimeZone>(tz: &Tz, cursor: ViewCursor, today: NaiveDate) -> MonthLayout {
    let days = (1..=cursor.days_in_month())
        .filter_map(|day| cursor.date_of(day).map(|date| (day, date)))
        .map(|(day, date)| CalendarDay {
            day,
            date: date.to_string(),
            day_index: day_index_in(tz, date),
            is_today: date == today,
            is_past: date < today,
            is_future: date > today,
        })
        .collect();

    MonthLayout {
        year: cursor.year(),
        month: cursor.month(),
        label: cursor.label(),
        days_in_month: cursor.days_in_month(),
        first_weekday_offset: cursor.first_weekday_offset(),
        is_current_month: cursor.is_current(today),
        can_go_next: cursor < ViewCursor::containing(today),
        days,
    }
}
