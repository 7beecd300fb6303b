#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use time::{Date, Month};

use crate::board::model::Task;
use crate::error::PmtuiError;

/// How many task chips a calendar day shows before collapsing into "+N".
pub const DEFAULT_DAY_TASK_CAP: usize = 2;

/// Tasks whose deadline falls on `date`, in source collection order.
#[must_use]
pub fn tasks_on_date(tasks: &[Task], date: Date) -> Vec<&Task> {
    tasks.iter().filter(|t| t.deadline == date).collect()
}

/// Per-day render data: up to `cap` visible tasks plus an overflow count.
#[derive(Debug, Default)]
pub struct DayOverlay<'a> {
    pub visible: Vec<&'a Task>,
    pub hidden: usize,
}

#[must_use]
pub fn day_overlay(tasks: &[Task], date: Date, cap: usize) -> DayOverlay<'_> {
    let mut due = tasks_on_date(tasks, date);
    let hidden = due.len().saturating_sub(cap);
    due.truncate(cap);
    DayOverlay {
        visible: due,
        hidden,
    }
}

/// Deadline counts per day, for marking a calendar grid.
#[must_use]
pub fn marked_dates(tasks: &[Task]) -> BTreeMap<Date, usize> {
    let mut marks = BTreeMap::new();
    for task in tasks {
        *marks.entry(task.deadline).or_insert(0) += 1;
    }
    marks
}

/// A month laid out in Monday-first weeks. Leading/trailing cells outside
/// the month are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: Month,
    pub weeks: Vec<[Option<Date>; 7]>,
}

impl MonthGrid {
    pub fn new(year: i32, month: Month) -> Result<Self, PmtuiError> {
        let first = Date::from_calendar_date(year, month, 1).map_err(|e| {
            PmtuiError::Other(format!("invalid month {year}-{m:02}: {e}", m = month as u8))
        })?;
        let days = time::util::days_in_year_month(year, month);
        let lead = first.weekday().number_days_from_monday() as usize;

        let mut weeks = Vec::new();
        let mut week = [None; 7];
        let mut slot = lead;
        for day in 1..=days {
            // Dates within 1..=days_in_month cannot fail.
            if let Ok(date) = Date::from_calendar_date(year, month, day) {
                week[slot] = Some(date);
            }
            slot += 1;
            if slot == 7 {
                weeks.push(week);
                week = [None; 7];
                slot = 0;
            }
        }
        if slot > 0 {
            weeks.push(week);
        }
        Ok(Self { year, month, weeks })
    }
}

/// Parses `YYYY-MM` into a month, e.g. for the `calendar` command.
pub fn parse_month(value: &str) -> Result<(i32, Month), PmtuiError> {
    let invalid = || PmtuiError::Other(format!("invalid month '{value}': expected YYYY-MM"));
    let (y, m) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month_num: u8 = m.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month_num).map_err(|_| invalid())?;
    Ok((year, month))
}
