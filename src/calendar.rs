use crate::error::{Result, SimulationError};
use crate::schema::Department;
use crate::utils::{
    first_of_next_month, month_label, months_between, parse_month, quarter_label,
    quarter_of_month, year_label,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    /// First day of the month
    pub date: NaiveDate,
    /// 0-based position from the start of the range
    pub index: u32,
    pub year: i32,
    /// Month of year, 1-12
    pub month: u32,
    pub quarter: u32,
}

impl CalendarMonth {
    fn from_date(date: NaiveDate, index: u32) -> Self {
        Self {
            date,
            index,
            year: date.year(),
            month: date.month(),
            quarter: quarter_of_month(date.month()),
        }
    }

    pub fn label(&self) -> String {
        month_label(self.date)
    }

    pub fn quarter_period(&self) -> String {
        quarter_label(self.year, self.quarter)
    }

    pub fn year_period(&self) -> String {
        year_label(self.year)
    }
}

/// Consecutive months over an inclusive range.
#[derive(Debug, Clone)]
pub struct Calendar {
    months: Vec<CalendarMonth>,
}

impl Calendar {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let span = months_between(start, end);
        if span < 0 {
            return Err(SimulationError::InvalidDateRange {
                start: month_label(start),
                end: month_label(end),
            });
        }

        let mut months = Vec::with_capacity(span as usize + 1);
        let mut current = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap_or(start);
        for index in 0..=span as u32 {
            months.push(CalendarMonth::from_date(current, index));
            current = first_of_next_month(current);
        }

        Ok(Self { months })
    }

    pub fn from_labels(start_month: &str, end_month: &str) -> Result<Self> {
        Self::new(parse_month(start_month)?, parse_month(end_month)?)
    }

    pub fn months(&self) -> &[CalendarMonth] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// One (department, month) slot of the monthly fact table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey {
    pub department: Department,
    pub month: CalendarMonth,
}

/// Department-major cartesian product of departments and calendar months.
pub fn build_skeleton(calendar: &Calendar, departments: &[Department]) -> Vec<RowKey> {
    let mut keys = Vec::with_capacity(calendar.len() * departments.len());
    for &department in departments {
        for month in calendar.months() {
            keys.push(RowKey {
                department,
                month: month.clone(),
            });
        }
    }
    keys
}
