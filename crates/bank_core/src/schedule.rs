//! Five-field cron expressions (`minute hour day-of-month month day-of-week`).
//!
//! Supports `*`, single values, ranges, comma lists and `/step`. Times are
//! evaluated in UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

use crate::error::ValidationError;

const MINUTES_PER_DAY: u32 = 24 * 60;
const SEARCH_DAYS: u32 = 366 * 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    day_of_month_restricted: bool,
    day_of_week_restricted: bool,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, ValidationError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(ValidationError::new(format!(
                "schedule '{expression}' must have 5 fields, found {}",
                fields.len()
            )));
        };

        let mut days_of_week = parse_field(dow, 0, 7, "day-of-week")?;
        // 7 is an alias for Sunday.
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: fields.join(" "),
            minutes: parse_field(minute, 0, 59, "minute")?,
            hours: parse_field(hour, 0, 23, "hour")?,
            days_of_month: parse_field(dom, 1, 31, "day-of-month")?,
            months: parse_field(month, 1, 12, "month")?,
            days_of_week,
            day_of_month_restricted: *dom != "*",
            day_of_week_restricted: *dow != "*",
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let base = after.with_second(0)?.with_nanosecond(0)? + chrono::Duration::minutes(1);
        let mut date = base.date_naive();
        let mut first_minute = base.hour() * 60 + base.minute();

        for _ in 0..SEARCH_DAYS {
            if self.matches_date(date) {
                for minute_of_day in first_minute..MINUTES_PER_DAY {
                    let (hour, minute) = (minute_of_day / 60, minute_of_day % 60);
                    if has(self.hours, hour) && has(self.minutes, minute) {
                        let naive = date.and_hms_opt(hour, minute, 0)?;
                        return Some(Utc.from_utc_datetime(&naive));
                    }
                }
            }
            date = date.succ_opt()?;
            first_minute = 0;
        }

        None
    }

    fn matches_date(&self, date: NaiveDate) -> bool {
        if !has(self.months, date.month()) {
            return false;
        }

        let dom = has(self.days_of_month, date.day());
        let dow = has(self.days_of_week, date.weekday().num_days_from_sunday());
        match (self.day_of_month_restricted, self.day_of_week_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }
}

impl FromStr for CronSchedule {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn has(mask: u64, value: u32) -> bool {
    mask & (1 << value) != 0
}

fn parse_field(field: &str, min: u32, max: u32, name: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::new(format!("invalid {name} field '{field}'"));
    let mut mask = 0u64;

    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid())?;
                if step == 0 {
                    return Err(invalid());
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (min, max)
        } else if let Some((start, end)) = range.split_once('-') {
            (
                start.parse().map_err(|_| invalid())?,
                end.parse().map_err(|_| invalid())?,
            )
        } else {
            let value: u32 = range.parse().map_err(|_| invalid())?;
            // `5/15` means "from 5 to max every 15".
            if part.contains('/') {
                (value, max)
            } else {
                (value, value)
            }
        };

        if start < min || end > max || start > end {
            return Err(invalid());
        }

        for value in (start..=end).step_by(step as usize) {
            mask |= 1 << value;
        }
    }

    Ok(mask)
}
