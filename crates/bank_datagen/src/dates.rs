use chrono::{Days, Months, NaiveDate};
use rand::Rng;

pub const MIN_CUSTOMER_AGE: u32 = 18;
pub const MAX_CUSTOMER_AGE: u32 = 70;

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("window bounds are valid calendar dates")
}

/// Relationship-start dates: 2015-01-01 through 2024-12-31.
pub fn date_joined_window() -> DateWindow {
    DateWindow {
        start: ymd(2015, 1, 1),
        end: ymd(2024, 12, 31),
    }
}

/// Account opening dates: 2010-01-01 through 2024-12-31.
pub fn opening_date_window() -> DateWindow {
    DateWindow {
        start: ymd(2010, 1, 1),
        end: ymd(2024, 12, 31),
    }
}

/// Birth dates for customers aged 18 to 70 on `today`.
pub fn birth_date_window(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: years_before(today, MAX_CUSTOMER_AGE),
        end: years_before(today, MIN_CUSTOMER_AGE),
    }
}

/// Feb 29 anniversaries clamp to Feb 28.
pub fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MIN)
}

/// Uniformly random day in the window, both ends included.
pub fn random_date<R: Rng + ?Sized>(rng: &mut R, window: DateWindow) -> NaiveDate {
    let span = (window.end - window.start).num_days().max(0) as u64;
    let offset = rng.gen_range(0..=span);
    window
        .start
        .checked_add_days(Days::new(offset))
        .unwrap_or(window.end)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn birth_window_spans_configured_ages() {
        let today = ymd(2026, 2, 14);
        let window = birth_date_window(today);
        assert_eq!(window.start, ymd(1956, 2, 14));
        assert_eq!(window.end, ymd(2008, 2, 14));
    }

    #[test]
    fn leap_day_clamps_to_end_of_february() {
        assert_eq!(years_before(ymd(2024, 2, 29), 18), ymd(2006, 2, 28));
    }

    #[test]
    fn random_date_stays_inside_window() {
        let mut rng = StdRng::seed_from_u64(9);
        let window = date_joined_window();
        for _ in 0..2_000 {
            assert!(window.contains(random_date(&mut rng, window)));
        }
    }

    #[test]
    fn single_day_window_returns_that_day() {
        let mut rng = StdRng::seed_from_u64(1);
        let day = ymd(2020, 6, 1);
        let window = DateWindow {
            start: day,
            end: day,
        };
        assert_eq!(random_date(&mut rng, window), day);
    }
}
