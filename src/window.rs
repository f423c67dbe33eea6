//! Reporting window: the Monday–Sunday span starting the next calendar
//! Monday from "today", in the fixed report timezone (UTC+8, no DST).

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};

const TZ_OFFSET_SECS: i32 = 8 * 3600;

/// The fixed report timezone. All five theaters share it.
pub fn report_tz() -> FixedOffset {
    FixedOffset::east_opt(TZ_OFFSET_SECS).unwrap()
}

/// Calendar date of `now` in the report timezone.
pub fn today_in_report_tz(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&report_tz()).date_naive()
}

/// Calendar date of an epoch-milliseconds timestamp in the report timezone.
/// Returns `None` for out-of-range values.
pub fn date_from_epoch_millis(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&report_tz()).date_naive())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    /// The next Monday strictly after `today`, through the following Sunday.
    pub fn next_week(today: NaiveDate) -> ReportWindow {
        let until_monday = match 7 - today.weekday().num_days_from_monday() {
            0 => 7,
            d => d,
        };
        let start = today + Days::new(u64::from(until_monday));
        ReportWindow { start, end: start + Days::new(6) }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// ISO-week directory name for the window, e.g. `2026-W33`.
    pub fn iso_week_label(&self) -> String {
        self.start.format("%G-W%V").to_string()
    }
}
