//! Reporting over closed tracking entries.
//!
//! Periods are anchored to the local calendar: a day runs from local
//! midnight to the next local midnight, a week starts on Monday, and
//! month and year snap to the first of the month and January 1st. The
//! boundaries are converted to UTC half-open intervals for querying.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// Day label format for report rows, e.g. "Jun 10, 2024".
const DAY_FORMAT: &str = "%b %d, %Y";

/// Clock format for start/end columns, e.g. "09:30:00".
const TIME_FORMAT: &str = "%H:%M:%S";

/// Errors produced while building a report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("invalid display period: {value} (expected day, week, month, or year)")]
    InvalidPeriod { value: String },
    #[error("entry in sheet {sheet} starting {started_at} ends before it starts")]
    NegativeDuration {
        sheet: String,
        started_at: DateTime<Utc>,
    },
}

/// Reporting period, anchored to the local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for Period {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(ReportError::InvalidPeriod {
                value: other.to_string(),
            }),
        }
    }
}

// ========== Period Date Calculation ==========

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc(local_date: NaiveDate) -> DateTime<Utc> {
    let midnight = local_date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    match Local.from_local_datetime(&midnight) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // DST spring-forward gap at midnight is rare but possible
            // Use 1am local which is guaranteed to exist
            let one_am = local_date.and_time(NaiveTime::from_hms_opt(1, 0, 0).unwrap());
            Local
                .from_local_datetime(&one_am)
                .unwrap()
                .with_timezone(&Utc)
        }
    }
}

/// Calculates day boundaries (today 00:00 to tomorrow 00:00 local time).
fn day_bounds(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let tomorrow = today + chrono::Duration::days(1);

    let start = local_midnight_to_utc(today);
    let end = local_midnight_to_utc(tomorrow);
    (start, end)
}

/// Calculates week boundaries (Mon 00:00 to next Mon 00:00 local time) as half-open interval.
fn week_bounds(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_since_monday = today.weekday().num_days_from_monday();
    let monday = today - chrono::Duration::days(i64::from(days_since_monday));
    let next_monday = monday + chrono::Duration::days(7);

    let start = local_midnight_to_utc(monday);
    let end = local_midnight_to_utc(next_monday);
    (start, end)
}

/// Calculates month boundaries (1st 00:00 to 1st of next month 00:00 local time).
fn month_bounds(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap();
    let next_first = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1).unwrap()
    };

    let start = local_midnight_to_utc(first);
    let end = local_midnight_to_utc(next_first);
    (start, end)
}

/// Calculates year boundaries (Jan 1st 00:00 to next Jan 1st 00:00 local time).
fn year_bounds(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap();
    let next_first = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap();

    let start = local_midnight_to_utc(first);
    let end = local_midnight_to_utc(next_first);
    (start, end)
}

/// Get boundaries for a given period, using the provided date as reference.
pub fn period_bounds(period: Period, today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    match period {
        Period::Day => day_bounds(today),
        Period::Week => week_bounds(today),
        Period::Month => month_bounds(today),
        Period::Year => year_bounds(today),
    }
}

// ========== Duration Formatting ==========

/// Formats whole seconds as "H:MM:SS".
///
/// Hours are not zero-padded and carry no upper bound; minutes and
/// seconds are always two digits. Sub-second remainders are expected
/// to be truncated by the caller before formatting.
pub fn format_duration(total_secs: i64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

// ========== Report Generation ==========

/// A finished tracking entry, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedEntry {
    pub sheet: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub note: String,
}

/// One display row of a sheet report. All cells are pre-formatted in
/// local time; `day` is empty when the previous row falls on the same
/// local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub day: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub note: String,
}

/// All rows for one sheet, plus the exact summed duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    pub sheet: String,
    pub rows: Vec<ReportRow>,
    pub total: chrono::Duration,
}

fn display_row(entry: &ClosedEntry, day: String, duration: chrono::Duration) -> ReportRow {
    ReportRow {
        day,
        start: entry
            .started_at
            .with_timezone(&Local)
            .format(TIME_FORMAT)
            .to_string(),
        end: entry
            .ended_at
            .with_timezone(&Local)
            .format(TIME_FORMAT)
            .to_string(),
        duration: format_duration(duration.num_seconds()),
        note: entry.note.clone(),
    }
}

/// Groups closed entries into per-sheet reports in order of first
/// appearance, keeping the entries' relative order within each sheet.
///
/// The day label is only emitted on the first row of a contiguous run
/// of rows on the same local day; a later return to that day prints the
/// label again. Totals are summed exactly and truncated to whole
/// seconds only when formatted.
pub fn build_report(entries: &[ClosedEntry]) -> Result<Vec<SheetReport>, ReportError> {
    let mut reports: Vec<SheetReport> = Vec::new();
    // (sheet, local day) of the previous row, for label suppression
    let mut prev_day: Option<(String, String)> = None;

    for entry in entries {
        let duration = entry.ended_at.signed_duration_since(entry.started_at);
        if duration < chrono::Duration::zero() {
            return Err(ReportError::NegativeDuration {
                sheet: entry.sheet.clone(),
                started_at: entry.started_at,
            });
        }

        let day = entry
            .started_at
            .with_timezone(&Local)
            .format(DAY_FORMAT)
            .to_string();
        let suppressed = prev_day
            .as_ref()
            .is_some_and(|(sheet, prev)| *sheet == entry.sheet && *prev == day);
        let label = if suppressed { String::new() } else { day.clone() };
        prev_day = Some((entry.sheet.clone(), day));

        match reports.iter_mut().find(|report| report.sheet == entry.sheet) {
            Some(report) => {
                report.rows.push(display_row(entry, label, duration));
                report.total += duration;
            }
            None => reports.push(SheetReport {
                sheet: entry.sheet.clone(),
                rows: vec![display_row(entry, label, duration)],
                total: duration,
            }),
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ========== Period Parsing Tests ==========

    #[test]
    fn test_period_parses_known_values() {
        assert_eq!("day".parse::<Period>().unwrap(), Period::Day);
        assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("month".parse::<Period>().unwrap(), Period::Month);
        assert_eq!("year".parse::<Period>().unwrap(), Period::Year);
    }

    #[test]
    fn test_period_rejects_unknown_values() {
        let err = "fortnight".parse::<Period>().unwrap_err();
        assert_eq!(
            err,
            ReportError::InvalidPeriod {
                value: "fortnight".to_string()
            }
        );
        assert!("Day".parse::<Period>().is_err());
        assert!("".parse::<Period>().is_err());
    }

    // ========== Period Date Calculation Tests ==========

    #[test]
    fn test_day_bounds_for_known_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let (start, end) = period_bounds(Period::Day, date);

        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2024, 6, 13).unwrap());
    }

    #[test]
    fn test_week_bounds_for_known_date() {
        // Jun 12, 2024 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let (start, end) = period_bounds(Period::Week, wednesday);

        // Week should be Jun 10 (Mon) to Jun 17 (Mon) in local time
        // Convert back to local to verify dates
        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
    }

    #[test]
    fn test_week_bounds_on_monday() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let (start, end) = period_bounds(Period::Week, monday);

        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
    }

    #[test]
    fn test_week_bounds_on_sunday() {
        // Sunday belongs to the week that started the previous Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        let (start, end) = period_bounds(Period::Week, sunday);

        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
    }

    #[test]
    fn test_month_bounds_for_known_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let (start, end) = period_bounds(Period::Month, date);

        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_in_december() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let (start, end) = period_bounds(Period::Month, date);

        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_year_bounds_for_known_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let (start, end) = period_bounds(Period::Year, date);

        let start_local = start.with_timezone(&Local).date_naive();
        let end_local = end.with_timezone(&Local).date_naive();

        assert_eq!(start_local, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end_local, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    // ========== Duration Formatting Tests ==========

    #[test]
    fn test_format_duration_hours_minutes_seconds() {
        assert_eq!(format_duration(3661), "1:01:01");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(5400), "1:30:00");
    }

    #[test]
    fn test_format_duration_under_an_hour() {
        assert_eq!(format_duration(59), "0:00:59");
        assert_eq!(format_duration(60), "0:01:00");
        assert_eq!(format_duration(0), "0:00:00");
    }

    #[test]
    fn test_format_duration_hours_are_unbounded() {
        assert_eq!(format_duration(86_400), "24:00:00");
        assert_eq!(format_duration(360_061), "100:01:01");
    }

    // ========== Report Generation Tests ==========

    fn entry(sheet: &str, started_at: DateTime<Utc>, secs: i64, note: &str) -> ClosedEntry {
        ClosedEntry {
            sheet: sheet.to_string(),
            started_at,
            ended_at: started_at + chrono::Duration::seconds(secs),
            note: note.to_string(),
        }
    }

    fn local_day(at: DateTime<Utc>) -> String {
        at.with_timezone(&Local).format(DAY_FORMAT).to_string()
    }

    #[test]
    fn test_build_report_empty() {
        assert_eq!(build_report(&[]).unwrap(), vec![]);
    }

    #[test]
    fn test_build_report_groups_by_sheet() {
        // Entries a minute apart stay on the same local day in every
        // timezone, which keeps the label expectations deterministic.
        let base = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        let entries = vec![
            entry("alpha", base, 1800, "standup"),
            entry("alpha", base + chrono::Duration::minutes(1), 2700, "review"),
            entry("beta", base + chrono::Duration::minutes(2), 60, "email"),
        ];

        let reports = build_report(&entries).unwrap();
        assert_eq!(reports.len(), 2);

        let alpha = &reports[0];
        assert_eq!(alpha.sheet, "alpha");
        assert_eq!(alpha.rows.len(), 2);
        assert_eq!(alpha.rows[0].day, local_day(base));
        assert_eq!(alpha.rows[0].duration, "0:30:00");
        assert_eq!(alpha.rows[0].note, "standup");
        // Same local day as the row above: label suppressed
        assert_eq!(alpha.rows[1].day, "");
        assert_eq!(alpha.rows[1].duration, "0:45:00");
        assert_eq!(alpha.total, chrono::Duration::seconds(4500));

        let beta = &reports[1];
        assert_eq!(beta.sheet, "beta");
        // A new sheet always starts with a day label, even on the same day
        assert_eq!(beta.rows[0].day, local_day(entries[2].started_at));
        assert_eq!(beta.total, chrono::Duration::seconds(60));
    }

    #[test]
    fn test_build_report_merges_interleaved_sheets() {
        let base = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        let entries = vec![
            entry("alpha", base, 600, "a"),
            entry("beta", base + chrono::Duration::minutes(1), 60, "b"),
            entry("alpha", base + chrono::Duration::minutes(2), 300, "c"),
        ];

        let reports = build_report(&entries).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].sheet, "alpha");
        assert_eq!(reports[0].rows.len(), 2);
        assert_eq!(reports[0].total, chrono::Duration::seconds(900));
        // The run of same-day rows was broken by the beta entry, so the
        // second alpha row carries the label again
        assert_eq!(reports[0].rows[1].day, local_day(entries[2].started_at));
        assert_eq!(reports[1].sheet, "beta");
        assert_eq!(reports[1].rows.len(), 1);
    }

    #[test]
    fn test_build_report_reprints_day_after_gap() {
        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 10, 0, 0).unwrap();
        // 48 hours later is a different local day in every timezone
        let wednesday = monday + chrono::Duration::hours(48);
        let entries = vec![
            entry("alpha", monday, 600, "a"),
            entry("alpha", wednesday, 600, "b"),
            entry("alpha", wednesday + chrono::Duration::minutes(1), 600, "c"),
        ];

        let reports = build_report(&entries).unwrap();
        assert_eq!(reports.len(), 1);
        let rows = &reports[0].rows;
        assert_eq!(rows[0].day, local_day(monday));
        assert_eq!(rows[1].day, local_day(wednesday));
        assert_eq!(rows[2].day, "");
    }

    #[test]
    fn test_build_report_start_and_end_are_local_clock_times() {
        let base = Utc.with_ymd_and_hms(2024, 6, 12, 9, 15, 30).unwrap();
        let entries = vec![entry("alpha", base, 45, "short")];

        let reports = build_report(&entries).unwrap();
        let row = &reports[0].rows[0];
        let local_start = base.with_timezone(&Local);
        assert_eq!(row.start, local_start.format("%H:%M:%S").to_string());
        assert_eq!(
            row.end,
            (local_start + chrono::Duration::seconds(45))
                .format("%H:%M:%S")
                .to_string()
        );
        assert_eq!(row.duration, "0:00:45");
    }

    #[test]
    fn test_build_report_total_sums_before_truncating() {
        let base = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        let sub_second = |offset_secs: i64| ClosedEntry {
            sheet: "alpha".to_string(),
            started_at: base + chrono::Duration::seconds(offset_secs),
            ended_at: base
                + chrono::Duration::seconds(offset_secs)
                + chrono::Duration::milliseconds(600),
            note: String::new(),
        };
        let entries = vec![sub_second(0), sub_second(10)];

        let reports = build_report(&entries).unwrap();
        let report = &reports[0];
        // Each row truncates to zero seconds on its own...
        assert_eq!(report.rows[0].duration, "0:00:00");
        assert_eq!(report.rows[1].duration, "0:00:00");
        // ...but the exact total carries the sub-second remainders
        assert_eq!(format_duration(report.total.num_seconds()), "0:00:01");
    }

    #[test]
    fn test_build_report_rejects_negative_duration() {
        let base = Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap();
        let backwards = ClosedEntry {
            sheet: "alpha".to_string(),
            started_at: base,
            ended_at: base - chrono::Duration::seconds(1),
            note: String::new(),
        };

        let err = build_report(&[backwards]).unwrap_err();
        assert_eq!(
            err,
            ReportError::NegativeDuration {
                sheet: "alpha".to_string(),
                started_at: base,
            }
        );
    }
}
