//! Display command for rendering period reports.

use std::io::Write;

use anyhow::Result;
use chrono::Local;

use ttk_core::{Period, build_report, format_duration, period_bounds};
use ttk_db::Database;

use crate::render;

const HEADERS: [&str; 5] = ["Day", "Start", "End", "Duration", "Notes"];

pub fn run<W: Write>(writer: &mut W, db: &Database, period: &str) -> Result<()> {
    let period: Period = period.parse()?;
    let (start, end) = period_bounds(period, Local::now().date_naive());
    let entries = db.closed_entries_in_range(start, end)?;
    let reports = build_report(&entries)?;

    if reports.is_empty() {
        writeln!(writer, "No entries recorded this {}.", period.as_str())?;
        return Ok(());
    }

    for report in reports {
        writeln!(writer, "Sheet - {}", report.sheet)?;

        let rows: Vec<Vec<String>> = report
            .rows
            .into_iter()
            .map(|row| vec![row.day, row.start, row.end, row.duration, row.note])
            .collect();
        let footer = vec![
            String::new(),
            String::new(),
            "Total:".to_string(),
            format_duration(report.total.num_seconds()),
            String::new(),
        ];
        write!(writer, "{}", render::render_table(&HEADERS, &rows, &footer))?;

        writeln!(writer)?;
        writeln!(writer)?;
    }

    Ok(())
}
