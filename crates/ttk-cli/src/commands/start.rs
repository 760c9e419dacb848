//! Start command for opening a new tracking entry.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;

use ttk_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, note: Option<&str>) -> Result<()> {
    db.start_entry(Utc::now(), note.unwrap_or_default())?;
    writeln!(writer, "Started tracking time...")?;
    Ok(())
}
