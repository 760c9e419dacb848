//! Sheets command for listing tracking sheets.

use std::io::Write;

use anyhow::Result;

use ttk_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let sheets = db.list_sheets()?;

    if sheets.is_empty() {
        writeln!(writer, "No sheets yet.")?;
        writeln!(writer, "Hint: Run 'ttk sheet <name>' to create one.")?;
        return Ok(());
    }

    for sheet in sheets {
        let marker = if sheet.active { "*" } else { " " };
        writeln!(writer, "{marker} {}", sheet.name)?;
    }

    Ok(())
}
