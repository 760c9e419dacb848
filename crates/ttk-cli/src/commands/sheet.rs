//! Sheet command for creating and switching tracking sheets.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use chrono::Utc;

use ttk_core::SheetName;
use ttk_db::{Database, SheetSelection};

use crate::prompt;

pub fn run<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    db: &mut Database,
    name: Option<&SheetName>,
) -> Result<()> {
    let name = match name {
        Some(name) => name.clone(),
        None => choose_sheet(reader, writer, db)?,
    };

    match db.select_or_create_sheet(&name, Utc::now())? {
        SheetSelection::Created => {
            writeln!(writer, "Created and switched to sheet: {name}")?;
        }
        SheetSelection::Switched => {
            writeln!(writer, "Switched to sheet: {name}")?;
        }
    }

    Ok(())
}

/// Presents a numbered menu over the existing sheets.
fn choose_sheet<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    db: &Database,
) -> Result<SheetName> {
    let sheets = db.list_sheets()?;
    if sheets.is_empty() {
        bail!("no sheets exist yet, run 'ttk sheet <name>' to create one");
    }

    let names: Vec<String> = sheets.into_iter().map(|sheet| sheet.name).collect();
    let chosen = prompt::select_from(reader, writer, "Select a sheet", &names)?;
    Ok(SheetName::new(chosen)?)
}
