//! Stop command for closing the open tracking entry.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Utc;

use ttk_core::{StopNote, resolve_stop_note};
use ttk_db::{Database, StoreError};

use crate::prompt;

pub fn run<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    db: &mut Database,
    note: Option<&str>,
) -> Result<()> {
    // The end time is captured before the prompt can block, so time
    // spent typing a note is not added to the entry.
    let ended_at = Utc::now();

    let entry = db.open_entry()?.ok_or(StoreError::NoOpenEntry)?;
    let note = match resolve_stop_note(&entry.note, note) {
        StopNote::Resolved(note) => note,
        StopNote::NeedsPrompt => prompt::read_note(reader, writer)?,
    };
    db.close_entry(entry.id, ended_at, &note)?;

    writeln!(writer, "Tracking stopped!")?;
    Ok(())
}
