//! Import command for pulling closed entries from the companion API.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use ttk_client::{Client, RemoteEntry};
use ttk_core::SheetName;
use ttk_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, url: &str) -> Result<()> {
    let client = Client::new(url)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let response = runtime
        .block_on(client.unimported_entries())
        .context("failed to fetch unimported entries")?;
    let fetched = response.entries.len();
    tracing::debug!(total = response.total, fetched, "fetched unimported entries");

    let (imported_ids, failure) = persist_entries(db, &response.entries, Utc::now());

    // Acknowledge what was persisted even when the batch failed part
    // way through, so the source does not resend those entries.
    let mut mark_error = None;
    if !imported_ids.is_empty() {
        match runtime.block_on(client.mark_imported(&imported_ids)) {
            Ok(marked) => tracing::debug!(
                imported_count = marked.imported_count,
                remaining_count = marked.remaining_count,
                "acknowledged imported entries"
            ),
            Err(err) => mark_error = Some(err),
        }
    }

    writeln!(
        writer,
        "Successfully imported {} of {} entries.",
        imported_ids.len(),
        fetched
    )?;

    if let Some((id, err)) = failure {
        return Err(err.context(format!("failed to import entry {id}")));
    }
    if let Some(err) = mark_error {
        return Err(anyhow::Error::new(err).context("failed to mark entries as imported"));
    }
    Ok(())
}

/// Persists fetched entries one at a time, stopping at the first
/// failure without undoing earlier inserts. Returns the external IDs
/// that were persisted and the failure that ended the batch, if any.
fn persist_entries(
    db: &mut Database,
    entries: &[RemoteEntry],
    imported_at: DateTime<Utc>,
) -> (Vec<i64>, Option<(i64, anyhow::Error)>) {
    let mut imported_ids = Vec::new();
    for entry in entries {
        let persisted = SheetName::new(&entry.sheet)
            .map_err(anyhow::Error::new)
            .and_then(|sheet| {
                db.insert_closed_entry(
                    &sheet,
                    entry.start_time,
                    entry.ended_at(),
                    &entry.note,
                    imported_at,
                )
                .map_err(anyhow::Error::new)
            });
        if let Err(err) = persisted {
            return (imported_ids, Some((entry.id, err)));
        }
        imported_ids.push(entry.id);
    }
    (imported_ids, None)
}
