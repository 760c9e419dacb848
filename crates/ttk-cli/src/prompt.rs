//! Line-oriented interactive prompts.
//!
//! Prompts read from and write to generic handles so tests can drive them
//! with in-memory buffers instead of a live terminal.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};

/// Prompts for a free-text note.
///
/// Returns an empty string when the user just presses Enter or input is
/// exhausted.
pub fn read_note<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> Result<String> {
    write!(writer, "Enter a note (press Enter to skip): ")?;
    writer.flush()?;

    let mut line = String::new();
    reader.read_line(&mut line).context("failed to read note")?;
    Ok(line.trim().to_string())
}

/// Displays a numbered menu over `options` and returns the chosen one.
///
/// Re-prompts on anything that is not a number between 1 and the option
/// count; fails when input ends before a valid selection is made.
pub fn select_from<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    title: &str,
    options: &[String],
) -> Result<String> {
    writeln!(writer, "{title}")?;
    writeln!(writer)?;
    for (i, option) in options.iter().enumerate() {
        writeln!(writer, "{}. {option}", i + 1)?;
    }
    writeln!(writer)?;
    write!(writer, "Select an option (1-{}): ", options.len())?;
    writer.flush()?;

    loop {
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .context("failed to read selection")?;
        if read == 0 {
            bail!("selection aborted: reached end of input");
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=options.len()).contains(&choice) => {
                return Ok(options[choice - 1].clone());
            }
            _ => {
                write!(
                    writer,
                    "Invalid selection, enter a number between 1 and {}: ",
                    options.len()
                )?;
                writer.flush()?;
            }
        }
    }
}
