//! Policy applied when an open tracking entry is stopped.

/// Outcome of resolving the note to store when stopping an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopNote {
    /// The note to write on the closed entry.
    Resolved(String),
    /// Neither the entry nor the caller supplied a note; ask the user.
    NeedsPrompt,
}

/// Decides which note ends up on a stopped entry.
///
/// A note already stored on the open entry wins over anything supplied
/// at stop time. If the stored note is empty, a non-empty supplied note
/// replaces it. When both are empty the caller must prompt; an empty
/// prompt answer then closes the entry with an empty note.
pub fn resolve_stop_note(stored: &str, supplied: Option<&str>) -> StopNote {
    if !stored.is_empty() {
        return StopNote::Resolved(stored.to_string());
    }
    match supplied {
        Some(note) if !note.is_empty() => StopNote::Resolved(note.to_string()),
        _ => StopNote::NeedsPrompt,
    }
}
