//! Core domain logic for the ttk time tracker.
//!
//! This crate is storage- and transport-agnostic: it defines the validated
//! identifier type for sheets, the note-resolution policy applied when a
//! tracking entry is stopped, and the reporting layer that turns closed
//! entries into per-sheet display tables.

pub mod report;
pub mod track;
pub mod types;

pub use report::{
    ClosedEntry, Period, ReportError, ReportRow, SheetReport, build_report, format_duration,
    period_bounds,
};
pub use track::{StopNote, resolve_stop_note};
pub use types::{NameError, SheetName};
