/// Value written to a status cell once the attendee is marked present.
pub const PRESENT_MARK: &str = "✓";

/// Time format stamped next to the status cell.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Per-day attendance state of one row.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttendanceMark {
    Unmarked,
    Present,
}

impl AttendanceMark {
    /// Blank cells are unmarked. Anything else, including marks typed by
    /// hand, counts as present so it is never overwritten.
    pub fn from_cell(value: &str) -> Self {
        if value.trim().is_empty() {
            AttendanceMark::Unmarked
        } else {
            AttendanceMark::Present
        }
    }
}
