use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use super::column::Column;

/// One configured event day and the columns that hold its attendance.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EventDay {
    pub date: NaiveDate,
    pub status_column: Column,
    pub timestamp_column: Column,
}

/// The set of event days plus the fixed UTC offset used to decide which
/// calendar day "now" falls on. No DST or zone database is involved.
#[derive(Debug, Clone)]
pub struct EventCalendar {
    offset: FixedOffset,
    days: Vec<EventDay>,
}

impl EventCalendar {
    pub fn new(offset: FixedOffset, days: Vec<EventDay>) -> Self {
        Self { offset, days }
    }

    /// Builds the offset from whole hours, e.g. `-5` for UTC-05:00.
    pub fn with_offset_hours(hours: i32, days: Vec<EventDay>) -> Option<Self> {
        let offset = FixedOffset::east_opt(hours.checked_mul(3600)?)?;
        Some(Self::new(offset, days))
    }

    pub fn days(&self) -> &[EventDay] {
        &self.days
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_time(now).date_naive()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&EventDay> {
        self.days.iter().find(|d| d.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn calendar() -> EventCalendar {
        let day = EventDay {
            date: NaiveDate::from_ymd_opt(2025, 5, 28).unwrap(),
            status_column: "H".parse().unwrap(),
            timestamp_column: "I".parse().unwrap(),
        };
        EventCalendar::with_offset_hours(-5, vec![day]).unwrap()
    }

    #[test]
    fn early_utc_morning_is_previous_local_day() {
        let cal = calendar();
        let now = Utc.with_ymd_and_hms(2025, 5, 29, 3, 30, 0).unwrap();
        assert_eq!(cal.local_date(now), NaiveDate::from_ymd_opt(2025, 5, 28).unwrap());
        assert!(cal.day(cal.local_date(now)).is_some());
    }

    #[test]
    fn unknown_date_has_no_day() {
        let cal = calendar();
        let now = Utc.with_ymd_and_hms(2025, 5, 29, 12, 0, 0).unwrap();
        assert!(cal.day(cal.local_date(now)).is_none());
    }

    #[test]
    fn rejects_out_of_range_offset() {
        assert!(EventCalendar::with_offset_hours(30, vec![]).is_none());
    }
}
