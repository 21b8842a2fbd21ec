use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{MISSING_CEDULA, NON_NUMERIC_CEDULA, RegistrationError};
use crate::model::attendance::{AttendanceMark, PRESENT_MARK, TIMESTAMP_FORMAT};
use crate::model::column::Column;
use crate::model::event_day::EventCalendar;
use crate::store::{RecordStore, RowHandle};

/// Fixed columns of the attendee sheet, independent of the event day.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub id_column: Column,
    pub name_column: Column,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub nombre: String,
    pub row: RowHandle,
    pub day: NaiveDate,
    pub timestamp: String,
}

/// Marks attendees present for the current event day.
///
/// Writes only happen after every check passed, and the check-then-write
/// sequence for one identifier is serialized through a per-identifier lock.
pub struct Registrar {
    store: Arc<dyn RecordStore>,
    calendar: EventCalendar,
    layout: SheetLayout,
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl Registrar {
    pub fn new(store: Arc<dyn RecordStore>, calendar: EventCalendar, layout: SheetLayout) -> Self {
        Self {
            store,
            calendar,
            layout,
            // Idle expiry only. A size bound could evict a held mutex and
            // hand a second one out for the same cédula.
            locks: Cache::builder()
                .time_to_idle(Duration::from_secs(600))
                .build(),
        }
    }

    pub async fn register_attendance(
        &self,
        identifier: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Registration, RegistrationError> {
        let cedula = validate_identifier(identifier)?;

        let local = self.calendar.local_time(now);
        let today = local.date_naive();
        let day = self
            .calendar
            .day(today)
            .ok_or(RegistrationError::NotEventDay(today))?;

        let lock = self
            .locks
            .get_with(cedula.to_string(), async { Arc::new(Mutex::new(())) })
            .await;
        let _guard = lock.lock().await;

        let row = self
            .store
            .find_row(self.layout.id_column, cedula)
            .await?
            .ok_or(RegistrationError::NotFound)?;
        debug!(cedula, row = row.number(), "Attendee found");

        let status = self.store.read_cell(row, day.status_column).await?;
        if AttendanceMark::from_cell(&status) == AttendanceMark::Present {
            info!(cedula, row = row.number(), %today, "Attendance already registered");
            return Err(RegistrationError::AlreadyRegistered);
        }

        // Every read happens before the first write.
        let nombre = self
            .store
            .read_cell(row, self.layout.name_column)
            .await?
            .trim()
            .to_string();

        // Status last: until it lands the row still reads as unmarked.
        let timestamp = local.format(TIMESTAMP_FORMAT).to_string();
        self.store
            .write_cell(row, day.timestamp_column, &timestamp)
            .await?;
        self.store
            .write_cell(row, day.status_column, PRESENT_MARK)
            .await?;

        info!(cedula, row = row.number(), %today, %timestamp, "Attendance registered");

        Ok(Registration {
            nombre,
            row,
            day: today,
            timestamp,
        })
    }
}

/// Trimmed identifier, or the first validation failure.
pub fn validate_identifier(identifier: Option<&str>) -> Result<&str, RegistrationError> {
    let cedula = identifier.map(str::trim).unwrap_or_default();

    if cedula.is_empty() {
        return Err(RegistrationError::InvalidInput(MISSING_CEDULA));
    }
    if !cedula.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegistrationError::InvalidInput(NON_NUMERIC_CEDULA));
    }
    Ok(cedula)
}
