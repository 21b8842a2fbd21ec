use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail, ensure};
use chrono::NaiveDate;
use dotenvy::dotenv;

use crate::model::column::Column;
use crate::model::event_day::{EventCalendar, EventDay};
use crate::registrar::SheetLayout;
use crate::store::{ApiEndpoints, RetryPolicy, SheetTarget};

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub log_dir: String,

    /// Inline service-account JSON or a path to it.
    pub credentials: String,
    pub spreadsheet_name: String,
    pub spreadsheet_id: Option<String>,
    pub worksheet_name: String,

    pub id_column: Column,
    pub name_column: Column,
    pub event_days: Vec<EventDay>,
    pub utc_offset_hours: i32,

    // Rate limiting
    pub rate_register_per_min: u32,

    // Connection retries
    pub store_retry_attempts: u32,
    pub store_retry_base_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, `from_env` being the usual one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            server_addr: or("SERVER_ADDR", "0.0.0.0:5000"),
            log_dir: or("LOG_DIR", "logs"),

            credentials: lookup("GOOGLE_APPLICATION_CREDENTIALS")
                .context("GOOGLE_APPLICATION_CREDENTIALS must be set")?,
            spreadsheet_name: or("SPREADSHEET_NAME", "ASISTENCIA - JIISBU 2025"),
            spreadsheet_id: lookup("SPREADSHEET_ID").filter(|s| !s.trim().is_empty()),
            worksheet_name: or("WORKSHEET_NAME", "ASISTENTES"),

            id_column: parse("ID_COLUMN", &or("ID_COLUMN", "D"))?,
            name_column: parse("NAME_COLUMN", &or("NAME_COLUMN", "B"))?,
            event_days: parse_event_days(
                &lookup("EVENT_DAYS").context("EVENT_DAYS must be set")?,
            )?,
            utc_offset_hours: parse("UTC_OFFSET_HOURS", &or("UTC_OFFSET_HOURS", "-5"))?,

            rate_register_per_min: parse(
                "RATE_REGISTER_PER_MIN",
                &or("RATE_REGISTER_PER_MIN", "120"),
            )?,

            store_retry_attempts: parse("STORE_RETRY_ATTEMPTS", &or("STORE_RETRY_ATTEMPTS", "3"))?,
            store_retry_base_ms: parse("STORE_RETRY_BASE_MS", &or("STORE_RETRY_BASE_MS", "500"))?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.rate_register_per_min >= 1, "RATE_REGISTER_PER_MIN must be at least 1");
        ensure!(self.store_retry_attempts >= 1, "STORE_RETRY_ATTEMPTS must be at least 1");
        ensure!(
            self.id_column != self.name_column,
            "ID_COLUMN and NAME_COLUMN must differ"
        );
        if self.calendar().is_none() {
            bail!("UTC_OFFSET_HOURS {} is out of range", self.utc_offset_hours);
        }

        let mut used: HashSet<Column> = [self.id_column, self.name_column].into_iter().collect();
        for day in &self.event_days {
            for column in [day.status_column, day.timestamp_column] {
                ensure!(
                    used.insert(column),
                    "column {column} of event day {} is already in use",
                    day.date
                );
            }
        }
        Ok(())
    }

    pub fn calendar(&self) -> Option<EventCalendar> {
        EventCalendar::with_offset_hours(self.utc_offset_hours, self.event_days.clone())
    }

    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            id_column: self.id_column,
            name_column: self.name_column,
        }
    }

    pub fn sheet_target(&self) -> SheetTarget {
        SheetTarget {
            spreadsheet_name: self.spreadsheet_name.clone(),
            spreadsheet_id: self.spreadsheet_id.clone(),
            worksheet: self.worksheet_name.clone(),
            endpoints: ApiEndpoints::default(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.store_retry_attempts,
            Duration::from_millis(self.store_retry_base_ms),
        )
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key} value `{raw}`: {e}"))
}

/// Parses `2025-05-27=H:I,2025-05-28=J:K` (status column, then timestamp
/// column for each date).
pub fn parse_event_days(raw: &str) -> Result<Vec<EventDay>> {
    let mut days: Vec<EventDay> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (date, columns) = entry
            .split_once('=')
            .with_context(|| format!("event day `{entry}` must look like YYYY-MM-DD=STATUS:TIMESTAMP"))?;
        let (status, timestamp) = columns
            .split_once(':')
            .with_context(|| format!("event day `{entry}` needs STATUS:TIMESTAMP columns"))?;

        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date in event day `{entry}`"))?;
        ensure!(
            days.iter().all(|d| d.date != date),
            "event day {date} is configured twice"
        );

        days.push(EventDay {
            date,
            status_column: status.parse()?,
            timestamp_column: timestamp.parse()?,
        });
    }

    ensure!(!days.is_empty(), "EVENT_DAYS must list at least one day");
    Ok(days)
}
