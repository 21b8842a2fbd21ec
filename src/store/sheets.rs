use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{RecordStore, RetryPolicy, RowHandle, StoreError};
use crate::auth::jwt::fetch_access_token;
use crate::auth::service_account::ServiceAccount;
use crate::model::column::Column;

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Sessions are dropped this long before their access token expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);
const MIN_SESSION_TTL: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Base URLs of the two Google APIs in use.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    pub sheets: String,
    pub drive_files: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            sheets: SHEETS_API.to_string(),
            drive_files: DRIVE_FILES_API.to_string(),
        }
    }
}

/// Which worksheet of which spreadsheet holds the attendance rows.
#[derive(Debug, Clone)]
pub struct SheetTarget {
    pub spreadsheet_name: String,
    /// Skips the Drive lookup by title when set.
    pub spreadsheet_id: Option<String>,
    pub worksheet: String,
    pub endpoints: ApiEndpoints,
}

impl SheetTarget {
    fn range(&self, a1: &str) -> String {
        format!("'{}'!{}", self.worksheet.replace('\'', "''"), a1)
    }
}

#[derive(Clone)]
struct Session {
    token: String,
    spreadsheet_id: String,
    ttl: Duration,
}

/// Expires each session together with the token it carries.
struct SessionExpiry;

impl Expiry<(), Session> for SessionExpiry {
    fn expire_after_create(
        &self,
        _key: &(),
        session: &Session,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(session.ttl)
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

/// Google Sheets backed record store.
///
/// A session (access token plus resolved spreadsheet id) is acquired on
/// demand under the retry policy and shared by concurrent requests until it
/// expires or the API answers `401`.
pub struct SheetsStore {
    client: Client,
    account: ServiceAccount,
    target: SheetTarget,
    retry: RetryPolicy,
    sessions: Cache<(), Session>,
}

impl SheetsStore {
    pub fn new(
        account: ServiceAccount,
        target: SheetTarget,
        retry: RetryPolicy,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            account,
            target,
            retry,
            sessions: Cache::builder()
                .max_capacity(1)
                .expire_after(SessionExpiry)
                .build(),
        })
    }

    async fn session(&self) -> Result<Session, StoreError> {
        self.sessions
            .try_get_with((), self.connect())
            .await
            .map_err(|e| StoreError::Unavailable {
                attempts: self.retry.attempts(),
                reason: e.to_string(),
            })
    }

    async fn connect(&self) -> Result<Session, StoreError> {
        self.retry
            .run("sheets connection", || self.connect_once())
            .await
    }

    async fn connect_once(&self) -> Result<Session, StoreError> {
        let token = fetch_access_token(&self.client, &self.account).await?;

        let spreadsheet_id = match &self.target.spreadsheet_id {
            Some(id) => id.clone(),
            None => self.resolve_spreadsheet_id(&token.token).await?,
        };

        info!(
            spreadsheet_id = %spreadsheet_id,
            worksheet = %self.target.worksheet,
            "Connected to attendance sheet"
        );

        let ttl = token
            .expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN)
            .max(MIN_SESSION_TTL);

        Ok(Session {
            token: token.token,
            spreadsheet_id,
            ttl,
        })
    }

    async fn resolve_spreadsheet_id(&self, token: &str) -> Result<String, StoreError> {
        let name = self
            .target
            .spreadsheet_name
            .replace('\\', "\\\\")
            .replace('\'', "\\'");
        let query = format!("name = '{name}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false");

        let resp = self
            .client
            .get(&self.target.endpoints.drive_files)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        let list: FileList = self.checked(resp).await?.json().await?;
        if list.files.len() > 1 {
            warn!(
                spreadsheet = %self.target.spreadsheet_name,
                matches = list.files.len(),
                "Several spreadsheets share this name, using the first"
            );
        }

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| StoreError::Api {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("spreadsheet `{}` not found", self.target.spreadsheet_name),
            })
    }

    fn values_url(&self, session: &Session, range: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.target.endpoints.sheets)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Decode("sheets API base is not a hierarchical URL".into()))?
            .extend([session.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn get_values(&self, a1: &str, major: &str) -> Result<Vec<Vec<Value>>, StoreError> {
        let session = self.session().await?;
        let range = self.target.range(a1);
        debug!(range = %range, "Reading sheet values");

        let resp = self
            .client
            .get(self.values_url(&session, &range)?)
            .bearer_auth(&session.token)
            .query(&[("majorDimension", major)])
            .send()
            .await?;

        let body: ValueRange = self.checked(resp).await?.json().await?;
        Ok(body.values)
    }

    /// Maps non-2xx answers to `StoreError::Api`, dropping the cached
    /// session on `401` so the next call reconnects.
    async fn checked(&self, resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.sessions.invalidate(&()).await;
        }

        let message = resp.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn find_row(&self, column: Column, key: &str) -> Result<Option<RowHandle>, StoreError> {
        let a1 = format!("{column}:{column}");
        let columns = self.get_values(&a1, "COLUMNS").await?;
        let cells = columns.into_iter().next().unwrap_or_default();

        let mut matches = cells
            .iter()
            .enumerate()
            .filter(|(_, v)| cell_text(v).trim() == key)
            .map(|(i, _)| i as u32 + 1);

        let first = matches.next();
        if let Some(extra) = matches.next() {
            warn!(cedula = %key, first = ?first, duplicate = extra, "Identifier appears in more than one row");
        }

        Ok(first.and_then(RowHandle::new))
    }

    async fn read_cell(&self, row: RowHandle, column: Column) -> Result<String, StoreError> {
        let values = self.get_values(&column.cell(row.number()), "ROWS").await?;
        Ok(values
            .first()
            .and_then(|r| r.first())
            .map(cell_text)
            .unwrap_or_default())
    }

    async fn write_cell(
        &self,
        row: RowHandle,
        column: Column,
        value: &str,
    ) -> Result<(), StoreError> {
        let session = self.session().await?;
        let range = self.target.range(&column.cell(row.number()));
        debug!(range = %range, "Writing sheet cell");

        let resp = self
            .client
            .put(self.values_url(&session, &range)?)
            .bearer_auth(&session.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await?;

        self.checked(resp).await?;
        Ok(())
    }
}
