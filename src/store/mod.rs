pub mod memory;
pub mod retry;
pub mod sheets;

use async_trait::async_trait;

use crate::auth::jwt::TokenError;
use crate::model::column::Column;

pub use memory::MemoryStore;
pub use retry::RetryPolicy;
pub use sheets::{ApiEndpoints, SheetTarget, SheetsStore};

/// 1-based row number inside the worksheet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RowHandle(u32);

impl RowHandle {
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(RowHandle(number))
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("record store unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: u32, reason: String },

    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("record store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected record store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Failures to obtain a usable connection, as opposed to faults on an
    /// established one.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            StoreError::Token(_) | StoreError::Unavailable { .. }
        )
    }
}

/// Tabular source of attendance rows. All cell values are strings.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Row whose `column` cell equals `key` exactly (after trimming the cell).
    async fn find_row(&self, column: Column, key: &str) -> Result<Option<RowHandle>, StoreError>;

    /// Empty string for blank or missing cells.
    async fn read_cell(&self, row: RowHandle, column: Column) -> Result<String, StoreError>;

    async fn write_cell(&self, row: RowHandle, column: Column, value: &str)
    -> Result<(), StoreError>;
}
