use std::sync::Mutex;

use async_trait::async_trait;

use super::{RecordStore, RowHandle, StoreError};
use crate::model::column::Column;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub row: u32,
    pub column: Column,
    pub value: String,
}

#[derive(Default)]
struct Sheet {
    rows: Vec<Vec<String>>,
    writes: Vec<CellWrite>,
    unavailable: bool,
}

/// Worksheet kept in process memory. Every write is journaled so callers
/// can see exactly what a registration touched.
#[derive(Default)]
pub struct MemoryStore {
    sheet: Mutex<Sheet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a cell without journaling it as a write.
    pub fn set_cell(&self, row: u32, column: Column, value: impl Into<String>) {
        let mut sheet = self.sheet.lock().expect("memory store poisoned");
        put(&mut sheet.rows, row, column, value.into());
    }

    pub fn cell(&self, row: u32, column: Column) -> String {
        let sheet = self.sheet.lock().expect("memory store poisoned");
        get(&sheet.rows, row, column)
    }

    pub fn writes(&self) -> Vec<CellWrite> {
        self.sheet.lock().expect("memory store poisoned").writes.clone()
    }

    /// While set, every operation fails like a lost connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.sheet.lock().expect("memory store poisoned").unavailable = unavailable;
    }

    fn check(sheet: &Sheet) -> Result<(), StoreError> {
        if sheet.unavailable {
            return Err(StoreError::Unavailable {
                attempts: 1,
                reason: "memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn get(rows: &[Vec<String>], row: u32, column: Column) -> String {
    rows.get(row as usize - 1)
        .and_then(|r| r.get(column.index() as usize - 1))
        .cloned()
        .unwrap_or_default()
}

fn put(rows: &mut Vec<Vec<String>>, row: u32, column: Column, value: String) {
    let (r, c) = (row as usize - 1, column.index() as usize - 1);
    if rows.len() <= r {
        rows.resize_with(r + 1, Vec::new);
    }
    let cells = &mut rows[r];
    if cells.len() <= c {
        cells.resize(c + 1, String::new());
    }
    cells[c] = value;
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_row(&self, column: Column, key: &str) -> Result<Option<RowHandle>, StoreError> {
        let sheet = self.sheet.lock().expect("memory store poisoned");
        Self::check(&sheet)?;

        let idx = column.index() as usize - 1;
        let found = sheet
            .rows
            .iter()
            .position(|cells| cells.get(idx).is_some_and(|v| v.trim() == key));

        Ok(found.and_then(|i| RowHandle::new(i as u32 + 1)))
    }

    async fn read_cell(&self, row: RowHandle, column: Column) -> Result<String, StoreError> {
        let sheet = self.sheet.lock().expect("memory store poisoned");
        Self::check(&sheet)?;
        Ok(get(&sheet.rows, row.number(), column))
    }

    async fn write_cell(
        &self,
        row: RowHandle,
        column: Column,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut sheet = self.sheet.lock().expect("memory store poisoned");
        Self::check(&sheet)?;

        put(&mut sheet.rows, row.number(), column, value.to_string());
        sheet.writes.push(CellWrite {
            row: row.number(),
            column,
            value: value.to_string(),
        });
        Ok(())
    }
}
