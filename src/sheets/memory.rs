use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{SheetError, SheetRow, Workbook};

/// Workbook held in memory, used by tests and as a fixture
pub struct InMemoryWorkbook {
    id: String,
    sheets: Mutex<HashMap<String, Vec<SheetRow>>>,
}

impl InMemoryWorkbook {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            sheets: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of a sheet, header included. Empty when the sheet is missing.
    pub async fn rows(&self, name: &str) -> Vec<SheetRow> {
        self.sheets.lock().await.get(name).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Workbook for InMemoryWorkbook {
    fn id(&self) -> &str {
        &self.id
    }

    async fn has_sheet(&self, name: &str) -> Result<bool> {
        Ok(self.sheets.lock().await.contains_key(name))
    }

    async fn insert_sheet(&self, name: &str) -> Result<()> {
        self.sheets.lock().await.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn clear_contents(&self, name: &str) -> Result<()> {
        let mut sheets = self.sheets.lock().await;
        let rows = sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?;
        rows.clear();
        Ok(())
    }

    async fn set_values(&self, name: &str, start_row: usize, rows: &[SheetRow]) -> Result<()> {
        let mut sheets = self.sheets.lock().await;
        let sheet = sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?;

        write_rows(sheet, start_row, rows);
        Ok(())
    }

    async fn last_row(&self, name: &str) -> Result<usize> {
        let sheets = self.sheets.lock().await;
        let sheet = sheets
            .get(name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?;
        Ok(last_non_empty_row(sheet))
    }
}

pub(crate) fn last_non_empty_row<T>(sheet: &[Vec<T>]) -> usize {
    sheet.iter().rposition(|row| !row.is_empty()).map_or(0, |index| index + 1)
}

/// Overwrite `rows` into `sheet` from 1-based `start_row`, padding gaps with empty rows
pub(crate) fn write_rows<T: Clone>(sheet: &mut Vec<Vec<T>>, start_row: usize, rows: &[Vec<T>]) {
    let offset = start_row.saturating_sub(1);
    if sheet.len() < offset {
        sheet.resize(offset, Vec::new());
    }

    for (index, row) in rows.iter().enumerate() {
        let target = offset + index;
        if target < sheet.len() {
            sheet[target] = row.clone();
        } else {
            sheet.push(row.clone());
        }
    }
}
