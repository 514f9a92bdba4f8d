//! Tabular destination for the pass results
pub mod csv_workbook;
pub mod memory;
pub mod pg_workbook;
pub mod writer;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::StoreConfig;

pub use csv_workbook::CsvWorkbook;
pub use memory::InMemoryWorkbook;
pub use pg_workbook::PgWorkbook;
pub use writer::{append_rows, reset_table};

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Workbook '{0}' not found")]
    WorkbookNotFound(String),
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),
    #[error("Row {row} has {actual} cells, sheet '{sheet}' expects {expected}")]
    RowWidth {
        sheet: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Single cell written to a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Date(DateTime<Utc>),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Date(date) => write!(f, "{}", date.to_rfc3339()),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Date(value)
    }
}

pub type SheetRow = Vec<CellValue>;

/// Sheet name plus its fixed header row
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub headers: Vec<String>,
}

impl SheetLayout {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn header_row(&self) -> SheetRow {
        self.headers.iter().map(|h| CellValue::Text(h.clone())).collect()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Spreadsheet-like store. Rows are 1-based, row 1 holds the header.
#[async_trait]
pub trait Workbook: Send + Sync {
    fn id(&self) -> &str;

    async fn has_sheet(&self, name: &str) -> Result<bool>;

    async fn insert_sheet(&self, name: &str) -> Result<()>;

    /// Remove every row, keeping the sheet itself
    async fn clear_contents(&self, name: &str) -> Result<()>;

    /// Overwrite rows starting at `start_row`, extending the sheet as needed
    async fn set_values(&self, name: &str, start_row: usize, rows: &[SheetRow]) -> Result<()>;

    /// Index of the last non-empty row, 0 for an empty sheet
    async fn last_row(&self, name: &str) -> Result<usize>;
}

/// Open the configured workbook by id
pub async fn open_workbook(store: &StoreConfig, id: &str) -> Result<Box<dyn Workbook>> {
    match store {
        StoreConfig::Csv { sheets_dir } => Ok(Box::new(CsvWorkbook::open(sheets_dir, id)?)),
        StoreConfig::Postgres(database) => Ok(Box::new(PgWorkbook::open(database, id).await?)),
    }
}

/// Create an empty workbook in the configured store
pub async fn create_workbook(store: &StoreConfig, id: &str) -> Result<()> {
    match store {
        StoreConfig::Csv { sheets_dir } => CsvWorkbook::create(sheets_dir, id).map(|_| ()),
        StoreConfig::Postgres(database) => PgWorkbook::create(database, id).await.map(|_| ()),
    }
}
