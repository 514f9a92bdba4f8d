use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::memory::{last_non_empty_row, write_rows};
use super::{SheetError, SheetRow, Workbook};

/// Workbook stored as a directory with one CSV file per sheet
///
/// Layout: `<sheets_dir>/<workbook id>/<sheet name>.csv`
pub struct CsvWorkbook {
    id: String,
    dir: PathBuf,
}

impl CsvWorkbook {
    /// Open an existing workbook directory
    pub fn open(sheets_dir: &str, id: &str) -> Result<Self> {
        let dir = Path::new(sheets_dir).join(id);
        if !dir.is_dir() {
            return Err(SheetError::WorkbookNotFound(id.to_string()))
                .with_context(|| format!("No workbook directory at {}", dir.display()));
        }

        debug!("Opened CSV workbook {} at {}", id, dir.display());
        Ok(CsvWorkbook { id: id.to_string(), dir })
    }

    pub fn create(sheets_dir: &str, id: &str) -> Result<Self> {
        let dir = Path::new(sheets_dir).join(id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Unable to create workbook directory {}", dir.display()))?;

        info!("✅ CSV workbook created at {}", dir.display());
        Ok(CsvWorkbook { id: id.to_string(), dir })
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.csv", file_name))
    }

    fn existing_sheet_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(SheetError::SheetNotFound(name.to_string()).into());
        }
        Ok(path)
    }

    fn read_sheet(path: &Path) -> Result<Vec<Vec<String>>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Unable to open {}", path.display()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Invalid CSV in {}", path.display()))?;
            // A lone empty field is how the writer encodes an empty row
            if record.len() == 1 && record.get(0) == Some("") {
                rows.push(Vec::new());
            } else {
                rows.push(record.iter().map(|field| field.to_string()).collect());
            }
        }
        Ok(rows)
    }

    fn write_sheet(path: &Path, rows: &[Vec<String>]) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Unable to write {}", path.display()))?;

        for row in rows {
            if row.is_empty() {
                writer.write_record([""])?;
            } else {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Workbook for CsvWorkbook {
    fn id(&self) -> &str {
        &self.id
    }

    async fn has_sheet(&self, name: &str) -> Result<bool> {
        Ok(self.sheet_path(name).is_file())
    }

    async fn insert_sheet(&self, name: &str) -> Result<()> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            Self::write_sheet(&path, &[])?;
        }
        Ok(())
    }

    async fn clear_contents(&self, name: &str) -> Result<()> {
        let path = self.existing_sheet_path(name)?;
        Self::write_sheet(&path, &[])
    }

    async fn set_values(&self, name: &str, start_row: usize, rows: &[SheetRow]) -> Result<()> {
        let path = self.existing_sheet_path(name)?;
        let mut sheet = Self::read_sheet(&path)?;

        let rendered: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        write_rows(&mut sheet, start_row, &rendered);

        Self::write_sheet(&path, &sheet)
    }

    async fn last_row(&self, name: &str) -> Result<usize> {
        let path = self.existing_sheet_path(name)?;
        Ok(last_non_empty_row(&Self::read_sheet(&path)?))
    }
}
