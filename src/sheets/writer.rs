use anyhow::{Context, Result};
use log::{debug, info};

use super::{SheetError, SheetLayout, SheetRow, Workbook};

/// Clear a destination table and write its header at row 1.
///
/// The sheet is created when missing.
pub async fn reset_table(workbook: &dyn Workbook, layout: &SheetLayout) -> Result<()> {
    if workbook.has_sheet(&layout.name).await? {
        workbook
            .clear_contents(&layout.name)
            .await
            .with_context(|| format!("Unable to clear sheet '{}'", layout.name))?;
        info!("Cleared existing content from sheet: '{}'", layout.name);
    } else {
        workbook
            .insert_sheet(&layout.name)
            .await
            .with_context(|| format!("Unable to create sheet '{}'", layout.name))?;
        info!("Created sheet: '{}'", layout.name);
    }

    workbook
        .set_values(&layout.name, 1, &[layout.header_row()])
        .await
        .with_context(|| format!("Unable to write header of sheet '{}'", layout.name))?;

    Ok(())
}

/// Append rows right after the last non-empty row. Returns the number written.
pub async fn append_rows(workbook: &dyn Workbook, layout: &SheetLayout, rows: &[SheetRow]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    for (index, row) in rows.iter().enumerate() {
        if row.len() != layout.width() {
            return Err(SheetError::RowWidth {
                sheet: layout.name.clone(),
                row: index,
                expected: layout.width(),
                actual: row.len(),
            }
            .into());
        }
    }

    let start_row = workbook.last_row(&layout.name).await? + 1;
    debug!("Writing {} row(s) to '{}' from row {}", rows.len(), layout.name, start_row);

    workbook
        .set_values(&layout.name, start_row, rows)
        .await
        .with_context(|| format!("Unable to append rows to sheet '{}'", layout.name))?;

    Ok(rows.len())
}
