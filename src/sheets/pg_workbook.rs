use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use sqlx::PgPool;

use super::{SheetError, SheetRow, Workbook};
use crate::config::DatabaseConfig;

/// Workbook stored in PostgreSQL, one JSONB array per row
pub struct PgWorkbook {
    id: String,
    pool: PgPool,
}

impl PgWorkbook {
    async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
        info!("Connecting to PostgreSQL sheet store");

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            config.username, config.password, config.host, config.port, config.database
        );

        let pool = PgPool::connect(&database_url)
            .await
            .context("Unable to connect to the database")?;

        info!("Database connection established");

        Self::create_tables_if_not_exists(&pool).await?;
        Ok(pool)
    }

    async fn create_tables_if_not_exists(pool: &PgPool) -> Result<()> {
        debug!("Checking/creating sheet store tables");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workbooks (
                id VARCHAR(255) PRIMARY KEY,
                created_at TIMESTAMPTZ DEFAULT NOW()
            )
            "#
        )
        .execute(pool)
        .await
        .context("Unable to create workbooks table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheets (
                workbook_id VARCHAR(255) NOT NULL REFERENCES workbooks(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                PRIMARY KEY (workbook_id, name)
            )
            "#
        )
        .execute(pool)
        .await
        .context("Unable to create sheets table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_rows (
                workbook_id VARCHAR(255) NOT NULL,
                sheet VARCHAR(255) NOT NULL,
                row_num INTEGER NOT NULL,
                cells JSONB NOT NULL,
                written_at TIMESTAMPTZ DEFAULT NOW(),
                PRIMARY KEY (workbook_id, sheet, row_num),
                FOREIGN KEY (workbook_id, sheet) REFERENCES sheets(workbook_id, name) ON DELETE CASCADE
            )
            "#
        )
        .execute(pool)
        .await
        .context("Unable to create sheet_rows table")?;

        Ok(())
    }

    /// Open a workbook that was created beforehand
    pub async fn open(config: &DatabaseConfig, id: &str) -> Result<Self> {
        let pool = Self::connect(config).await?;

        let exists = sqlx::query("SELECT 1 FROM workbooks WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await
            .context("Error checking workbook existence")?;

        if exists.is_none() {
            return Err(SheetError::WorkbookNotFound(id.to_string()).into());
        }

        Ok(PgWorkbook { id: id.to_string(), pool })
    }

    pub async fn create(config: &DatabaseConfig, id: &str) -> Result<Self> {
        let pool = Self::connect(config).await?;

        sqlx::query("INSERT INTO workbooks (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .execute(&pool)
            .await
            .context("Error inserting workbook")?;

        info!("✅ Workbook {} available in PostgreSQL", id);
        Ok(PgWorkbook { id: id.to_string(), pool })
    }

    async fn ensure_sheet(&self, name: &str) -> Result<()> {
        if !self.has_sheet(name).await? {
            return Err(SheetError::SheetNotFound(name.to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Workbook for PgWorkbook {
    fn id(&self) -> &str {
        &self.id
    }

    async fn has_sheet(&self, name: &str) -> Result<bool> {
        let exists = sqlx::query("SELECT 1 FROM sheets WHERE workbook_id = $1 AND name = $2")
            .bind(&self.id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Error checking sheet existence")?;
        Ok(exists.is_some())
    }

    async fn insert_sheet(&self, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO sheets (workbook_id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(&self.id)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Error inserting sheet")?;

        debug!("Sheet '{}' created in workbook {}", name, self.id);
        Ok(())
    }

    async fn clear_contents(&self, name: &str) -> Result<()> {
        self.ensure_sheet(name).await?;

        sqlx::query("DELETE FROM sheet_rows WHERE workbook_id = $1 AND sheet = $2")
            .bind(&self.id)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Error clearing sheet rows")?;
        Ok(())
    }

    async fn set_values(&self, name: &str, start_row: usize, rows: &[SheetRow]) -> Result<()> {
        self.ensure_sheet(name).await?;

        let mut transaction = self.pool.begin()
            .await
            .context("Unable to start transaction")?;

        for (index, row) in rows.iter().enumerate() {
            let row_num = i32::try_from(start_row + index).context("Row number out of range")?;
            let cells = serde_json::to_value(row).context("Unable to serialize row")?;

            sqlx::query(
                r#"
                INSERT INTO sheet_rows (workbook_id, sheet, row_num, cells)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (workbook_id, sheet, row_num)
                DO UPDATE SET cells = EXCLUDED.cells, written_at = NOW()
                "#
            )
            .bind(&self.id)
            .bind(name)
            .bind(row_num)
            .bind(cells)
            .execute(&mut *transaction)
            .await
            .context("Error writing sheet row")?;
        }

        transaction.commit()
            .await
            .context("Error committing transaction")?;

        Ok(())
    }

    async fn last_row(&self, name: &str) -> Result<usize> {
        self.ensure_sheet(name).await?;

        let last: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(row_num) FROM sheet_rows WHERE workbook_id = $1 AND sheet = $2"
        )
        .bind(&self.id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .context("Error reading last row")?;

        Ok(last.map(|n| n.max(0) as usize).unwrap_or(0))
    }
}
