use anyhow::{Context, Result};
use serde::Deserialize;

use crate::queries;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub gmail: GmailConfig,
    pub store: StoreConfig,
    pub scheduler: SchedulerConfig,
    pub job: JobConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub schedule_times: Vec<String>, // Format: "HH:MM" (e.g., ["07:00", "19:00"])
}

#[derive(Debug, Deserialize, Clone)]
pub struct GmailConfig {
    pub credentials_path: String,
    pub token_cache_path: String,
    /// Upper bound on threads returned by a single search
    pub max_threads: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Where the destination workbook lives
#[derive(Debug, Deserialize, Clone)]
pub enum StoreConfig {
    Csv { sheets_dir: String },
    Postgres(DatabaseConfig),
}

/// One classify-and-log pass: which threads to search, how to tag them, where rows go
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PassConfig {
    pub sheet_name: String,
    pub label_name: String,
    pub search_query: String,
}

/// Static per-run job definition.
///
/// Built from the constants in [`crate::queries`]; nothing here is read from the
/// environment so a run is fully described by this value.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct JobConfig {
    pub spreadsheet_id: String,
    pub confirmation: PassConfig,
    pub action: PassConfig,
    pub action_keywords: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            spreadsheet_id: queries::SPREADSHEET_ID.to_string(),
            confirmation: PassConfig {
                sheet_name: queries::CONFIRMATION_SHEET_NAME.to_string(),
                label_name: queries::CONFIRMATION_LABEL_NAME.to_string(),
                search_query: queries::confirmation_query().render(),
            },
            action: PassConfig {
                sheet_name: queries::ACTION_SHEET_NAME.to_string(),
                label_name: queries::ACTION_LABEL_NAME.to_string(),
                search_query: queries::action_query().render(),
            },
            action_keywords: queries::ACTION_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Fail early on missing required variables
        Self::check_required_env_vars()?;

        let store = match std::env::var("SHEET_STORE")
            .unwrap_or_else(|_| "csv".to_string())
            .to_lowercase()
            .as_str()
        {
            "csv" => StoreConfig::Csv {
                sheets_dir: std::env::var("SHEETS_DIR")
                    .unwrap_or_else(|_| "./sheets".to_string()),
            },
            "postgres" => StoreConfig::Postgres(DatabaseConfig {
                host: std::env::var("DB_HOST")
                    .unwrap_or_else(|_| "localhost".to_string()),
                port: std::env::var("DB_PORT")
                    .unwrap_or_else(|_| "5432".to_string())
                    .parse()
                    .unwrap_or(5432),
                database: std::env::var("DB_NAME")
                    .unwrap_or_else(|_| "jobmail".to_string()),
                username: std::env::var("DB_USERNAME")
                    .unwrap_or_else(|_| "postgres".to_string()),
                password: std::env::var("DB_PASSWORD")
                    .context("DB_PASSWORD must be set when SHEET_STORE=postgres")?,
            }),
            other => anyhow::bail!("Unknown SHEET_STORE '{}' (expected 'csv' or 'postgres')", other),
        };

        Ok(Config {
            gmail: GmailConfig {
                credentials_path: std::env::var("GMAIL_CREDENTIALS_PATH")
                    .context("GMAIL_CREDENTIALS_PATH must be set")?,
                token_cache_path: std::env::var("GMAIL_TOKEN_CACHE_PATH")
                    .unwrap_or_else(|_| "./gmail-token-cache.json".to_string()),
                max_threads: std::env::var("GMAIL_MAX_THREADS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .unwrap_or(500),
            },
            store,
            scheduler: SchedulerConfig {
                enabled: std::env::var("SCHEDULER_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
                schedule_times: std::env::var("SCHEDULER_TIMES")
                    .unwrap_or_else(|_| "07:00".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            job: JobConfig::default(),
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let required_vars = [
            "GMAIL_CREDENTIALS_PATH",
        ];

        let missing_vars: Vec<&str> = required_vars
            .iter()
            .filter(|var| std::env::var(var).is_err())
            .copied()
            .collect();

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 💡 Solutions:\n\
                 1. Create a .env file with your credentials:\n\
                    GMAIL_CREDENTIALS_PATH=/path/to/client_credentials.json\n\
                    SHEET_STORE=csv\n\
                    SHEETS_DIR=./sheets\n\
                 \n\
                 2. Or export them manually before running:\n\
                    export GMAIL_CREDENTIALS_PATH=/path/to/client_credentials.json\n\
                    cargo run -- --dry-run",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}
