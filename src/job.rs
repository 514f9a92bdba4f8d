use anyhow::{Context, Result};
use log::{error, info};

use crate::action::ActionProcessor;
use crate::config::{Config, JobConfig};
use crate::confirmation::ConfirmationProcessor;
use crate::email::PassSummary;
use crate::gmail_client::GmailClient;
use crate::mailbox::Mailbox;
use crate::sheets::{self, reset_table, Workbook};

/// Counters of a complete run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub confirmation: PassSummary,
    pub action: PassSummary,
}

/// Both passes of the job, wired from a [`JobConfig`]
pub struct JobProcessor {
    confirmation: ConfirmationProcessor,
    action: ActionProcessor,
}

impl JobProcessor {
    pub fn new(job: &JobConfig) -> Self {
        JobProcessor {
            confirmation: ConfirmationProcessor::new(&job.confirmation),
            action: ActionProcessor::new(&job.action, &job.action_keywords),
        }
    }

    /// Reset both tables, then run the confirmation and the action pass.
    ///
    /// Tables are cleared before either pass runs, so an error part-way through
    /// leaves them header-only.
    pub async fn run(&self, mailbox: &dyn Mailbox, workbook: &dyn Workbook) -> Result<RunReport> {
        let run_id = uuid::Uuid::new_v4();
        info!("Starting job run {} on workbook {}", run_id, workbook.id());

        reset_table(workbook, self.confirmation.layout()).await?;
        reset_table(workbook, self.action.layout()).await?;

        let confirmation = self.confirmation
            .process_threads(mailbox, workbook)
            .await
            .context("Application confirmation pass failed")?;

        let action = self.action
            .process_threads(mailbox, workbook)
            .await
            .context("Actionable follow-up pass failed")?;

        info!(
            "Total actionable emails labeled: {}. Run {} complete.",
            action.labeled, run_id
        );

        Ok(RunReport { confirmation, action })
    }

    /// Search and classify only; nothing is labeled or written
    pub async fn run_dry_run(&self, mailbox: &dyn Mailbox) -> Result<RunReport> {
        let confirmation = self.confirmation.process_threads_dry_run(mailbox).await?;
        let action = self.action.process_threads_dry_run(mailbox).await?;

        println!("{}", "=".repeat(80));
        println!(
            "🏁 Analysis completed: {} confirmation row(s), {} actionable row(s)",
            confirmation.rows.len(),
            action.rows.len()
        );
        println!("{}", "=".repeat(80));

        let mut report = RunReport {
            confirmation: confirmation.summary,
            action: action.summary,
        };
        report.confirmation.rows_logged = confirmation.rows.len();
        report.action.rows_logged = action.rows.len();
        Ok(report)
    }
}

/// Open the workbook and the mailbox from the deployment config, then run the job
pub async fn run_job(config: &Config, dry_run: bool) -> Result<RunReport> {
    let processor = JobProcessor::new(&config.job);

    if dry_run {
        let gmail = GmailClient::new(&config.gmail)
            .await
            .context("Unable to connect to Gmail API")?;
        return processor.run_dry_run(&gmail).await;
    }

    // Nothing is touched when the workbook cannot be opened
    let workbook = match sheets::open_workbook(&config.store, &config.job.spreadsheet_id).await {
        Ok(workbook) => workbook,
        Err(e) => {
            error!(
                "❌ Could not open spreadsheet with ID {}. Error: {:#}",
                config.job.spreadsheet_id, e
            );
            return Err(e);
        }
    };

    let gmail = GmailClient::new(&config.gmail)
        .await
        .context("Unable to connect to Gmail API")?;

    processor.run(&gmail, workbook.as_ref()).await
}
