use anyhow::Result;

use crate::config::PassConfig;
use crate::email::{
    extract_sender_name, BaseThreadProcessor, MailMessage, MailThread, PassOutcome, PassSummary,
    ThreadDecision, ThreadPassStrategy,
};
use crate::mailbox::Mailbox;
use crate::sheets::{CellValue, SheetLayout, SheetRow, Workbook};

pub const CONFIRMATION_HEADERS: &[&str] = &["Date", "Sender Name", "Subject", "Thread ID", "Full From"];

/// Every matched thread is labeled and logged, the query is the only filter
pub struct ConfirmationStrategy {
    search_query: String,
    label_name: String,
    layout: SheetLayout,
}

impl ConfirmationStrategy {
    pub fn new(config: &PassConfig) -> Self {
        Self {
            search_query: config.search_query.clone(),
            label_name: config.label_name.clone(),
            layout: SheetLayout::new(&config.sheet_name, CONFIRMATION_HEADERS),
        }
    }
}

impl ThreadPassStrategy for ConfirmationStrategy {
    fn pass_name(&self) -> &str {
        "application confirmation"
    }

    fn search_query(&self) -> &str {
        &self.search_query
    }

    fn label_name(&self) -> &str {
        &self.label_name
    }

    fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    fn classify(&self, _message: &MailMessage) -> ThreadDecision {
        ThreadDecision::Include { keyword: None }
    }

    fn build_row(&self, thread: &MailThread, message: &MailMessage, _keyword: Option<&str>) -> SheetRow {
        vec![
            CellValue::from(message.date),
            CellValue::from(extract_sender_name(&message.from)),
            CellValue::from(message.subject.clone()),
            CellValue::from(thread.id.clone()),
            CellValue::from(message.from.clone()),
        ]
    }
}

/// Confirmation pass (wrapper around BaseThreadProcessor)
pub struct ConfirmationProcessor {
    base: BaseThreadProcessor<ConfirmationStrategy>,
}

impl ConfirmationProcessor {
    pub fn new(config: &PassConfig) -> Self {
        ConfirmationProcessor {
            base: BaseThreadProcessor::new(ConfirmationStrategy::new(config)),
        }
    }

    pub fn layout(&self) -> &SheetLayout {
        self.base.strategy().layout()
    }

    pub async fn process_threads(&self, mailbox: &dyn Mailbox, workbook: &dyn Workbook) -> Result<PassSummary> {
        self.base.process_threads(mailbox, workbook).await
    }

    pub async fn process_threads_dry_run(&self, mailbox: &dyn Mailbox) -> Result<PassOutcome> {
        self.base.process_threads_dry_run(mailbox).await
    }
}
