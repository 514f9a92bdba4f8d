use anyhow::Result;

use super::classifier::KeywordClassifier;
use crate::config::PassConfig;
use crate::email::{
    extract_sender_name, BaseThreadProcessor, MailMessage, MailThread, PassOutcome, PassSummary,
    SkipReason, ThreadDecision, ThreadPassStrategy,
};
use crate::mailbox::Mailbox;
use crate::sheets::{CellValue, SheetLayout, SheetRow, Workbook};

pub const ACTION_HEADERS: &[&str] = &[
    "Date",
    "Sender Name",
    "Subject",
    "Action Keyword Found",
    "Full From",
    "Message Body",
];

/// Follow-up strategy: the query is a coarse filter, the body keyword check is the precise one
pub struct ActionStrategy {
    search_query: String,
    label_name: String,
    layout: SheetLayout,
    classifier: KeywordClassifier,
}

impl ActionStrategy {
    pub fn new(config: &PassConfig, keywords: &[String]) -> Self {
        Self {
            search_query: config.search_query.clone(),
            label_name: config.label_name.clone(),
            layout: SheetLayout::new(&config.sheet_name, ACTION_HEADERS),
            classifier: KeywordClassifier::new(keywords),
        }
    }
}

impl ThreadPassStrategy for ActionStrategy {
    fn pass_name(&self) -> &str {
        "actionable follow-up"
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

    fn screen_thread(&self, thread: &MailThread) -> Option<SkipReason> {
        // Labeled by a previous run
        if thread.has_label(&self.label_name) {
            return Some(SkipReason::AlreadyLabeled);
        }
        None
    }

    fn classify(&self, message: &MailMessage) -> ThreadDecision {
        match self.classifier.classify(&message.plain_body) {
            Some(keyword) => ThreadDecision::Include { keyword: Some(keyword.to_string()) },
            None => ThreadDecision::Skip(SkipReason::NoKeyword),
        }
    }

    fn build_row(&self, _thread: &MailThread, message: &MailMessage, keyword: Option<&str>) -> SheetRow {
        vec![
            CellValue::from(message.date),
            CellValue::from(extract_sender_name(&message.from)),
            CellValue::from(message.subject.clone()),
            CellValue::from(keyword.unwrap_or_default()),
            CellValue::from(message.from.clone()),
            CellValue::from(message.plain_body.clone()),
        ]
    }
}

/// Follow-up pass (wrapper around BaseThreadProcessor)
pub struct ActionProcessor {
    base: BaseThreadProcessor<ActionStrategy>,
}

impl ActionProcessor {
    pub fn new(config: &PassConfig, keywords: &[String]) -> Self {
        ActionProcessor {
            base: BaseThreadProcessor::new(ActionStrategy::new(config, keywords)),
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
