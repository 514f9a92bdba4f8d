//! Common structures shared by the mailbox implementations and the passes
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Mailbox label (provider id + display name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// Thread as returned by a search
#[derive(Debug, Clone, PartialEq)]
pub struct MailThread {
    pub id: String,
    /// Label names currently attached to the thread
    pub labels: Vec<String>,
    /// Message ids, oldest first
    pub message_ids: Vec<String>,
}

impl MailThread {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

/// Message fields needed to build a sheet row
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Raw From header, e.g. `"Jane Doe" <jane@x.com>`
    pub from: String,
    pub subject: String,
    pub plain_body: String,
}

/// Why a thread produced no row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    AlreadyLabeled,
    /// Listed more than once in the same search result
    Duplicate,
    NoMessages,
    NoKeyword,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::AlreadyLabeled => "already labeled",
            SkipReason::Duplicate => "already handled in this pass",
            SkipReason::NoMessages => "thread has no messages",
            SkipReason::NoKeyword => "no action keyword in body",
        };
        f.write_str(reason)
    }
}

/// Outcome of running a thread through a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadDecision {
    Include { keyword: Option<String> },
    Skip(SkipReason),
}

/// Counters for one pass over a search result
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PassSummary {
    pub threads_found: usize,
    pub labeled: usize,
    pub rows_logged: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl PassSummary {
    pub fn new(threads_found: usize) -> Self {
        Self {
            threads_found,
            ..Self::default()
        }
    }

    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}
