use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashSet;

use crate::email::{MailMessage, MailThread, PassSummary, SkipReason, ThreadDecision};
use crate::mailbox::{label_by_name_or_create, Mailbox};
use crate::sheets::{append_rows, SheetLayout, SheetRow, Workbook};

/// Trait that defines the specific classification logic of each pass
pub trait ThreadPassStrategy: Send + Sync {
    /// Name of this pass (for logging)
    fn pass_name(&self) -> &str;

    /// Gmail query selecting candidate threads
    fn search_query(&self) -> &str;

    /// Label attached to every included thread
    fn label_name(&self) -> &str;

    /// Destination table of this pass
    fn layout(&self) -> &SheetLayout;

    /// Checked before the first message is fetched
    fn screen_thread(&self, _thread: &MailThread) -> Option<SkipReason> {
        None
    }

    /// Decide on a thread from its first message
    fn classify(&self, message: &MailMessage) -> ThreadDecision;

    /// Row written for an included thread
    fn build_row(&self, thread: &MailThread, message: &MailMessage, keyword: Option<&str>) -> SheetRow;
}

/// Rows and counters produced by one pass
#[derive(Debug, Default)]
pub struct PassOutcome {
    pub summary: PassSummary,
    pub rows: Vec<SheetRow>,
}

/// Base thread processor that runs search → classify → label → write for a strategy
pub struct BaseThreadProcessor<S: ThreadPassStrategy> {
    strategy: S,
}

impl<S: ThreadPassStrategy> BaseThreadProcessor<S> {
    pub fn new(strategy: S) -> Self {
        BaseThreadProcessor { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run the pass and append its rows to the workbook
    pub async fn process_threads(&self, mailbox: &dyn Mailbox, workbook: &dyn Workbook) -> Result<PassSummary> {
        let mut outcome = self.process_threads_common(mailbox, false).await?;

        let written = append_rows(workbook, self.strategy.layout(), &outcome.rows)
            .await
            .with_context(|| format!("Unable to write {} rows", self.strategy.pass_name()))?;
        outcome.summary.rows_logged = written;

        if written > 0 {
            info!(
                "Logged {} {} entries to '{}'",
                written,
                self.strategy.pass_name(),
                self.strategy.layout().name
            );
        }

        Ok(outcome.summary)
    }

    /// Run the pass without labeling or writing and return the would-be rows
    pub async fn process_threads_dry_run(&self, mailbox: &dyn Mailbox) -> Result<PassOutcome> {
        println!("\n{}", "=".repeat(80));
        println!("🧪 MODE DRY-RUN - {} PASS", self.strategy.pass_name().to_uppercase());
        println!("{}", "=".repeat(80));

        let outcome = self.process_threads_common(mailbox, true).await?;

        println!("{}", "-".repeat(60));
        println!("📋 Would log {} row(s) to '{}'", outcome.rows.len(), self.strategy.layout().name);
        for row in &outcome.rows {
            let cells: Vec<String> = row.iter().map(|cell| preview(&cell.to_string())).collect();
            println!("   • {}", cells.join(" | "));
        }

        Ok(outcome)
    }

    /// Common processing logic for both normal and dry-run modes
    async fn process_threads_common(&self, mailbox: &dyn Mailbox, is_dry_run: bool) -> Result<PassOutcome> {
        // 1. Search candidate threads
        let threads = mailbox
            .search_threads(self.strategy.search_query())
            .await
            .with_context(|| format!("Error searching for {} threads", self.strategy.pass_name()))?;

        info!("Found {} {} threads.", threads.len(), self.strategy.pass_name());

        let mut outcome = PassOutcome {
            summary: PassSummary::new(threads.len()),
            rows: Vec::new(),
        };

        // 2. Resolve the label (left untouched in dry-run)
        let label = if is_dry_run {
            None
        } else {
            Some(label_by_name_or_create(mailbox, self.strategy.label_name()).await?)
        };

        // 3. Classify each thread, once per id
        let mut seen: HashSet<&str> = HashSet::with_capacity(threads.len());
        for thread in &threads {
            if !seen.insert(thread.id.as_str()) {
                debug!("Skipping thread {}: {}", thread.id, SkipReason::Duplicate);
                outcome.summary.skip(SkipReason::Duplicate);
                continue;
            }

            if let Some(reason) = self.strategy.screen_thread(thread) {
                debug!("Skipping thread {}: {}", thread.id, reason);
                outcome.summary.skip(reason);
                continue;
            }

            let message = match mailbox.first_message(thread).await? {
                Some(message) => message,
                None => {
                    debug!("Skipping thread {}: {}", thread.id, SkipReason::NoMessages);
                    outcome.summary.skip(SkipReason::NoMessages);
                    continue;
                }
            };

            let keyword = match self.strategy.classify(&message) {
                ThreadDecision::Include { keyword } => keyword,
                ThreadDecision::Skip(reason) => {
                    debug!("Skipping thread {}: {}", thread.id, reason);
                    outcome.summary.skip(reason);
                    continue;
                }
            };

            // 4. Label and collect the row
            if let Some(label) = &label {
                mailbox.add_label(thread, label).await?;
                outcome.summary.labeled += 1;
            }

            if is_dry_run {
                println!("📧 Thread {} - {}", thread.id, message.subject);
                if let Some(keyword) = &keyword {
                    println!("   🔑 Keyword: {}", keyword);
                }
            }

            outcome.rows.push(self.strategy.build_row(thread, &message, keyword.as_deref()));
        }

        Ok(outcome)
    }
}

/// Single-line cell preview for console output
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > 40 || text.lines().nth(1).is_some() {
        format!("{}...", line.chars().take(37).collect::<String>())
    } else {
        line.to_string()
    }
}
