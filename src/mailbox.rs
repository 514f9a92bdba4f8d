use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::email::{Label, MailMessage, MailThread};

/// Mailbox operations the passes rely on
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Run a provider search and return the matching threads
    async fn search_threads(&self, query: &str) -> Result<Vec<MailThread>>;

    /// First (oldest) message of a thread, `None` for an empty thread
    async fn first_message(&self, thread: &MailThread) -> Result<Option<MailMessage>>;

    async fn label_by_name(&self, name: &str) -> Result<Option<Label>>;

    async fn create_label(&self, name: &str) -> Result<Label>;

    /// Attach a label to a thread. Attaching an existing label is a no-op.
    async fn add_label(&self, thread: &MailThread, label: &Label) -> Result<()>;
}

/// Fetch a label by name, creating it on first use
pub async fn label_by_name_or_create(mailbox: &dyn Mailbox, name: &str) -> Result<Label> {
    if let Some(label) = mailbox.label_by_name(name).await? {
        return Ok(label);
    }

    info!("Label '{}' not found, creating it", name);
    mailbox.create_label(name).await
}

#[derive(Default)]
struct MemoryState {
    threads: Vec<MemoryThread>,
    labels: Vec<Label>,
    searches: HashMap<String, Vec<String>>,
}

struct MemoryThread {
    thread: MailThread,
    messages: Vec<MailMessage>,
}

/// Mailbox kept entirely in memory.
///
/// Search results are registered per query string, so tests decide exactly which
/// threads each query returns. Labels added through [`Mailbox::add_label`] are
/// visible in later searches.
#[derive(Default)]
pub struct InMemoryMailbox {
    state: Mutex<MemoryState>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread(mut self, id: &str, messages: Vec<MailMessage>) -> Self {
        let thread = MailThread {
            id: id.to_string(),
            labels: Vec::new(),
            message_ids: messages.iter().map(|m| m.id.clone()).collect(),
        };
        self.state.get_mut().threads.push(MemoryThread { thread, messages });
        self
    }

    /// Pre-existing label on a thread (and in the mailbox label list)
    pub fn with_thread_label(mut self, thread_id: &str, label_name: &str) -> Self {
        let state = self.state.get_mut();
        if !state.labels.iter().any(|l| l.name == label_name) {
            let id = format!("Label_{}", uuid::Uuid::new_v4().simple());
            state.labels.push(Label { id, name: label_name.to_string() });
        }
        if let Some(entry) = state.threads.iter_mut().find(|t| t.thread.id == thread_id) {
            if !entry.thread.has_label(label_name) {
                entry.thread.labels.push(label_name.to_string());
            }
        }
        self
    }

    pub fn with_search(mut self, query: &str, thread_ids: &[&str]) -> Self {
        self.state.get_mut().searches.insert(
            query.to_string(),
            thread_ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub async fn thread_labels(&self, thread_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .threads
            .iter()
            .find(|t| t.thread.id == thread_id)
            .map(|t| t.thread.labels.clone())
            .unwrap_or_default()
    }

    pub async fn label_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.labels.iter().map(|l| l.name.clone()).collect()
    }
}

#[async_trait]
impl Mailbox for InMemoryMailbox {
    async fn search_threads(&self, query: &str) -> Result<Vec<MailThread>> {
        let state = self.state.lock().await;
        let ids = state.searches.get(query).cloned().unwrap_or_default();

        Ok(ids
            .iter()
            .filter_map(|id| state.threads.iter().find(|t| &t.thread.id == id))
            .map(|t| t.thread.clone())
            .collect())
    }

    async fn first_message(&self, thread: &MailThread) -> Result<Option<MailMessage>> {
        let state = self.state.lock().await;
        Ok(state
            .threads
            .iter()
            .find(|t| t.thread.id == thread.id)
            .and_then(|t| t.messages.first().cloned()))
    }

    async fn label_by_name(&self, name: &str) -> Result<Option<Label>> {
        let state = self.state.lock().await;
        Ok(state.labels.iter().find(|l| l.name == name).cloned())
    }

    async fn create_label(&self, name: &str) -> Result<Label> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.labels.iter().find(|l| l.name == name) {
            anyhow::bail!("Label '{}' already exists ({})", name, existing.id);
        }

        let label = Label {
            id: format!("Label_{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
        };
        state.labels.push(label.clone());
        Ok(label)
    }

    async fn add_label(&self, thread: &MailThread, label: &Label) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.labels.iter().any(|l| l.id == label.id) {
            anyhow::bail!("Unknown label id {}", label.id);
        }

        let entry = state
            .threads
            .iter_mut()
            .find(|t| t.thread.id == thread.id)
            .ok_or_else(|| anyhow::anyhow!("Unknown thread {}", thread.id))?;

        if !entry.thread.has_label(&label.name) {
            entry.thread.labels.push(label.name.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: &str) -> MailMessage {
        MailMessage {
            id: id.to_string(),
            date: Utc::now(),
            from: "jane@x.com".to_string(),
            subject: "Hello".to_string(),
            plain_body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_label_by_name_or_create_is_idempotent() {
        let mailbox = InMemoryMailbox::new();

        let first = label_by_name_or_create(&mailbox, "Applied").await.unwrap();
        let second = label_by_name_or_create(&mailbox, "Applied").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mailbox.label_names().await, vec!["Applied".to_string()]);
    }

    #[tokio::test]
    async fn test_add_label_twice_is_noop() {
        let mailbox = InMemoryMailbox::new()
            .with_thread("t1", vec![message("m1")])
            .with_search("q", &["t1"]);

        let label = mailbox.create_label("Applied").await.unwrap();
        let thread = mailbox.search_threads("q").await.unwrap().remove(0);

        mailbox.add_label(&thread, &label).await.unwrap();
        mailbox.add_label(&thread, &label).await.unwrap();

        assert_eq!(mailbox.thread_labels("t1").await, vec!["Applied".to_string()]);
        let refreshed = mailbox.search_threads("q").await.unwrap();
        assert!(refreshed[0].has_label("Applied"));
    }

    #[tokio::test]
    async fn test_unknown_query_returns_nothing() {
        let mailbox = InMemoryMailbox::new().with_thread("t1", vec![]);
        assert!(mailbox.search_threads("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_thread_has_no_first_message() {
        let mailbox = InMemoryMailbox::new()
            .with_thread("t1", vec![])
            .with_search("q", &["t1"]);

        let thread = mailbox.search_threads("q").await.unwrap().remove(0);
        assert!(mailbox.first_message(&thread).await.unwrap().is_none());
    }
}
