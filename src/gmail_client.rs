use anyhow::{Context, Result};
use async_trait::async_trait;
use google_gmail1::{Gmail, hyper, hyper_rustls, oauth2};
use log::{debug, info, warn};
use std::collections::HashMap;

use crate::config::GmailConfig;
use crate::email::{Label, MailMessage, MailThread};
use crate::mailbox::Mailbox;

const USER_ID: &str = "me";

pub struct GmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
    max_threads: usize,
}

impl GmailClient {
    pub async fn new(config: &GmailConfig) -> Result<Self> {
        info!("Connecting to Gmail API via OAuth2");

        // Read OAuth2 client credentials from file
        let secret = oauth2::read_application_secret(&config.credentials_path)
            .await
            .context("Unable to read OAuth2 client credentials file")?;

        // Scope::Modify covers searching, reading and labeling threads
        let auth = oauth2::InstalledFlowAuthenticator::builder(
            secret,
            oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(&config.token_cache_path)
        .build()
        .await
        .context("Unable to create OAuth2 authenticator")?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = hyper::Client::builder().build(connector);
        let hub = Gmail::new(client, auth);

        info!("✅ Gmail API connection established successfully");

        Ok(GmailClient {
            hub,
            max_threads: config.max_threads,
        })
    }

    /// Label id → name for every label of the account
    async fn label_names_by_id(&self) -> Result<HashMap<String, String>> {
        let result = self.hub
            .users()
            .labels_list(USER_ID)
            .add_scope(google_gmail1::api::Scope::Modify)
            .doit()
            .await
            .context("Unable to list labels")?;

        Ok(result.1
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|l| match (l.id, l.name) {
                (Some(id), Some(name)) => Some((id, name)),
                _ => None,
            })
            .collect())
    }

    async fn search_thread_ids(&self, query: &str) -> Result<Vec<String>> {
        let mut thread_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.hub
                .users()
                .threads_list(USER_ID)
                .q(query)
                .add_scope(google_gmail1::api::Scope::Modify);

            if let Some(token) = &page_token {
                request = request.page_token(token);
            }

            let (_, page) = request.doit()
                .await
                .context("Error searching for threads")?;

            thread_ids.extend(page.threads.unwrap_or_default().into_iter().filter_map(|t| t.id));

            if exceeds_cap(thread_ids.len(), self.max_threads, page.next_page_token.is_some()) {
                warn!("Search returned more than {} threads, truncating", self.max_threads);
                thread_ids.truncate(self.max_threads);
                break;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(thread_ids)
    }

    async fn fetch_thread(&self, thread_id: &str, label_names: &HashMap<String, String>) -> Result<MailThread> {
        let (_, thread) = self.hub
            .users()
            .threads_get(USER_ID, thread_id)
            .format("minimal")
            .add_scope(google_gmail1::api::Scope::Modify)
            .doit()
            .await
            .with_context(|| format!("Unable to retrieve thread {}", thread_id))?;

        let messages = thread.messages.unwrap_or_default();

        // Thread labels are the union of its message labels
        let mut labels: Vec<String> = Vec::new();
        for label_id in messages.iter().flat_map(|m| m.label_ids.clone().unwrap_or_default()) {
            let name = label_names.get(&label_id).cloned().unwrap_or(label_id);
            if !labels.contains(&name) {
                labels.push(name);
            }
        }

        Ok(MailThread {
            id: thread_id.to_string(),
            labels,
            message_ids: messages.into_iter().filter_map(|m| m.id).collect(),
        })
    }

    async fn fetch_message(&self, message_id: &str) -> Result<MailMessage> {
        debug!("Complete message retrieval for ID: {}", message_id);

        let (_, message) = self.hub
            .users()
            .messages_get(USER_ID, message_id)
            .format("raw")
            .add_scope(google_gmail1::api::Scope::Modify)
            .doit()
            .await
            .with_context(|| format!("Unable to retrieve message {}", message_id))?;

        let raw = message.raw.context("No raw content in message")?;
        let parsed = mail_parser::MessageParser::default()
            .parse(&raw[..])
            .context("Unable to parse message")?;

        let date = parsed
            .date()
            .and_then(|d| chrono::DateTime::from_timestamp(d.to_timestamp(), 0))
            .or_else(|| message.internal_date.and_then(chrono::DateTime::from_timestamp_millis))
            .unwrap_or_else(|| {
                warn!("No date in message {}, using current date", message_id);
                chrono::Utc::now()
            });

        let from = parsed
            .header_raw(mail_parser::HeaderName::From)
            .map(unfold_header)
            .unwrap_or_else(|| {
                warn!("No From header in message {}", message_id);
                String::new()
            });

        let subject = parsed.subject().unwrap_or_default().to_string();

        Ok(MailMessage {
            id: message_id.to_string(),
            date,
            from,
            subject,
            plain_body: plain_body(&parsed)?,
        })
    }
}

/// True when a search has results beyond `max_threads`, counting unfetched pages
fn exceeds_cap(collected: usize, max_threads: usize, more_pages: bool) -> bool {
    collected > max_threads || (collected == max_threads && more_pages)
}

/// Collapse a folded header value onto one line
fn unfold_header(raw: &str) -> String {
    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text body, falling back to tag-stripped HTML
fn plain_body(parsed: &mail_parser::Message) -> Result<String> {
    if let Some(text) = parsed.body_text(0) {
        return Ok(text.to_string());
    }

    if let Some(html) = parsed.body_html(0) {
        let html = html.to_string()
            .replace("<br>", "\n")
            .replace("<BR>", "\n")
            .replace("</p>", "\n")
            .replace("</P>", "\n");
        let tag_regex = regex::Regex::new(r"<[^>]+>")?;
        return Ok(tag_regex.replace_all(&html, "").to_string());
    }

    Ok(String::new())
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn search_threads(&self, query: &str) -> Result<Vec<MailThread>> {
        debug!("Search criteria: {}", query);

        let thread_ids = self.search_thread_ids(query).await?;
        if thread_ids.is_empty() {
            return Ok(Vec::new());
        }

        let label_names = self.label_names_by_id().await?;

        let mut threads = Vec::with_capacity(thread_ids.len());
        for thread_id in &thread_ids {
            threads.push(self.fetch_thread(thread_id, &label_names).await?);
        }

        Ok(threads)
    }

    async fn first_message(&self, thread: &MailThread) -> Result<Option<MailMessage>> {
        match thread.message_ids.first() {
            Some(message_id) => Ok(Some(self.fetch_message(message_id).await?)),
            None => Ok(None),
        }
    }

    async fn label_by_name(&self, name: &str) -> Result<Option<Label>> {
        let labels = self.label_names_by_id().await?;

        Ok(labels
            .into_iter()
            .find(|(_, label_name)| label_name == name)
            .map(|(id, name)| Label { id, name }))
    }

    async fn create_label(&self, name: &str) -> Result<Label> {
        let request = google_gmail1::api::Label {
            name: Some(name.to_string()),
            message_list_visibility: Some("show".to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            ..Default::default()
        };

        let (_, created) = self.hub
            .users()
            .labels_create(request, USER_ID)
            .add_scope(google_gmail1::api::Scope::Modify)
            .doit()
            .await
            .with_context(|| format!("Unable to create label '{}'", name))?;

        let id = created.id.context("Created label has no ID")?;
        info!("✅ Label '{}' created ({})", name, id);

        Ok(Label { id, name: name.to_string() })
    }

    async fn add_label(&self, thread: &MailThread, label: &Label) -> Result<()> {
        let request = google_gmail1::api::ModifyThreadRequest {
            add_label_ids: Some(vec![label.id.clone()]),
            ..Default::default()
        };

        self.hub
            .users()
            .threads_modify(request, USER_ID, &thread.id)
            .add_scope(google_gmail1::api::Scope::Modify)
            .doit()
            .await
            .with_context(|| format!("Unable to label thread {}", thread.id))?;

        debug!("Label '{}' added to thread {}", label.name, thread.id);
        Ok(())
    }
}
