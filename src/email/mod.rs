pub mod common;
pub mod processor_base;
pub mod sender;

// Re-export commonly used items
pub use common::{Label, MailMessage, MailThread, PassSummary, SkipReason, ThreadDecision};
pub use processor_base::{BaseThreadProcessor, PassOutcome, ThreadPassStrategy};
pub use sender::extract_sender_name;
