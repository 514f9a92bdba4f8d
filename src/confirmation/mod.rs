//! Initial application confirmations ("Thank you for applying")
pub mod processor;

pub use processor::{ConfirmationProcessor, ConfirmationStrategy, CONFIRMATION_HEADERS};
