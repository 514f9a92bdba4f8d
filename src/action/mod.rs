//! Actionable follow-ups (interviews, assessments, scheduling)
pub mod classifier;
pub mod processor;

pub use classifier::KeywordClassifier;
pub use processor::{ActionProcessor, ActionStrategy, ACTION_HEADERS};
