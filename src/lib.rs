// Library exports for jobmail crate
// This allows tests and the binary to use the modules

pub mod config;
pub mod email;
pub mod gmail_client;
pub mod job;
pub mod mailbox;
pub mod queries;
pub mod sheets;

// Initial application confirmations
pub mod confirmation;

// Interview / assessment follow-ups
pub mod action;
