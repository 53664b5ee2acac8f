pub mod catalog;
pub mod categories;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fs;
pub mod orchestrator;
pub mod providers;
pub mod retry;
pub mod store;
pub mod walker;
