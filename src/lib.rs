//! Record cache API
//!
//! A cache-aside read path in front of swappable storage, with:
//! - Storage executors (in-memory, PostgreSQL)
//! - Cache executors (in-memory, Redis)
//! - A repository provider attached to every request

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
