//! Task-board backend: a SQLite-backed task/tag store behind a thin HTTP API.
//!
//! Tasks move between an active board and a paginated, searchable archive;
//! tags are free-text labels owned by their task and removed with it.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod types;
pub mod validate;
