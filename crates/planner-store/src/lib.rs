//! # planner-store
//!
//! Durable storage for saved schedules and account profiles, backed by
//! SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Every schedule query is scoped by the owning account; a record
//! belonging to someone else behaves exactly like a missing one.

pub mod accounts;
pub mod database;
pub mod migrations;
pub mod models;
pub mod schedules;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
