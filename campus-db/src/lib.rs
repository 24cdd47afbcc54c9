//! Database layer for the campus portal
//!
//! Provides persistence for users, letter requests, and the append-only
//! workflow history.

pub mod db;
pub mod error;
pub mod models;
pub mod repos;

pub use db::Database;
pub use error::{Error, Result};
pub use models::{LetterRequestRecord, UserRecord, WorkflowHistoryRecord};
pub use repos::{LetterRequestRepository, UserRepository, WorkflowHistoryRepository};
