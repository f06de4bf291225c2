//! Error handling for allocation reports
//!
//! Defines the crate's error kinds and a unified Result type using anyhow
//! for context chaining. Collaborator failures (posting retrieval, market
//! valuation) get their own variants so callers can tell them apart from
//! configuration or input problems.

use thiserror::Error;

/// Core error types for allocation operations
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("posting source error: {0}")]
    PostingSource(String),

    #[error("valuation error for {account} on {date}: {message}")]
    Valuation {
        account: String,
        date: chrono::NaiveDate,
        message: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for allocation operations
pub type Result<T> = anyhow::Result<T>;
