//! Allocation - ledger asset allocation reports
//!
//! Aggregates ledger postings per account and per every ancestor of the
//! account path, both as of "now" and for each day since the first posting.
//! Postings and price history live in SQLite; market values come from the
//! stored prices.

pub mod cli;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod importers;
pub mod pricing;
pub mod reports;
pub mod utils;
