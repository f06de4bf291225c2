#![allow(dead_code)]

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn db_path(home: &TempDir) -> PathBuf {
    home.path().join(".allocation").join("data.db")
}

pub fn open_conn(home: &TempDir) -> Result<Connection> {
    let path = db_path(home);
    Connection::open(path).context("failed to open test database")
}

pub fn count_postings(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_prices(conn: &Connection, commodity: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM prices WHERE commodity = ?1",
        [commodity],
        |row| row.get(0),
    )?;
    Ok(count)
}
