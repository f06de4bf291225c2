// Database module - SQLite connection, posting store and price history

pub mod models;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::AllocationError;
pub use models::{Posting, Price, ACCOUNT_SEPARATOR};

/// Supplies the postings a report is computed over.
///
/// Implementations must return postings sorted ascending by date; the
/// timeline builder relies on that ordering.
pub trait PostingSource {
    fn postings(&self) -> Result<Vec<Posting>>;
}

impl PostingSource for [Posting] {
    fn postings(&self) -> Result<Vec<Posting>> {
        Ok(self.to_vec())
    }
}

impl PostingSource for Vec<Posting> {
    fn postings(&self) -> Result<Vec<Posting>> {
        Ok(self.clone())
    }
}

/// Posting source backed by the SQLite store, restricted to one account subtree
pub struct SqlitePostingSource<'a> {
    conn: &'a Connection,
    account_prefix: String,
}

impl<'a> SqlitePostingSource<'a> {
    pub fn new(conn: &'a Connection, account_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            account_prefix: account_prefix.into(),
        }
    }
}

impl PostingSource for SqlitePostingSource<'_> {
    fn postings(&self) -> Result<Vec<Posting>> {
        get_postings_by_account_prefix(self.conn, &self.account_prefix).map_err(|e| {
            AllocationError::PostingSource(format!(
                "failed to load postings under '{}': {:#}",
                self.account_prefix, e
            ))
            .into()
        })
    }
}

/// Get the default database path (~/.allocation/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let data_dir = PathBuf::from(home).join(".allocation");

    std::fs::create_dir_all(&data_dir).context("Failed to create .allocation directory")?;

    Ok(data_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file if needed and runs the schema SQL. Safe to
/// call on every start since all statements are `IF NOT EXISTS`.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;
    apply_schema(&conn)?;

    info!("Database initialized successfully");
    Ok(())
}

/// Run the schema against an already open connection
pub fn apply_schema(conn: &Connection) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;
    Ok(())
}

/// Check if a posting with this fingerprint was already imported
pub fn posting_exists(conn: &Connection, fingerprint: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM postings WHERE fingerprint = ?1",
        [fingerprint],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert posting, returns posting id
pub fn insert_posting(conn: &Connection, posting: &Posting, fingerprint: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO postings (date, account, commodity, quantity, amount, source, fingerprint)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            posting.date,
            posting.account,
            posting.commodity,
            posting.quantity.to_string(),
            posting.amount.to_string(),
            posting.source,
            fingerprint,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Outcome of a batch posting import
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Insert a batch of postings, skipping ones already present.
///
/// Identical rows within one batch are kept apart by their occurrence
/// index, so importing the same file twice is a no-op.
pub fn import_postings(conn: &mut Connection, postings: &[Posting]) -> Result<ImportStats> {
    let tx = conn.transaction()?;
    let mut stats = ImportStats::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for posting in postings {
        let base = posting.fingerprint(0);
        let occurrence = seen.entry(base).or_insert(0);
        let fingerprint = posting.fingerprint(*occurrence);
        *occurrence += 1;

        if posting_exists(&tx, &fingerprint)? {
            stats.skipped += 1;
            continue;
        }
        insert_posting(&tx, posting, &fingerprint)?;
        stats.imported += 1;
    }

    tx.commit()?;
    debug!(
        "Imported {} postings ({} skipped)",
        stats.imported, stats.skipped
    );
    Ok(stats)
}

/// Get postings whose account starts with `prefix`, ordered by date.
///
/// An empty prefix returns every posting.
pub fn get_postings_by_account_prefix(conn: &Connection, prefix: &str) -> Result<Vec<Posting>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, account, commodity, quantity, amount, source
         FROM postings
         WHERE substr(account, 1, length(?1)) = ?1
         ORDER BY date ASC, id ASC",
    )?;

    let postings = stmt
        .query_map([prefix], |row| {
            Ok(Posting {
                id: Some(row.get(0)?),
                date: row.get(1)?,
                account: row.get(2)?,
                commodity: row.get(3)?,
                quantity: get_decimal_value(row, 4)?,
                amount: get_decimal_value(row, 5)?,
                market_amount: Decimal::ZERO,
                source: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(postings)
}

/// Number of stored postings
pub fn count_postings(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
    Ok(count)
}

/// Insert or replace the price of a commodity on a date
pub fn insert_price(conn: &Connection, price: &Price) -> Result<i64> {
    conn.execute(
        "INSERT OR REPLACE INTO prices (commodity, price_date, value, source)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            price.commodity,
            price.price_date,
            price.value.to_string(),
            price.source,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Get the latest price on or before a given date
pub fn get_price_on_or_before(
    conn: &Connection,
    commodity: &str,
    as_of_date: NaiveDate,
) -> Result<Option<Price>> {
    let mut stmt = conn.prepare(
        "SELECT id, commodity, price_date, value, source
         FROM prices
         WHERE commodity = ?1 AND price_date <= ?2
         ORDER BY price_date DESC
         LIMIT 1",
    )?;

    let result = stmt
        .query_row(params![commodity, as_of_date], price_from_row)
        .optional()?;

    Ok(result)
}

/// List stored prices, optionally for one commodity, newest first
pub fn list_prices(conn: &Connection, commodity: Option<&str>) -> Result<Vec<Price>> {
    let mut sql = String::from(
        "SELECT id, commodity, price_date, value, source
         FROM prices",
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(c) = commodity {
        sql.push_str(" WHERE commodity = ?");
        params.push(Box::new(c.to_string()));
    }
    sql.push_str(" ORDER BY commodity ASC, price_date DESC");

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let prices = stmt
        .query_map(param_refs.as_slice(), price_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(prices)
}

fn price_from_row(row: &rusqlite::Row) -> Result<Price, rusqlite::Error> {
    Ok(Price {
        id: Some(row.get(0)?),
        commodity: row.get(1)?,
        price_date: row.get(2)?,
        value: get_decimal_value(row, 3)?,
        source: row.get(4)?,
    })
}

/// Helper to read Decimal from SQLite (handles INTEGER, REAL and TEXT)
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            rusqlite::types::Type::Null,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_init_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        init_database(Some(db_path.clone())).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('postings', 'prices')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 2);
    }

    #[test]
    fn test_postings_come_back_sorted_and_filtered() {
        let mut conn = memory_db();
        let postings = vec![
            Posting::new(date(2023, 3, 1), "Asset:Bank", "INR", dec!(10)),
            Posting::new(date(2023, 1, 1), "Asset:Cash", "INR", dec!(20)),
            Posting::new(date(2023, 2, 1), "Expense:Food", "INR", dec!(5)),
            Posting::new(date(2023, 1, 1), "Assets:Other", "INR", dec!(7)),
        ];
        import_postings(&mut conn, &postings).unwrap();

        let loaded = get_postings_by_account_prefix(&conn, "Asset:").unwrap();
        let accounts: Vec<_> = loaded.iter().map(|p| p.account.as_str()).collect();
        assert_eq!(accounts, vec!["Asset:Cash", "Asset:Bank"]);
        assert!(loaded.iter().all(|p| p.market_amount == Decimal::ZERO));

        let all = get_postings_by_account_prefix(&conn, "").unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_import_is_idempotent_but_keeps_duplicates_within_file() {
        let mut conn = memory_db();
        let p = Posting::new(date(2023, 1, 1), "Asset:Bank", "INR", dec!(100));
        let batch = vec![p.clone(), p.clone()];

        let first = import_postings(&mut conn, &batch).unwrap();
        assert_eq!(first, ImportStats { imported: 2, skipped: 0 });

        let second = import_postings(&mut conn, &batch).unwrap();
        assert_eq!(second, ImportStats { imported: 0, skipped: 2 });
        assert_eq!(count_postings(&conn).unwrap(), 2);
    }

    #[test]
    fn test_decimal_round_trip_through_text() {
        let mut conn = memory_db();
        let p = Posting::new(date(2023, 1, 1), "Asset:Equity:ABC", "ABC", dec!(1234.5678))
            .with_quantity(dec!(0.125));
        import_postings(&mut conn, &[p]).unwrap();

        let loaded = get_postings_by_account_prefix(&conn, "Asset").unwrap();
        assert_eq!(loaded[0].amount, dec!(1234.5678));
        assert_eq!(loaded[0].quantity, dec!(0.125));
        assert_eq!(loaded[0].commodity, "ABC");
    }

    #[test]
    fn test_price_on_or_before() {
        let conn = memory_db();
        insert_price(&conn, &Price::new("ABC", date(2023, 1, 1), dec!(10))).unwrap();
        insert_price(&conn, &Price::new("ABC", date(2023, 1, 10), dec!(12))).unwrap();
        insert_price(&conn, &Price::new("XYZ", date(2023, 1, 5), dec!(99))).unwrap();

        let p = get_price_on_or_before(&conn, "ABC", date(2023, 1, 9)).unwrap().unwrap();
        assert_eq!(p.value, dec!(10));
        let p = get_price_on_or_before(&conn, "ABC", date(2023, 1, 10)).unwrap().unwrap();
        assert_eq!(p.value, dec!(12));
        assert!(get_price_on_or_before(&conn, "ABC", date(2022, 12, 31))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_insert_price_replaces_same_day() {
        let conn = memory_db();
        insert_price(&conn, &Price::new("ABC", date(2023, 1, 1), dec!(10))).unwrap();
        insert_price(&conn, &Price::new("ABC", date(2023, 1, 1), dec!(11))).unwrap();

        let prices = list_prices(&conn, Some("ABC")).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].value, dec!(11));
        assert!(list_prices(&conn, Some("NOPE")).unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_source_reports_failures_as_posting_source_errors() {
        // No schema applied: the query fails
        let conn = Connection::open_in_memory().unwrap();
        let source = SqlitePostingSource::new(&conn, "Asset:");
        let err = source.postings().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::PostingSource(_))
        ));
    }
}
