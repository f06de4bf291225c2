//! Hierarchical account aggregation
//!
//! Rolls a flat list of postings into one entry per account path plus one
//! entry per ancestor prefix of that path. Ancestor entries are placeholders:
//! they stay at zero unless some posting targets the ancestor path exactly,
//! and even then they carry only that exact account's own sum.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::{Posting, ACCOUNT_SEPARATOR};

/// Totals for one account path as of a reference date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub date: NaiveDate,
    pub account: String,
    pub amount: Decimal,
    pub market_amount: Decimal,
}

impl Aggregate {
    fn placeholder(account: &str, date: NaiveDate) -> Self {
        Self {
            date,
            account: account.to_string(),
            amount: Decimal::ZERO,
            market_amount: Decimal::ZERO,
        }
    }
}

/// Account path -> aggregate. Iteration order is unspecified.
pub type Snapshot = HashMap<String, Aggregate>;

/// Every non-empty prefix of an account path, shortest first.
///
/// `"Asset:Bank:Checking"` yields `["Asset", "Asset:Bank", "Asset:Bank:Checking"]`.
/// A path without a separator is its own single prefix.
pub fn account_prefixes(account: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    for (idx, ch) in account.char_indices() {
        if ch == ACCOUNT_SEPARATOR {
            prefixes.push(account[..idx].to_string());
        }
    }
    prefixes.push(account.to_string());
    prefixes
}

/// Aggregate postings per account and per ancestor prefix, stamped with `date`.
pub fn compute_aggregate(postings: &[Posting], date: NaiveDate) -> Snapshot {
    let mut by_account: HashMap<&str, (Decimal, Decimal)> = HashMap::new();
    for posting in postings {
        let totals = by_account
            .entry(posting.account.as_str())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        totals.0 += posting.amount;
        totals.1 += posting.market_amount;
    }

    let mut result = Snapshot::with_capacity(by_account.len());
    for (account, (amount, market_amount)) in by_account {
        for prefix in account_prefixes(account) {
            result
                .entry(prefix)
                .or_insert_with_key(|key| Aggregate::placeholder(key, date));
        }

        result.insert(
            account.to_string(),
            Aggregate {
                date,
                account: account.to_string(),
                amount,
                market_amount,
            },
        );
    }

    result
}
