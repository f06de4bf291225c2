use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hierarchy delimiter used in account paths (`Asset:Bank:Checking`)
pub const ACCOUNT_SEPARATOR: char = ':';

/// A single ledger posting against one account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Posting {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub account: String,
    pub commodity: String,
    pub quantity: Decimal,
    pub amount: Decimal,
    /// Market value attached by valuation; zero until valued
    pub market_amount: Decimal,
    pub source: String, // 'CSV', 'MANUAL'
}

impl Posting {
    /// Posting with `quantity == amount` in the given commodity
    pub fn new(date: NaiveDate, account: &str, commodity: &str, amount: Decimal) -> Self {
        Self {
            id: None,
            date,
            account: account.to_string(),
            commodity: commodity.to_string(),
            quantity: amount,
            amount,
            market_amount: Decimal::ZERO,
            source: "MANUAL".to_string(),
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    /// Copy of this posting carrying the given market amount
    pub fn valued(&self, market_amount: Decimal) -> Self {
        Self {
            market_amount,
            ..self.clone()
        }
    }

    /// Stable identity used to skip re-imported rows.
    ///
    /// `occurrence` distinguishes identical rows inside a single file.
    pub fn fingerprint(&self, occurrence: usize) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.date.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.account.as_bytes());
        hasher.update(b"|");
        hasher.update(self.commodity.as_bytes());
        hasher.update(b"|");
        hasher.update(self.quantity.normalize().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.amount.normalize().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(occurrence.to_string().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Closing price of a commodity on a given date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub id: Option<i64>,
    pub commodity: String,
    pub price_date: NaiveDate,
    pub value: Decimal,
    pub source: String,
}

impl Price {
    pub fn new(commodity: &str, price_date: NaiveDate, value: Decimal) -> Self {
        Self {
            id: None,
            commodity: commodity.to_string(),
            price_date,
            value,
            source: "MANUAL".to_string(),
        }
    }
}
