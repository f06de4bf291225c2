// Pricing module - market valuation of postings from stored price history

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;

use crate::db::{self, Posting};
use crate::error::AllocationError;

/// Computes the market-equivalent amount of a posting at a reference time.
///
/// Implementations must be deterministic for a given input and must not
/// touch the posting's identity fields.
pub trait MarketValuator {
    fn market_amount(&self, posting: &Posting, at: NaiveDateTime) -> Result<Decimal>;
}

/// Valuator backed by the `prices` table.
///
/// Postings in the default currency are worth their ledger amount. Other
/// commodities are worth `quantity * price`, using the latest price on or
/// before the reference date; without any price the ledger amount is used.
pub struct PriceHistoryValuator<'a> {
    conn: &'a Connection,
    default_currency: String,
    cache: RefCell<HashMap<(String, chrono::NaiveDate), Option<Decimal>>>,
}

impl<'a> PriceHistoryValuator<'a> {
    pub fn new(conn: &'a Connection, default_currency: impl Into<String>) -> Self {
        Self {
            conn,
            default_currency: default_currency.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn price_on_or_before(
        &self,
        commodity: &str,
        date: chrono::NaiveDate,
    ) -> Result<Option<Decimal>> {
        let key = (commodity.to_string(), date);
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(*cached);
        }

        let price = db::get_price_on_or_before(self.conn, commodity, date)?.map(|p| p.value);
        debug!("Price for {} on or before {}: {:?}", commodity, date, price);
        self.cache.borrow_mut().insert(key, price);
        Ok(price)
    }
}

impl MarketValuator for PriceHistoryValuator<'_> {
    fn market_amount(&self, posting: &Posting, at: NaiveDateTime) -> Result<Decimal> {
        if posting.commodity == self.default_currency {
            return Ok(posting.amount);
        }

        let price = self
            .price_on_or_before(&posting.commodity, at.date())
            .map_err(|e| AllocationError::Valuation {
                account: posting.account.clone(),
                date: posting.date,
                message: format!("{:#}", e),
            })?;

        Ok(match price {
            Some(price) => posting.quantity * price,
            None => posting.amount,
        })
    }
}

/// Attach a market amount to every posting, valued at `at`.
///
/// Returns copies; the input slice is left untouched and order is kept.
pub fn valuate_postings<V>(postings: &[Posting], valuator: &V, at: NaiveDateTime) -> Result<Vec<Posting>>
where
    V: MarketValuator + ?Sized,
{
    postings
        .iter()
        .map(|p| Ok(p.valued(valuator.market_amount(p, at)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Price;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    fn price_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::apply_schema(&conn).unwrap();
        db::insert_price(&conn, &Price::new("ABC", date(2023, 1, 1), dec!(10))).unwrap();
        db::insert_price(&conn, &Price::new("ABC", date(2023, 6, 1), dec!(15))).unwrap();
        conn
    }

    #[test]
    fn test_default_currency_is_valued_at_amount() {
        let conn = price_db();
        let valuator = PriceHistoryValuator::new(&conn, "INR");
        let p = Posting::new(date(2023, 1, 1), "Asset:Bank", "INR", dec!(250.50));
        assert_eq!(valuator.market_amount(&p, at(2024, 1, 1)).unwrap(), dec!(250.50));
    }

    #[test]
    fn test_commodity_uses_latest_price_before_reference() {
        let conn = price_db();
        let valuator = PriceHistoryValuator::new(&conn, "INR");
        let p = Posting::new(date(2023, 1, 1), "Asset:Equity:ABC", "ABC", dec!(100))
            .with_quantity(dec!(10));

        assert_eq!(valuator.market_amount(&p, at(2023, 3, 1)).unwrap(), dec!(100));
        assert_eq!(valuator.market_amount(&p, at(2023, 7, 1)).unwrap(), dec!(150));
    }

    #[test]
    fn test_missing_price_falls_back_to_amount() {
        let conn = price_db();
        let valuator = PriceHistoryValuator::new(&conn, "INR");
        let p = Posting::new(date(2023, 1, 1), "Asset:Equity:XYZ", "XYZ", dec!(42))
            .with_quantity(dec!(3));
        assert_eq!(valuator.market_amount(&p, at(2023, 3, 1)).unwrap(), dec!(42));

        // Before the first known price as well
        let abc = Posting::new(date(2022, 1, 1), "Asset:Equity:ABC", "ABC", dec!(7))
            .with_quantity(dec!(1));
        assert_eq!(valuator.market_amount(&abc, at(2022, 6, 1)).unwrap(), dec!(7));
    }

    #[test]
    fn test_valuation_failure_is_a_valuation_error() {
        let conn = Connection::open_in_memory().unwrap();
        let valuator = PriceHistoryValuator::new(&conn, "INR");
        let p = Posting::new(date(2023, 1, 1), "Asset:Equity:ABC", "ABC", dec!(1));
        let err = valuator.market_amount(&p, at(2023, 1, 1)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::Valuation { .. })
        ));
    }

    #[test]
    fn test_valuate_postings_keeps_order_and_input() {
        let conn = price_db();
        let valuator = PriceHistoryValuator::new(&conn, "INR");
        let postings = vec![
            Posting::new(date(2023, 1, 1), "Asset:Bank", "INR", dec!(5)),
            Posting::new(date(2023, 1, 2), "Asset:Equity:ABC", "ABC", dec!(20))
                .with_quantity(dec!(2)),
        ];

        let valued = valuate_postings(&postings, &valuator, at(2023, 6, 2)).unwrap();
        assert_eq!(valued.len(), 2);
        assert_eq!(valued[0].market_amount, dec!(5));
        assert_eq!(valued[1].market_amount, dec!(30));
        assert_eq!(valued[1].amount, dec!(20));
        assert!(postings.iter().all(|p| p.market_amount == Decimal::ZERO));
    }
}
