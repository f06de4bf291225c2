use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use super::aggregate::{compute_aggregate, Snapshot};
use super::timeline::compute_aggregate_timeline;
use crate::db::PostingSource;
use crate::pricing::{valuate_postings, MarketValuator};

/// Allocation snapshot as of "now" plus the daily history leading to it
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    pub aggregates: Snapshot,
    pub aggregates_timeline: Vec<Snapshot>,
}

impl AllocationReport {
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}

/// Load postings, value them at `now`, and build snapshot and timeline.
pub fn generate_allocation<S, V>(
    source: &S,
    valuator: &V,
    now: NaiveDateTime,
) -> Result<AllocationReport>
where
    S: PostingSource + ?Sized,
    V: MarketValuator + ?Sized,
{
    let postings = source.postings().context("Failed to load postings")?;
    info!("Valuing {} postings as of {}", postings.len(), now);

    let valued = valuate_postings(&postings, valuator, now).context("Failed to value postings")?;

    let aggregates = compute_aggregate(&valued, now.date());
    let aggregates_timeline = compute_aggregate_timeline(&valued, now);

    Ok(AllocationReport {
        aggregates,
        aggregates_timeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Posting;
    use crate::error::AllocationError;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Values every posting at twice its amount
    struct Doubling;

    impl MarketValuator for Doubling {
        fn market_amount(&self, posting: &Posting, _at: NaiveDateTime) -> Result<Decimal> {
            Ok(posting.amount * Decimal::TWO)
        }
    }

    struct Failing;

    impl MarketValuator for Failing {
        fn market_amount(&self, posting: &Posting, _at: NaiveDateTime) -> Result<Decimal> {
            Err(AllocationError::Valuation {
                account: posting.account.clone(),
                date: posting.date,
                message: "no quote".to_string(),
            }
            .into())
        }
    }

    struct Unreachable;

    impl PostingSource for Unreachable {
        fn postings(&self) -> Result<Vec<Posting>> {
            Err(AllocationError::PostingSource("unreachable".to_string()).into())
        }
    }

    #[test]
    fn test_report_combines_snapshot_and_timeline() {
        let postings = vec![
            Posting::new(date(2023, 1, 1), "Asset:Bank", "INR", dec!(100)),
            Posting::new(date(2023, 1, 3), "Asset:Equity:ABC", "ABC", dec!(40)),
        ];
        let now = date(2023, 1, 4).and_time(NaiveTime::MIN);

        let report = generate_allocation(&postings, &Doubling, now).unwrap();

        assert_eq!(report.aggregates.len(), 4);
        assert_eq!(report.aggregates["Asset:Bank"].market_amount, dec!(200));
        assert_eq!(report.aggregates["Asset:Equity:ABC"].market_amount, dec!(80));
        assert_eq!(report.aggregates["Asset:Equity"].market_amount, Decimal::ZERO);
        assert!(report.aggregates.values().all(|a| a.date == now.date()));

        assert_eq!(report.aggregates_timeline.len(), 3);
        assert!(!report.aggregates_timeline[1].contains_key("Asset:Equity:ABC"));
        // Timeline uses the valuation taken at "now"
        assert_eq!(
            report.aggregates_timeline[0]["Asset:Bank"].market_amount,
            dec!(200)
        );
    }

    #[test]
    fn test_empty_source_gives_empty_report() {
        let postings: Vec<Posting> = Vec::new();
        let now = date(2023, 1, 4).and_time(NaiveTime::MIN);
        let report = generate_allocation(&postings, &Doubling, now).unwrap();
        assert!(report.is_empty());
        assert!(report.aggregates_timeline.is_empty());
    }

    #[test]
    fn test_collaborator_failures_are_distinct_errors() {
        let now = date(2023, 1, 4).and_time(NaiveTime::MIN);

        let err = generate_allocation(&Unreachable, &Doubling, now).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::PostingSource(_))
        ));

        let postings = vec![Posting::new(date(2023, 1, 1), "Asset:Bank", "INR", dec!(1))];
        let err = generate_allocation(&postings, &Failing, now).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::Valuation { .. })
        ));
    }

    #[test]
    fn test_report_serializes_with_expected_keys() {
        let postings = vec![Posting::new(date(2023, 1, 1), "Asset:Bank", "INR", dec!(100))];
        let now = date(2023, 1, 2).and_time(NaiveTime::MIN);
        let report = generate_allocation(&postings, &Doubling, now).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        let bank = &json["aggregates"]["Asset:Bank"];
        assert_eq!(bank["account"], "Asset:Bank");
        assert_eq!(bank["date"], "2023-01-02");
        assert_eq!(bank["amount"], "100");
        assert_eq!(bank["market_amount"], "200");
        assert_eq!(json["aggregates_timeline"].as_array().unwrap().len(), 1);
    }
}
