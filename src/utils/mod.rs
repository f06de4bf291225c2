//! Utility functions for formatting and date parsing
//!
//! Centralized amount formatting keeps tables and summaries consistent.

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Format an amount with thousands separators and two decimals.
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
/// * `commodity` - Optional commodity code printed before the number
///
/// # Examples
/// ```
/// use allocation::utils::format_amount_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with_width(dec!(1234.56), 0, Some("INR")), "INR 1,234.56");
/// assert_eq!(format_amount_with_width(dec!(1234), 12, None), "    1,234.00");
/// ```
pub fn format_amount_with_width(value: Decimal, width: usize, commodity: Option<&str>) -> String {
    let is_negative = value < Decimal::ZERO;
    let abs_value = value.abs();

    let formatted = format!("{:.2}", abs_value);
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut with_separators = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            with_separators.push(',');
        }
        with_separators.push(*c);
    }

    let sign = if is_negative { "-" } else { "" };
    let result = match commodity {
        Some(code) => format!("{} {}{}.{}", code, sign, with_separators, decimal_part),
        None => format!("{}{}.{}", sign, with_separators, decimal_part),
    };

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format number only: "1,234.56"
///
/// # Examples
/// ```
/// use allocation::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(-500)), "-500.00");
/// ```
pub fn format_amount(value: Decimal) -> String {
    format_amount_with_width(value, 0, None)
}

/// Format with commodity code: "INR 1,234.56"
pub fn format_money(value: Decimal, commodity: &str) -> String {
    format_amount_with_width(value, 0, Some(commodity))
}

/// Parse `YYYY-MM-DD`, `YYYY-MM` (last day of month) or `YYYY` (December 31).
pub fn parse_flexible_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(ym) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        let next_month = if ym.month() == 12 {
            NaiveDate::from_ymd_opt(ym.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(ym.year(), ym.month() + 1, 1)
        };
        if let Some(last_day) = next_month.and_then(|nm| nm.pred_opt()) {
            return Ok(last_day);
        }
    }

    if let Ok(year) = s.parse::<i32>() {
        if (1900..=2100).contains(&year) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 12, 31) {
                return Ok(date);
            }
        }
    }

    Err(anyhow!(
        "Invalid date '{}'. Use YYYY-MM-DD, YYYY-MM, or YYYY",
        s
    ))
}
