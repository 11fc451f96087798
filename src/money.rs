// 💵 Money helpers - Decimal in memory, REAL on disk
//
// Amounts never go through float arithmetic once loaded. The SQLite
// layout keeps REAL columns, so conversion happens only at the row edge.
// Sums and differences of amounts use checked arithmetic: overflow is an
// error, never a panic.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{FinanceError, Result};

/// Largest magnitude accepted from user input: 999,999,999,999.99
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Parse a user-entered amount ("12.50", " 3 ").
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let value = Decimal::from_str(input.trim())
        .map_err(|_| FinanceError::validation("Invalid amount. Please enter a number."))?;

    if value.abs() > max_amount() {
        return Err(FinanceError::validation(format!(
            "Amount is too large. The limit is {}.",
            format_money(max_amount())
        )));
    }
    Ok(value)
}

pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or(FinanceError::Overflow)
}

pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b).ok_or(FinanceError::Overflow)
}

pub fn checked_sum<I>(values: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, checked_add)
}

/// Convert a stored REAL into a Decimal.
///
/// Goes through the shortest round-trip text of the float, so a value
/// written as 19.99 reads back as exactly 19.99. `None` for NaN/inf and
/// for values outside the Decimal range.
pub fn from_real(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Convert a Decimal into the REAL written to SQLite (nearest double).
///
/// Refuses values whose stored double would not read back as a Decimal.
pub fn to_real(value: Decimal) -> Result<f64> {
    let out_of_range = || FinanceError::validation(format!("Amount {} is out of range.", value));

    let real = f64::from_str(&value.to_string()).map_err(|_| out_of_range())?;
    if from_real(real).is_none() {
        return Err(out_of_range());
    }
    Ok(real)
}

/// Render an amount as `$1,234.56` (or `-$20.00`).
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50").unwrap(), dec!(12.50));
        assert_eq!(parse_amount("  7 ").unwrap(), dec!(7));
        assert_eq!(parse_amount("-3.25").unwrap(), dec!(-3.25));

        let err = parse_amount("twelve").unwrap_err();
        assert!(matches!(err, FinanceError::Validation(_)));
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_parse_amount_caps_magnitude() {
        assert_eq!(parse_amount("999999999999.99").unwrap(), max_amount());
        assert_eq!(parse_amount("-999999999999.99").unwrap(), -max_amount());

        for input in ["1000000000000", "-1000000000000", "50000000000000000000000000000"] {
            let err = parse_amount(input).unwrap_err();
            assert!(matches!(err, FinanceError::Validation(_)));
            assert_eq!(
                err.to_string(),
                "Amount is too large. The limit is $999,999,999,999.99."
            );
        }
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        assert_eq!(checked_add(dec!(1.5), dec!(2)).unwrap(), dec!(3.5));
        assert_eq!(checked_sub(dec!(1), dec!(3)).unwrap(), dec!(-2));
        assert_eq!(checked_sum([dec!(0.1), dec!(0.2)]).unwrap(), dec!(0.3));
        assert_eq!(checked_sum(Vec::new()).unwrap(), Decimal::ZERO);

        assert!(matches!(checked_add(Decimal::MAX, dec!(1)), Err(FinanceError::Overflow)));
        assert!(matches!(checked_sub(Decimal::MIN, dec!(1)), Err(FinanceError::Overflow)));
        assert!(matches!(
            checked_sum([Decimal::MAX, Decimal::MAX]),
            Err(FinanceError::Overflow)
        ));
    }

    #[test]
    fn test_real_conversion_keeps_short_form() {
        assert_eq!(from_real(0.1).unwrap(), dec!(0.1));
        assert_eq!(from_real(50.0).unwrap(), dec!(50));
        assert!(from_real(f64::NAN).is_none());

        let sum = from_real(0.1).unwrap() + from_real(0.2).unwrap();
        assert_eq!(sum, dec!(0.3));

        let stored = to_real(dec!(19.99)).unwrap();
        assert_eq!(from_real(stored).unwrap(), dec!(19.99));
        assert!(from_real(f64::INFINITY).is_none());
        assert!(from_real(1e300).is_none());
    }

    #[test]
    fn test_to_real_refuses_values_that_cannot_be_read_back() {
        let err = to_real(Decimal::MAX).unwrap_err();
        assert!(matches!(err, FinanceError::Validation(_)));
        assert!(err.to_string().contains("out of range"));

        let stored = to_real(max_amount()).unwrap();
        assert_eq!(from_real(stored).unwrap(), max_amount());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(0)), "$0.00");
        assert_eq!(format_money(dec!(5)), "$5.00");
        assert_eq!(format_money(dec!(999.999)), "$1,000.00");
        assert_eq!(format_money(dec!(1234.5)), "$1,234.50");
        assert_eq!(format_money(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(dec!(-20)), "-$20.00");
        assert_eq!(format_money(dec!(-0.001)), "$0.00");
    }
}
