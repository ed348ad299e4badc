//! 金额工具
//!
//! 数据库中金额以最小货币单位（分）存储为 i64，对外以两位小数的 `Decimal` 表示。

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{FintrackError, Result};

/// 单笔金额上限（1e12）
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// 四舍五入到两位小数
pub fn normalize(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Decimal → 分
pub fn to_cents(amount: Decimal) -> Result<i64> {
    (normalize(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| FintrackError::validation(format!("Amount out of range: {}", amount)))
}

/// 分 → Decimal
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// 校验金额为正且不超过上限，返回规范化后的值
pub fn validate_positive(amount: Decimal, field: &str) -> Result<Decimal> {
    let amount = normalize(amount);
    if amount <= Decimal::ZERO {
        return Err(FintrackError::validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(FintrackError::validation(format!(
            "{} must not exceed {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(amount)
}

/// 校验金额非负
pub fn validate_non_negative(amount: Decimal, field: &str) -> Result<Decimal> {
    let amount = normalize(amount);
    if amount < Decimal::ZERO {
        return Err(FintrackError::validation(format!(
            "{} must not be negative",
            field
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(FintrackError::validation(format!(
            "{} must not exceed {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(amount)
}

/// 百分比：part / whole * 100，保留两位小数；whole 为 0 时返回 0
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    normalize(part * Decimal::ONE_HUNDRED / whole)
}

/// 按币种格式化金额，如 `$1,234.50`、`CHF 12.00`
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let amount = normalize(amount);
    let negative = amount.is_sign_negative() && !amount.is_zero();
    let abs = amount.abs();

    let text = format!("{:.2}", abs);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    match currency_symbol(currency) {
        Some(symbol) => format!("{}{}{}.{}", sign, symbol, grouped, frac_part),
        None => format!("{}{} {}.{}", sign, currency, grouped, frac_part),
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" | "CNY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(dec("12.34")).unwrap(), 1234);
        assert_eq!(to_cents(dec("0.005")).unwrap(), 1);
        assert_eq!(from_cents(1234), dec("12.34"));
        assert_eq!(from_cents(-50), dec("-0.50"));
    }

    #[test]
    fn test_validate_positive_rejects_zero_and_negative() {
        assert!(validate_positive(dec("0"), "amount").is_err());
        assert!(validate_positive(dec("-1.00"), "amount").is_err());
        // 四舍五入后为 0 也拒绝
        assert!(validate_positive(dec("0.004"), "amount").is_err());
        assert_eq!(validate_positive(dec("9.999"), "amount").unwrap(), dec("10.00"));
    }

    #[test]
    fn test_validate_positive_rejects_too_large() {
        assert_eq!(MAX_AMOUNT, dec("1000000000000"));
        assert!(validate_positive(dec("1000000000000.01"), "amount").is_err());
        assert!(validate_positive(dec("1000000000000"), "amount").is_ok());
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("50"), dec("200")), dec("25"));
        assert_eq!(percent_of(dec("1"), dec("3")), dec("33.33"));
        assert_eq!(percent_of(dec("5"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec("1234.5"), "USD"), "$1,234.50");
        assert_eq!(format_money(dec("0"), "EUR"), "€0.00");
        assert_eq!(format_money(dec("1234567.891"), "CHF"), "CHF 1,234,567.89");
        assert_eq!(format_money(dec("-12"), "GBP"), "-£12.00");
        assert_eq!(format_money(dec("999"), "USD"), "$999.00");
    }
}
