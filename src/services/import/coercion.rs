//! 单元格类型转换：日期、金额、收支类型
//!
//! 错误以字符串返回，由调用方附上行号。

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::str::FromStr;

use super::reader::Cell;
use crate::storage::TransactionKind;
use crate::utils::money::normalize;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// 电子表格日期序列号的合法范围（1900-01-01 ..= 9999-12-31）
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 1.0..=2_958_465.0;

/// 电子表格序列号 → 日期（1900 日期系统，以 1899-12-30 为零点）
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

pub fn parse_date(cell: &Cell) -> Result<NaiveDate, String> {
    match cell {
        Cell::Empty => Err("Date is required".to_string()),
        Cell::Date(date) => Ok(*date),
        Cell::Number(n) => {
            date_from_serial(*n).ok_or_else(|| format!("Invalid date serial number: {}", n))
        }
        Cell::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(text: &str) -> Result<NaiveDate, String> {
    if text.is_empty() {
        return Err("Date is required".to_string());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(datetime.date());
        }
    }
    // 以文本形式保存的序列号
    if let Some(date) = text.parse::<f64>().ok().and_then(date_from_serial) {
        return Ok(date);
    }

    Err(format!(
        "Unrecognized date '{}'. Use YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY or DD.MM.YYYY",
        text
    ))
}

/// 解析带符号金额，保留两位小数
///
/// 支持货币符号、千分位、括号负数与前导负号；
/// 同时出现 `.` 和 `,` 时以最后出现的作为小数点。
pub fn parse_amount(cell: &Cell) -> Result<Decimal, String> {
    match cell {
        Cell::Empty => Err("Amount is required".to_string()),
        Cell::Number(n) => Decimal::from_f64(*n)
            .map(normalize)
            .ok_or_else(|| format!("Invalid amount: {}", n)),
        Cell::Date(_) => Err("Amount must be a number".to_string()),
        Cell::Text(text) => parse_amount_text(text.trim()),
    }
}

fn parse_amount_text(text: &str) -> Result<Decimal, String> {
    if text.is_empty() {
        return Err("Amount is required".to_string());
    }

    let parenthesized = text.starts_with('(') && text.ends_with(')');
    let mut negative = parenthesized;

    let mut digits = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '0'..='9' | '.' | ',' => digits.push(ch),
            '-' | '−' => {
                // 负号只能出现在数字之前
                if !digits.is_empty() {
                    return Err(format!("Invalid amount '{}'", text));
                }
                negative = true;
            }
            '(' | ')' if parenthesized => {}
            c if c.is_whitespace() || c == '+' || c == '\'' => {}
            c if c.is_alphabetic() || is_currency_symbol(c) => {}
            _ => return Err(format!("Invalid amount '{}'", text)),
        }
    }

    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid amount '{}'", text));
    }

    let normalized = normalize_separators(&digits)
        .ok_or_else(|| format!("Invalid amount '{}'", text))?;
    let value = Decimal::from_str(&normalized).map_err(|_| format!("Invalid amount '{}'", text))?;

    Ok(normalize(if negative { -value } else { value }))
}

fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥' | '₹' | '₽' | '₩' | '₺' | '¢')
}

/// 统一为 `.` 作小数点、去掉千分位
fn normalize_separators(digits: &str) -> Option<String> {
    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');

    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) => {
            // 多个点只能是千分位（1.234.567）
            if digits.matches('.').count() > 1 {
                None
            } else {
                Some('.')
            }
        }
        (None, Some(c)) => {
            // 单个逗号且后面 1-2 位数字视为小数逗号（12,50）
            let after = digits.len() - c - 1;
            if digits.matches(',').count() == 1 && (1..=2).contains(&after) {
                Some(',')
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let mut out = String::with_capacity(digits.len());
    let mut seen_decimal = false;
    for (i, ch) in digits.char_indices() {
        let is_decimal = Some(ch) == decimal_sep
            && Some(i) == if ch == '.' { last_dot } else { last_comma };
        if is_decimal {
            if seen_decimal {
                return None;
            }
            seen_decimal = true;
            out.push('.');
        } else if ch.is_ascii_digit() {
            out.push(ch);
        }
    }
    Some(out)
}

/// 收支类型文本
pub fn parse_kind(text: &str) -> Option<TransactionKind> {
    match text.trim().to_lowercase().as_str() {
        "income" | "credit" | "deposit" | "cr" | "in" => Some(TransactionKind::Income),
        "expense" | "debit" | "withdrawal" | "dr" | "out" | "payment" => {
            Some(TransactionKind::Expense)
        }
        _ => None,
    }
}
