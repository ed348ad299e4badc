//! 请求字段校验
//!
//! 所有校验函数返回规范化后的值（去除首尾空白、统一大小写等）

use url::Url;

use crate::errors::{FintrackError, Result};

/// 规范化并校验邮箱：去空白、转小写、`local@domain.tld` 形式
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() || email.len() > 255 {
        return Err(FintrackError::validation("Invalid email address"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(FintrackError::validation("Invalid email address"));
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !domain.contains('@');

    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(FintrackError::validation("Invalid email address"));
    }

    Ok(email)
}

/// 三位大写字母的币种代码，小写输入会被转换
pub fn normalize_currency(currency: &str) -> Result<String> {
    let currency = currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(FintrackError::validation(
            "Currency must be a 3-letter ISO code",
        ));
    }
    Ok(currency)
}

/// `#rrggbb` 颜色，统一为小写
pub fn normalize_color(color: &str) -> Result<String> {
    let color = color.trim().to_ascii_lowercase();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(FintrackError::validation(
            "Color must be a hex value like #1a2b3c",
        ));
    }
    Ok(color)
}

/// 去空白后长度在 1..=max 之间的名称
pub fn normalize_name(value: &str, field: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FintrackError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(FintrackError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// 可选的长文本字段，超长时报错
pub fn normalize_text(value: Option<&str>, field: &str, max: usize) -> Result<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.chars().count() > max {
        return Err(FintrackError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Web Push 订阅端点，只接受 https
pub fn validate_push_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(FintrackError::validation("Subscription endpoint is required"));
    }
    if endpoint.len() > 512 {
        return Err(FintrackError::validation("Subscription endpoint is too long"));
    }

    let url = Url::parse(endpoint)
        .map_err(|e| FintrackError::validation(format!("Invalid endpoint URL: {}", e)))?;
    if url.scheme() != "https" || url.host_str().is_none() {
        return Err(FintrackError::validation(
            "Subscription endpoint must be an https URL",
        ));
    }

    Ok(endpoint.to_string())
}
