//! 表头到字段的映射

/// 导入识别的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Amount,
    Description,
    Category,
    Kind,
    Debit,
    Credit,
}

const ALIASES: &[(Field, &[&str])] = &[
    (Field::Date, &["date", "transaction date", "posted", "posted date", "posting date"]),
    (Field::Amount, &["amount", "value", "sum"]),
    (Field::Description, &["description", "memo", "note", "notes", "payee"]),
    (Field::Category, &["category"]),
    (Field::Kind, &["type", "kind"]),
    (Field::Debit, &["debit", "withdrawal", "money out"]),
    (Field::Credit, &["credit", "deposit", "money in"]),
];

/// 统一表头写法：小写、下划线/连字符视为空格、折叠空白
fn canonical(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn field_for_header(header: &str) -> Option<Field> {
    let name = canonical(header);
    ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&name.as_str()))
        .map(|(field, _)| *field)
}

/// 每个字段对应的列下标，同名列取第一个
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub amount: Option<usize>,
    pub description: Option<usize>,
    pub category: Option<usize>,
    pub kind: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Self {
        let mut map = ColumnMap::default();
        for (index, header) in headers.iter().enumerate() {
            let Some(field) = field_for_header(header) else {
                continue;
            };
            let slot = match field {
                Field::Date => &mut map.date,
                Field::Amount => &mut map.amount,
                Field::Description => &mut map.description,
                Field::Category => &mut map.category,
                Field::Kind => &mut map.kind,
                Field::Debit => &mut map.debit,
                Field::Credit => &mut map.credit,
            };
            slot.get_or_insert(index);
        }
        map
    }

    pub fn has_split_amount(&self) -> bool {
        self.debit.is_some() || self.credit.is_some()
    }

    /// 缺失的必需列（date，以及 amount 或 debit/credit）
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("date");
        }
        if self.amount.is_none() && !self.has_split_amount() {
            missing.push("amount");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        assert_eq!(field_for_header("Transaction_Date"), Some(Field::Date));
        assert_eq!(field_for_header("  POSTED "), Some(Field::Date));
        assert_eq!(field_for_header("Payee"), Some(Field::Description));
        assert_eq!(field_for_header("Type"), Some(Field::Kind));
        assert_eq!(field_for_header("balance"), None);
    }

    #[test]
    fn test_column_map_first_match_wins() {
        let map = ColumnMap::from_headers(&headers(&["Date", "Memo", "Amount", "Note"]));
        assert_eq!(map.date, Some(0));
        assert_eq!(map.description, Some(1));
        assert_eq!(map.amount, Some(2));
        assert!(map.missing_required().is_empty());
    }

    #[test]
    fn test_split_amount_columns_satisfy_amount() {
        let map = ColumnMap::from_headers(&headers(&["posted", "Debit", "Credit"]));
        assert!(map.has_split_amount());
        assert!(map.missing_required().is_empty());
    }

    #[test]
    fn test_missing_required() {
        let map = ColumnMap::from_headers(&headers(&["description", "category"]));
        assert_eq!(map.missing_required(), vec!["date", "amount"]);
    }
}
