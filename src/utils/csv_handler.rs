//! 交易 CSV 导出
//!
//! 列布局与导入识别的表头一致，导出的文件可以直接再导入。

use chrono::Utc;
use csv::WriterBuilder;
use serde::Serialize;

use crate::errors::{FintrackError, Result};
use crate::storage::Transaction;

/// CSV 行数据结构（仅用于序列化）
#[derive(Debug, Clone, Serialize)]
pub struct CsvTransactionRow {
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub description: String,
}

impl CsvTransactionRow {
    pub fn new(tx: &Transaction, category: Option<&str>) -> Self {
        Self {
            date: tx.date.format("%Y-%m-%d").to_string(),
            kind: tx.kind.to_string(),
            amount: format!("{:.2}", tx.amount),
            category: category.unwrap_or_default().to_string(),
            description: tx.description.clone(),
        }
    }
}

/// 序列化为带表头的 CSV 字节
pub fn transactions_to_csv(rows: &[(Transaction, Option<String>)]) -> Result<Vec<u8>> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);

    // 空结果也输出表头
    csv_writer.write_record(["date", "kind", "amount", "category", "description"])?;
    for (tx, category) in rows {
        csv_writer.serialize(CsvTransactionRow::new(tx, category.as_deref()))?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| FintrackError::serialization(format!("Failed to finalize CSV: {}", e.error())))
}

/// 生成默认导出文件名（带时间戳）
pub fn generate_export_filename() -> String {
    format!(
        "transactions_export_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}
