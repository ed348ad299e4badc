//! 读取上传文件为二维表
//!
//! CSV 使用 `csv` crate，XLSX / XLS / ODS 使用 `calamine`，只读取第一个工作表。
//! 第一行视为表头。

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use csv::ReaderBuilder;

use crate::errors::{FintrackError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

/// 单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 文本形式（数字按原样输出）
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// 数据行，不含表头
    pub rows: Vec<Vec<Cell>>,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 先看扩展名，无法判断时看文件头
pub fn detect_format(filename: Option<&str>, bytes: &[u8]) -> Result<FileFormat> {
    let extension = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") | Some("txt") => return Ok(FileFormat::Csv),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => {
            return Ok(FileFormat::Spreadsheet);
        }
        _ => {}
    }

    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Ok(FileFormat::Spreadsheet);
    }
    if std::str::from_utf8(strip_bom(bytes)).is_ok() {
        return Ok(FileFormat::Csv);
    }

    Err(FintrackError::import_format(
        "Unsupported file type. Upload a CSV, XLSX, XLS or ODS file",
    ))
}

pub fn read_table(format: FileFormat, bytes: &[u8]) -> Result<RawTable> {
    let table = match format {
        FileFormat::Csv => read_csv(bytes)?,
        FileFormat::Spreadsheet => read_spreadsheet(bytes)?,
    };

    if table.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(FintrackError::import_format("The file has no header row"));
    }
    Ok(table)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// 根据首行猜测分隔符（逗号、分号、制表符）
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|d| first_line.iter().filter(|b| *b == d).count())
        .filter(|d| first_line.contains(d))
        .unwrap_or(b',')
}

fn read_csv(bytes: &[u8]) -> Result<RawTable> {
    let bytes = strip_bom(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(sniff_delimiter(bytes))
        .from_reader(bytes);

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Ok(RawTable::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FintrackError::import_format("The workbook contains no sheets"))??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(row) => row.iter().map(|c| data_to_cell(c).as_text()).collect(),
        None => return Ok(RawTable::default()),
    };

    Ok(RawTable {
        headers,
        rows: rows.map(|row| row.iter().map(data_to_cell).collect()).collect(),
    })
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::Date(datetime.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::Error(e) => Cell::Text(format!("#{}", e)),
    }
}
