//! Best-effort coercion of pipeline output into a table.
//!
//! Agent output is produced by a language model, so nothing about its shape
//! is guaranteed. Structured values are used directly; free text is scanned
//! for the first embedded JSON object or array that holds records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub const NO_TABULAR_DATA: &str = "No tabular data found in the pipeline output.";

#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Structured(Value),
    Text(String),
}

/// Columns in discovery order, rows as stringified cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        let records: Vec<&Map<String, Value>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| Error::External(e.into()))
    }

    pub fn from_csv(data: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());
        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { columns, rows })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub table: ResultTable,
    /// Set when no tabular data could be recovered. Never fatal.
    pub warning: Option<String>,
}

pub fn normalize(raw: &RawOutput) -> NormalizeOutcome {
    let table = match raw {
        RawOutput::Structured(value) => table_from_value(value),
        RawOutput::Text(text) => extract_json(text).as_ref().and_then(table_from_value),
    };

    match table {
        Some(table) => NormalizeOutcome { table, warning: None },
        None => {
            tracing::warn!("{}", NO_TABULAR_DATA);
            NormalizeOutcome {
                table: ResultTable::default(),
                warning: Some(NO_TABULAR_DATA.to_string()),
            }
        }
    }
}

/// Returns the first JSON fragment in `text` that holds a record or a
/// sequence of records.
pub fn extract_json(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut closes = vec![Close::Unknown; bytes.len()];
    for (start, &byte) in bytes.iter().enumerate() {
        if byte != b'{' && byte != b'[' {
            continue;
        }
        if closes[start] == Close::Unknown {
            scan_brackets(bytes, start, &mut closes);
        }
        let Close::At(end) = closes[start] else {
            continue;
        };
        let candidate = &text[start..=end];
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) if holds_records(&value) => return Some(value),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping JSON candidate at {}: {}", start, e),
        }
    }
    None
}

fn table_from_value(value: &Value) -> Option<ResultTable> {
    match value {
        Value::Array(items) => {
            let records: Vec<&Map<String, Value>> = items.iter().filter_map(as_record).collect();
            if records.is_empty() {
                None
            } else {
                Some(ResultTable::from_records(records))
            }
        }
        Value::Object(_) => as_record(value).map(|record| ResultTable::from_records([record])),
        // Some models answer with the JSON document wrapped in a string.
        Value::String(text) => extract_json(text).as_ref().and_then(table_from_value),
        _ => None,
    }
}

fn as_record(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object().filter(|record| !record.is_empty())
}

fn holds_records(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| as_record(item).is_some()),
        Value::Object(_) => as_record(value).is_some(),
        _ => false,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Close {
    Unknown,
    At(usize),
    Never,
}

/// Matches the bracket at `start`, skipping string literals.
///
/// Every bracket opened outside a string during the scan is resolved too, since
/// a scan starting from it would see the same bytes. Each byte is therefore
/// scanned once per string context instead of once per opening bracket.
fn scan_brackets(bytes: &[u8], start: usize, closes: &mut [Close]) {
    let mut open: Vec<(u8, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        let position = start + offset;
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => open.push((b'}', position)),
            b'[' => open.push((b']', position)),
            b'}' | b']' => match open.pop() {
                Some((expected, opened)) if expected == byte => {
                    closes[opened] = Close::At(position);
                    if open.is_empty() {
                        return;
                    }
                }
                Some((_, opened)) => {
                    closes[opened] = Close::Never;
                    break;
                }
                None => break,
            },
            _ => {}
        }
    }

    for (_, opened) in open {
        closes[opened] = Close::Never;
    }
}
