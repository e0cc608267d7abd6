use crate::types::{Record, NOT_AVAILABLE};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};

pub const REGION_COLUMN: &str = "AC";
pub const CITY_COLUMN: &str = "City/Town/Village";
pub const STATUS_COLUMN: &str = "Status";

/// Column positions resolved once from the header row. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    region: Option<usize>,
    city: Option<usize>,
    name: Option<usize>,
    status: Option<usize>,
}

impl Columns {
    pub fn resolve(headers: &StringRecord, name_column: &str) -> Self {
        let exact = |column: &str| headers.iter().position(|h| h == column);
        Self {
            region: headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(REGION_COLUMN)),
            city: exact(CITY_COLUMN),
            name: exact(name_column),
            status: exact(STATUS_COLUMN),
        }
    }
}

/// Trimmed cell value; blank cells and literal sentinels count as absent.
fn clean(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Turn one raw row into a `Record`, or `None` when it has no region code.
pub fn normalize_row(row: &StringRecord, columns: &Columns) -> Option<Record> {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));

    let code = cell(columns.region)?.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }

    Some(Record {
        region_code: code,
        city: clean(cell(columns.city)),
        person_name: clean(cell(columns.name)),
        status: clean(cell(columns.status)),
    })
}

/// Parse a whole CSV document, dropping rows without a code or a person.
pub fn parse_table(text: &str, name_column: &str) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers().context("Failed to read CSV header row")?.clone();
    let columns = Columns::resolve(&headers, name_column);

    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let raw = result.with_context(|| format!("Malformed CSV row {}", line + 2))?;

        match normalize_row(&raw, &columns) {
            Some(record) if record.person_name.is_some() => records.push(record),
            _ => continue,
        }
    }

    Ok(records)
}
