use serde_json::{Number, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::dataset::{Row, TabularDataset};
use crate::error::LoadError;

/// Parse an uploaded file into rows keyed by its header row
///
/// The file type is chosen from the extension of `filename`. Only the first
/// sheet of a workbook is read. Empty cells are left out of their row and
/// rows without any value are skipped.
///
/// # Arguments
/// * `filename` - Original name of the upload
/// * `bytes` - File contents
///
/// # Returns
/// * `Result<TabularDataset, LoadError>` - The parsed rows or an error
///
/// # Examples
/// ```
/// use sheet_summary::loader::parse_upload;
///
/// let dataset = parse_upload("people.csv", b"Name,Age\nAlice,30\n").unwrap();
/// assert_eq!(dataset.len(), 1);
/// assert_eq!(dataset.columns(), vec!["Name", "Age"]);
/// ```
pub fn parse_upload(filename: &str, bytes: &[u8]) -> Result<TabularDataset, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(bytes),
        #[cfg(feature = "web")]
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => from_excel(bytes),
        #[cfg(not(feature = "web"))]
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => Err(LoadError::UnsupportedExtension(
            "workbook support requires the 'web' feature".to_string(),
        )),
        Some(ext) => Err(LoadError::UnsupportedExtension(ext.to_string())),
        None => Err(LoadError::MissingExtension),
    }
}

/// Parse CSV bytes, first record as header
pub fn from_csv(bytes: &[u8]) -> Result<TabularDataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = unique_headers(reader.headers()?.iter().map(str::to_string));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            if !field.is_empty() {
                row.insert(header.clone(), csv_value(field));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(TabularDataset::new(rows))
}

/// Parse a workbook, reading only its first sheet
#[cfg(feature = "web")]
pub fn from_excel(bytes: &[u8]) -> Result<TabularDataset, LoadError> {
    use calamine::{Data, Reader, open_workbook_auto_from_rs};
    use std::io::Cursor;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(header_row) => unique_headers(header_row.iter().map(|cell| match cell {
            Data::Empty => String::new(),
            other => other.to_string(),
        })),
        None => return Ok(TabularDataset::default()),
    };

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut row = Row::new();
        for (header, cell) in headers.iter().zip(sheet_row.iter()) {
            let value = match cell {
                Data::Empty => continue,
                Data::Int(i) => Value::from(*i),
                Data::Float(f) => float_value(*f),
                Data::Bool(b) => Value::Bool(*b),
                Data::String(s) => Value::String(s.clone()),
                other => Value::String(other.to_string()),
            };
            row.insert(header.clone(), value);
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(TabularDataset::new(rows))
}

/// Header names with blanks and duplicates made unique
///
/// Blank headers become `__EMPTY`, `__EMPTY_1`, ... and repeated names get a
/// `_1`, `_2`, ... suffix.
fn unique_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.map(|name| {
        let base = if name.trim().is_empty() {
            "__EMPTY".to_string()
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        candidate
    })
    .collect()
}

fn csv_value(field: &str) -> Value {
    if let Ok(i) = field.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        if f.is_finite() {
            return float_value(f);
        }
    }
    match field {
        "TRUE" | "true" => Value::Bool(true),
        "FALSE" | "false" => Value::Bool(false),
        _ => Value::String(field.to_string()),
    }
}

// Integral floats become integers so 30.0 renders as 30
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}
