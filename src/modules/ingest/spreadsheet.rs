use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use thiserror::Error;

/// A single spreadsheet row as header -> cell value pairs.
/// Values are strings, numbers, or the empty string for blank cells.
pub type RowMap = serde_json::Map<String, Value>;

/// What to do when a recognized spreadsheet fails to parse.
///
/// The upload path tolerates parse failures (the file is kept with zero
/// rows); the update path rejects the whole operation. The asymmetry comes
/// from the product behavior and is an explicit per-operation choice here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailurePolicy {
    Tolerate,
    Reject,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
}

/// MIME types treated as Excel workbooks
const EXCEL_MIME_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel.sheet.macroEnabled.12",
    "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
];

const CSV_MIME_TYPES: &[&str] = &["text/csv", "application/csv"];

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn is_csv(mime_type: &str, filename: &str) -> bool {
    CSV_MIME_TYPES.contains(&mime_type) || extension_of(filename) == "csv"
}

/// Whether the content should be parsed as tabular data.
/// Recognized by Excel-family MIME type or .xlsx/.xls/.csv extension.
pub fn is_spreadsheet(mime_type: &str, filename: &str) -> bool {
    if EXCEL_MIME_TYPES.contains(&mime_type) || CSV_MIME_TYPES.contains(&mime_type) {
        return true;
    }
    matches!(extension_of(filename).as_str(), "xlsx" | "xls" | "csv")
}

/// Parse the first sheet of a stored spreadsheet into an ordered sequence
/// of row maps. The first non-empty row supplies the column headers; blank
/// header cells get a synthesized `Column_<n>` name. Missing or blank cells
/// map to the empty string. Fully blank rows are skipped.
pub fn parse_spreadsheet(
    path: &Path,
    mime_type: &str,
    filename: &str,
) -> Result<Vec<RowMap>, IngestError> {
    if is_csv(mime_type, filename) {
        parse_csv(path)
    } else {
        parse_workbook(path)
    }
}

fn parse_workbook(path: &Path) -> Result<Vec<RowMap>, IngestError> {
    let mut workbook = open_workbook_auto(path)?;

    // First sheet only
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoSheets)?
        .map_err(IngestError::Workbook)?;

    let mut raw_rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_value).collect::<Vec<_>>())
        .filter(|cells| !row_is_blank(cells));

    let headers = match raw_rows.next() {
        Some(header_cells) => synthesize_headers(&header_cells),
        None => return Ok(Vec::new()),
    };

    Ok(raw_rows.map(|cells| zip_row(&headers, cells)).collect())
}

fn parse_csv(path: &Path) -> Result<Vec<RowMap>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let cells: Vec<Value> = record.iter().map(csv_cell_to_value).collect();
        if row_is_blank(&cells) {
            continue;
        }
        match &headers {
            None => headers = Some(synthesize_headers(&cells)),
            Some(h) => rows.push(zip_row(h, cells)),
        }
    }

    Ok(rows)
}

/// Derive column names from the header row, synthesizing `Column_<n>`
/// (1-based) for blank header cells.
fn synthesize_headers(cells: &[Value]) -> Vec<String> {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = match cell {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => String::new(),
            };
            if name.is_empty() {
                format!("Column_{}", i + 1)
            } else {
                name
            }
        })
        .collect()
}

/// Map one data row onto the header names. Cells beyond the header width
/// are dropped; missing cells become the empty string.
fn zip_row(headers: &[String], mut cells: Vec<Value>) -> RowMap {
    cells.resize(headers.len(), Value::String(String::new()));

    headers
        .iter()
        .cloned()
        .zip(cells)
        .collect()
}

fn row_is_blank(cells: &[Value]) -> bool {
    cells.iter().all(|c| match c {
        Value::String(s) => s.is_empty(),
        _ => false,
    })
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        Data::Bool(b) => Value::String(b.to_string()),
        Data::DateTime(dt) => Value::String(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::String(String::new()),
    }
}

/// CSV has no cell types; numeric-looking cells become JSON numbers so the
/// row model matches what Excel parsing produces.
fn csv_cell_to_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn test_is_spreadsheet_by_mime_and_extension() {
        assert!(is_spreadsheet(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "whatever.bin"
        ));
        assert!(is_spreadsheet("application/octet-stream", "Report.XLSX"));
        assert!(is_spreadsheet("application/octet-stream", "data.xls"));
        assert!(is_spreadsheet("text/csv", "data"));
        assert!(is_spreadsheet("application/octet-stream", "data.csv"));

        assert!(!is_spreadsheet("application/pdf", "document.pdf"));
        assert!(!is_spreadsheet("text/plain", "notes.txt"));
    }

    #[test]
    fn test_synthesize_headers_fills_blanks() {
        let cells = vec![
            Value::String("Name".to_string()),
            Value::String(String::new()),
            Value::String("Phone".to_string()),
            Value::String("  ".to_string()),
        ];
        assert_eq!(
            synthesize_headers(&cells),
            vec!["Name", "Column_2", "Phone", "Column_4"]
        );
    }

    #[test]
    fn test_csv_rows_match_headers() {
        let file = write_csv("Name,Age,City\nAlice,30,Pune\nBob,25,\n");
        let rows = parse_spreadsheet(file.path(), "text/csv", "people.csv").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].keys().cloned().collect::<Vec<_>>(),
            vec!["Name", "Age", "City"]
        );
        assert_eq!(rows[0]["Name"], Value::String("Alice".to_string()));
        assert_eq!(rows[0]["Age"], Value::Number(30.into()));
        assert_eq!(rows[1]["City"], Value::String(String::new()));
    }

    #[test]
    fn test_csv_blank_rows_and_short_records() {
        let file = write_csv("A,,C\n,,\n1,2\n");
        let rows = parse_spreadsheet(file.path(), "text/csv", "x.csv").unwrap();

        // The all-blank row is dropped; the short record is padded
        assert_eq!(rows.len(), 1);
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["A", "Column_2", "C"]);
        assert_eq!(rows[0]["A"], Value::Number(1.into()));
        assert_eq!(rows[0]["Column_2"], Value::Number(2.into()));
        assert_eq!(rows[0]["C"], Value::String(String::new()));
    }

    #[test]
    fn test_header_only_csv_yields_no_rows() {
        let file = write_csv("Name,Age\n");
        let rows = parse_spreadsheet(file.path(), "text/csv", "x.csv").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"this is not a zip archive").unwrap();

        let result = parse_spreadsheet(
            file.path(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "broken.xlsx",
        );
        assert!(result.is_err());
    }
}
