//! Parsing of uploaded header-row files into [`RawRow`]s.
//!
//! The accepted format is deliberately small: UTF-8, comma-delimited, first
//! non-empty line is the header row, every later non-empty line is one row.
//! Cells are trimmed and a pair of surrounding double quotes is removed.
//!
//! ```text
//! text ──► drop blank lines ──► < 2 left? ──► MalformedFile
//!                                   │
//!                                   ▼
//!                     csv tokenize (quoted commas ok)
//!                                   │
//!                                   ▼
//!                    RawRow { line, cells: header → value }
//! ```
use csv::{ReaderBuilder, Trim};

use crate::error::IngestError;
use crate::types::RawRow;

/// Columns of the downloadable template, in order.
pub const TEMPLATE_HEADERS: [&str; 5] = ["Name", "Phone", "Status", "Priority", "project_name"];

/// Parse an uploaded file into raw rows.
///
/// Fails with [`IngestError::MalformedFile`] unless there is a header row and
/// at least one data row. Data lines shorter than the header are padded with
/// empty values; cells beyond the header are ignored.
///
/// ```rust
/// let rows = ingest::parse_table("Name,Phone\n\n\"Asha, K\", 99999 \n").unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].get("Name"), Some("Asha, K"));
/// assert_eq!(rows[0].get("Phone"), Some("99999"));
/// assert_eq!(rows[0].line, 2);
/// ```
pub fn parse_table(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(IngestError::MalformedFile {
            non_empty_lines: lines.len(),
        });
    }

    let joined = lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(joined.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| parse_error(1, &err))?
        .iter()
        .map(clean_cell)
        .collect();

    let mut rows = Vec::with_capacity(lines.len() - 1);
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|err| parse_error(idx + 2, &err))?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 2);

        let mut row = RawRow::new(line);
        for (col, header) in headers.iter().enumerate() {
            let value = record.get(col).map(clean_cell).unwrap_or_default();
            row.push(header.clone(), value);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        // Only reachable when the data lines were swallowed by an unterminated quote.
        return Err(IngestError::MalformedFile { non_empty_lines: 1 });
    }

    tracing::debug!(rows = rows.len(), columns = headers.len(), "table_parsed");
    Ok(rows)
}

/// The CSV template offered to users, with one example row.
pub fn lead_template_csv() -> String {
    let mut out = TEMPLATE_HEADERS.join(",");
    out.push('\n');
    out.push_str("Asha Rao,9999999999,new,high,Skyline Towers\n");
    out
}

fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

fn parse_error(line: usize, err: &csv::Error) -> IngestError {
    IngestError::Parse {
        line,
        message: err.to_string(),
    }
}
