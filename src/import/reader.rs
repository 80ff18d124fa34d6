//! CSV take-off reader
//!
//! Headers are matched case-insensitively, with a few common spellings
//! accepted for each column. Columns with no dedicated field are carried in
//! [`ImportRow::extra`].

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};

use crate::core::error::Severity;
use crate::import::{ImportError, RowIssue};
use crate::progress::resolver::ImportRow;

/// Header row printed by `import --template`
pub const TEMPLATE_HEADERS: &[&str] = &[
    "type",
    "drawing",
    "spool_id",
    "weld_number",
    "commodity_code",
    "size",
    "qty",
    "line",
    "description",
    "area",
    "system",
    "test_package",
];

/// Example rows printed by `import --template`
pub const TEMPLATE_EXAMPLES: &[&[&str]] = &[
    &["Spool", "P-1001", "SP-01", "", "", "", "", "1", "", "A1", "CW", "TP-01"],
    &["Field_Weld", "P-1001", "", "W-001", "", "", "", "2", "", "A1", "CW", "TP-01"],
    &["Valve", "P-1001", "", "", "GV-150", "2\"", "2", "3", "Gate valve", "A1", "CW", "TP-01"],
    &["Threaded_Pipe", "P-1001", "", "", "TP40-CS", "1\"", "50", "4", "", "A1", "CW", "TP-01"],
];

const TYPE: &[&str] = &["type", "component_type", "component type"];
const DRAWING: &[&str] = &["drawing", "drawing_number", "drawing number", "dwg"];
const SPOOL_ID: &[&str] = &["spool_id", "spool id", "spool"];
const WELD_NUMBER: &[&str] = &["weld_number", "weld number", "weld_no", "weld"];
const COMMODITY_CODE: &[&str] = &["commodity_code", "commodity code", "cmdty_code", "cmdty"];
const SIZE: &[&str] = &["size", "nps"];
const QTY: &[&str] = &["qty", "quantity"];
const DESCRIPTION: &[&str] = &["description", "desc"];
const AREA: &[&str] = &["area"];
const SYSTEM: &[&str] = &["system"];
const TEST_PACKAGE: &[&str] = &["test_package", "test package", "test_pkg"];

/// One parsed data row, or the issue that stopped it
pub type RowResult = Result<ImportRow, RowIssue>;

/// Read every data row of a CSV take-off
///
/// `token_column` names the column holding the provenance token. Rows the CSV
/// parser rejects come back as error issues so the remaining rows still import.
pub fn read_rows<R: Read>(reader: R, token_column: &str) -> Result<Vec<RowResult>, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let header_map = build_header_map(&headers);

    for (name, aliases) in [("type", TYPE), ("drawing", DRAWING)] {
        if find_column(&header_map, aliases).is_none() {
            return Err(ImportError::MissingColumn(name.to_string()));
        }
    }

    let token_column = token_column.trim().to_lowercase();
    let known: Vec<&str> = [
        TYPE,
        DRAWING,
        SPOOL_ID,
        WELD_NUMBER,
        COMMODITY_CODE,
        SIZE,
        QTY,
        DESCRIPTION,
        AREA,
        SYSTEM,
        TEST_PACKAGE,
    ]
    .concat();

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row = row_idx + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows.push(Err(RowIssue {
                    row,
                    severity: Severity::Error,
                    message: format!("CSV parse error: {}", e),
                }));
                continue;
            }
        };

        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let field = |aliases: &[&str]| get_any(&record, &header_map, aliases);

        let mut extra = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let key = header.trim().to_lowercase();
            if key.is_empty() || key == token_column || known.contains(&key.as_str()) {
                continue;
            }
            if let Some(value) = record.get(i).filter(|v| !v.is_empty()) {
                extra.insert(header.trim().to_string(), value.to_string());
            }
        }

        rows.push(Ok(ImportRow {
            row,
            component_type: field(TYPE).unwrap_or_default(),
            drawing: field(DRAWING).unwrap_or_default(),
            spool_id: field(SPOOL_ID),
            weld_number: field(WELD_NUMBER),
            commodity_code: field(COMMODITY_CODE),
            size: field(SIZE),
            qty: field(QTY),
            token: get_field(&record, &header_map, &token_column),
            description: field(DESCRIPTION),
            area: field(AREA),
            system: field(SYSTEM),
            test_package: field(TEST_PACKAGE),
            extra,
        }));
    }

    Ok(rows)
}

/// Build a map from lower-cased header names to column indices
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

/// Get a non-empty field value from a CSV record
fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn get_any(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    aliases: &[&str],
) -> Option<String> {
    aliases
        .iter()
        .find_map(|a| get_field(record, header_map, a))
}
