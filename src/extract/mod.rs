//! Extraction of client and server records from one sheet.
//!
//! Rows `0..4` hold the header contract (see [`header`]); every following row
//! is data. Blank cells fall back to the anchor value of the merged range that
//! covers them, non-blank cells are converted with the column's type tag and
//! copied into the record set(s) selected by its routing tag.

pub mod header;
pub mod merge;
pub mod route;

use tracing::{debug, instrument};

use crate::convert::ConverterRegistry;
use crate::error::{Result, ToolError};
use crate::model::{Record, RawSheet, SheetResult};

pub use header::{HEADER_ROWS, IGNORE_MARKER, parse_header};
pub use merge::MergeOverrides;
pub use route::Route;

/// Converts the data rows of `sheet` into client and server records.
#[instrument(level = "debug", skip_all, fields(sheet = %sheet.name))]
pub fn extract_sheet(sheet: &RawSheet, registry: &ConverterRegistry) -> Result<SheetResult> {
    let width = header_width(&sheet.rows);
    let columns = parse_header(&sheet.name, &sheet.rows, width)?;
    let overrides = MergeOverrides::build(&sheet.merged, (sheet.rows.len(), width));
    debug!(
        columns = columns.len(),
        merged_cells = overrides.len(),
        "header parsed"
    );

    let mut result = SheetResult::new(&sheet.name);

    for (row_index, row) in sheet.rows.iter().enumerate().skip(HEADER_ROWS) {
        let mut client = Record::new();
        let mut server = Record::new();

        for column in columns.iter().filter(|column| !column.excluded) {
            let raw = row.get(column.index).map(String::as_str).unwrap_or_default();
            let text = overrides.resolve(row_index, column.index, raw);
            if text.is_empty() {
                continue;
            }

            let value = registry
                .convert(&column.type_tag, text)
                .map_err(|source| ToolError::Conversion {
                    sheet: sheet.name.clone(),
                    cell: cell_reference(row_index, column.index),
                    field: column.name.clone(),
                    type_tag: column.type_tag.clone(),
                    raw: text.to_string(),
                    source,
                })?;

            let route = Route::from_tag(&column.route_tag);
            if route.to_server() {
                server.insert(column.name.clone(), value.clone());
            }
            if route.to_client() {
                client.insert(column.name.clone(), value);
            }
        }

        if !client.is_empty() {
            result.client_records.push(client);
        }
        if !server.is_empty() {
            result.server_records.push(server);
        }
    }

    debug!(
        client_records = result.client_records.len(),
        server_records = result.server_records.len(),
        "sheet extracted"
    );
    Ok(result)
}

/// Number of columns the header must describe: the widest data row (trailing
/// blanks ignored), and at least the narrowest header row.
fn header_width(rows: &[Vec<String>]) -> usize {
    let data_width = rows
        .iter()
        .skip(HEADER_ROWS)
        .map(|row| {
            row.iter()
                .rposition(|cell| !cell.is_empty())
                .map_or(0, |last| last + 1)
        })
        .max()
        .unwrap_or(0);
    let header_width = rows
        .iter()
        .take(HEADER_ROWS)
        .map(Vec::len)
        .min()
        .unwrap_or(0);
    data_width.max(header_width)
}

/// Spreadsheet column letters for a zero-based index (`0` → `A`, `26` → `AA`).
pub fn column_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        letters.push(b'A' + digit as u8);
        remaining = (remaining - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// `A1`-style reference for zero-based coordinates.
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}
