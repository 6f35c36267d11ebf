use crate::error::{Result, ToolError};
use crate::model::ColumnDescriptor;

/// Prefix marking a sheet or column as ignored.
pub const IGNORE_MARKER: char = '#';
/// Number of header rows: comment, field name, type tag, routing tag.
pub const HEADER_ROWS: usize = 4;

const HEADER_ROW_LABELS: [&str; HEADER_ROWS] = ["comment", "name", "type", "route"];

/// Reads the four header rows into one descriptor per column in `0..width`.
///
/// Every header row must provide a cell for each of those columns; a missing
/// header cell is a schema error rather than an empty value.
pub fn parse_header(
    sheet: &str,
    rows: &[Vec<String>],
    width: usize,
) -> Result<Vec<ColumnDescriptor>> {
    if rows.len() < HEADER_ROWS {
        return Err(ToolError::Schema {
            sheet: sheet.to_string(),
            reason: format!(
                "expected {HEADER_ROWS} header rows, found {}",
                rows.len()
            ),
        });
    }

    for (row, label) in rows.iter().zip(HEADER_ROW_LABELS) {
        if row.len() < width {
            return Err(ToolError::Schema {
                sheet: sheet.to_string(),
                reason: format!(
                    "{label} row has {} cells but data references column {}",
                    row.len(),
                    crate::extract::column_name(width - 1)
                ),
            });
        }
    }

    let descriptors = (0..width)
        .map(|index| {
            let comment = rows[0][index].clone();
            ColumnDescriptor {
                index,
                excluded: comment.starts_with(IGNORE_MARKER),
                comment,
                name: rows[1][index].clone(),
                type_tag: rows[2][index].clone(),
                route_tag: rows[3][index].clone(),
            }
        })
        .collect();

    Ok(descriptors)
}
