use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Dimensions, Range, Reader, Sheets, Xlsx, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::convert::DATE_FORMAT;
use crate::error::{Result, ToolError};
use crate::io::WorkbookSource;
use crate::model::{MergedRange, RawSheet};

/// Workbook opened from disk. Only the xlsx reader exposes merged ranges;
/// other formats report none.
pub enum ExcelWorkbook {
    Xlsx(Xlsx<BufReader<File>>),
    Other(Sheets<BufReader<File>>),
}

/// Opens `path`, picking the reader from the file extension.
pub fn open_workbook(path: &Path) -> Result<ExcelWorkbook> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("xlsx" | "xlsm") => {
            let mut workbook: Xlsx<_> = calamine::open_workbook(path)?;
            workbook.load_merged_regions()?;
            Ok(ExcelWorkbook::Xlsx(workbook))
        }
        _ => Ok(ExcelWorkbook::Other(open_workbook_auto(path)?)),
    }
}

impl WorkbookSource for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        match self {
            ExcelWorkbook::Xlsx(workbook) => workbook.sheet_names(),
            ExcelWorkbook::Other(workbook) => workbook.sheet_names(),
        }
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet> {
        if !self.sheet_names().iter().any(|sheet| sheet == name) {
            return Err(missing_sheet(name));
        }
        match self {
            ExcelWorkbook::Xlsx(workbook) => {
                let range = workbook.worksheet_range(name)?;
                let merged: Vec<MergedRange> = workbook
                    .merged_regions_by_sheet(name)
                    .into_iter()
                    .map(|(_, _, dimensions)| merged_range(&range, dimensions))
                    .collect();
                debug!(sheet = name, merged_ranges = merged.len(), "sheet read");
                Ok(RawSheet::new(name, cell_grid(&range)).with_merged(merged))
            }
            ExcelWorkbook::Other(workbook) => {
                let range = workbook.worksheet_range(name)?;
                debug!(sheet = name, "sheet read");
                Ok(RawSheet::new(name, cell_grid(&range)))
            }
        }
    }
}

fn missing_sheet(name: &str) -> ToolError {
    ToolError::InvalidWorkbook(format!("missing sheet '{name}'"))
}

/// Materialises the cell text from `A1` to the end of the used range, so row
/// and column indices match the sheet's absolute coordinates.
fn cell_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };

    (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| cell_to_string(range.get_value((row, col))))
                .collect()
        })
        .collect()
}

fn merged_range(range: &Range<Data>, dimensions: &Dimensions) -> MergedRange {
    let anchor = cell_to_string(range.get_value(dimensions.start));
    MergedRange::new(
        (dimensions.start.0 as usize, dimensions.start.1 as usize),
        (dimensions.end.0 as usize, dimensions.end.1 as usize),
        anchor,
    )
}

fn cell_to_string(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::String(value)) => value.clone(),
        Some(Data::Float(value)) => value.to_string(),
        Some(Data::Int(value)) => value.to_string(),
        Some(Data::Bool(value)) => value.to_string(),
        Some(Data::DateTime(value)) => excel_datetime(value.as_f64())
            .map(|value| value.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        Some(Data::Error(_)) | Some(Data::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Converts a 1900-system serial date. Day zero is 1899-12-30 so that the
/// serials past the phantom 1900-02-29 line up.
fn excel_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
