//! Adapters between the extraction engine and the outside world: workbook
//! readers on the input side, record writers on the output side.

pub mod excel_read;
pub mod export;

use crate::error::{Result, ToolError};
use crate::model::RawSheet;

/// Supplies sheet names and sheet contents of one workbook.
pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads the cell text and merged ranges of sheet `name`.
    fn read_sheet(&mut self, name: &str) -> Result<RawSheet>;
}

/// Workbook held in memory, for callers that read spreadsheets through
/// another library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryWorkbook {
    sheets: Vec<RawSheet>,
}

impl MemoryWorkbook {
    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self { sheets }
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .cloned()
            .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))
    }
}
