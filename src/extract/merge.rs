use std::collections::HashMap;

use crate::model::MergedRange;

/// Per-cell fallback values derived from a sheet's merged ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOverrides {
    values: HashMap<(usize, usize), String>,
}

impl MergeOverrides {
    /// Maps every cell covered by `ranges` to its range's anchor value. On
    /// overlap the later range wins. Ranges are clipped to `extent`
    /// (rows, columns), so whole-row or whole-column merges stay bounded.
    pub fn build(ranges: &[MergedRange], extent: (usize, usize)) -> Self {
        let (rows, cols) = extent;
        let mut values = HashMap::new();
        if rows == 0 || cols == 0 {
            return Self { values };
        }
        for range in ranges {
            let end_row = range.end_row.min(rows - 1);
            let end_col = range.end_col.min(cols - 1);
            for row in range.start_row..=end_row {
                for col in range.start_col..=end_col {
                    values.insert((row, col), range.anchor_value.clone());
                }
            }
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.values.get(&(row, col)).map(String::as_str)
    }

    /// Effective text of a cell: `raw`, unless it is empty and the cell lies
    /// in a merged range.
    pub fn resolve<'a>(&'a self, row: usize, col: usize, raw: &'a str) -> &'a str {
        if raw.is_empty() {
            self.get(row, col).unwrap_or(raw)
        } else {
            raw
        }
    }
}
