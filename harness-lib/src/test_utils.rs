// Test utilities available to both unit and integration tests
// Only compiled when testing

use calamine::{Data, Range};
use std::path::Path;

use crate::content::ContentMapping;
use crate::loader::{LoadError, TableLoader};

/// Loader that ignores its inputs and hands back a fixed mapping
#[derive(Debug, Clone, Default)]
pub struct FixedLoader(pub ContentMapping);

impl TableLoader for FixedLoader {
    fn load(&self, _source_dir: &Path, _label: &str) -> Result<ContentMapping, LoadError> {
        Ok(self.0.clone())
    }
}

/// The two-file mapping used throughout the shim tests
#[allow(dead_code)]
pub fn sample_mapping() -> ContentMapping {
    [("a.csv", "x,y\n1,2\n"), ("b.csv", "p\n3\n")]
        .into_iter()
        .collect()
}

/// Build a sheet range from rows of cells, padding short rows with empty cells
#[allow(dead_code)]
pub fn range_from_rows(rows: Vec<Vec<Data>>) -> Range<Data> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.is_empty() || width == 0 {
        return Range::empty();
    }

    let mut range = Range::new((0, 0), ((rows.len() - 1) as u32, (width - 1) as u32));
    for (row_idx, row) in rows.into_iter().enumerate() {
        for (col_idx, cell) in row.into_iter().enumerate() {
            range.set_value((row_idx as u32, col_idx as u32), cell);
        }
    }
    range
}

/// Shorthand for a string cell
#[allow(dead_code)]
pub fn s(value: &str) -> Data {
    Data::String(value.to_string())
}
