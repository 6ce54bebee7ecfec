use harness_lib::{ContentMapping, Redirector};
use std::path::Path;
use std::sync::Arc;

#[allow(dead_code)]
pub mod workbook;

// Re-export shared test utilities from src/test_utils.rs
pub use harness_lib::test_utils::{FixedLoader, range_from_rows, s, sample_mapping};

/// Redirector over the sample mapping with the default sentinel and extension
#[allow(dead_code)]
pub fn sample_redirector() -> Redirector {
    Redirector::new(Arc::new(sample_mapping()))
}

/// Redirector over an arbitrary mapping
#[allow(dead_code)]
pub fn redirector_for(mapping: ContentMapping) -> Redirector {
    Redirector::new(Arc::new(mapping))
}

/// Parse converted CSV text into records, the way a downstream validator would
#[allow(dead_code)]
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .records()
        .map(|record| {
            record
                .expect("converted CSV should parse")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Write a file under `dir` and return its path as a string
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("fixture file should be writable");
    path.to_string_lossy().into_owned()
}
