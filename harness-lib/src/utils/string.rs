use std::path::Path;

/// Output stem for one sheet of a workbook: `lower(file stem) + "_" + lower(sheet)`
///
/// The stem is everything before the last dot of the file name, so
/// `Items.V2.xls` with sheet `Main` gives `items.v2_main`.
pub fn sheet_stem(workbook_path: &Path, sheet_name: &str) -> String {
    let file_name = workbook_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name.as_str(),
    };
    return format!("{}_{}", stem.to_lowercase(), sheet_name.to_lowercase());
}

/// Integral values print without a fractional part, others with six decimals
pub fn number_to_string(value: f64) -> String {
    if value.round() == value && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        format!("{value:.6}")
    }
}

/// Wrap a field in double quotes, doubling any quote inside it
pub fn quote_field(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
