use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::ERRORS_LOG_FILE;
use crate::utils::get_utc_iso_datetime;

/// Append a timestamped `[time] category:` entry to `errors.log` in the
/// working directory; nothing is written if the file cannot be opened.
pub fn write_error_to_log(category: &str, details: &str) {
    let entry = format!("\n[{}] {}:\n{}\n", get_utc_iso_datetime(), category, details);

    let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ERRORS_LOG_FILE)
    else {
        return;
    };
    let _ = writeln!(file, "{entry}");
}

/// Last component of a path, accepting both `/` and `\` as separators
/// so Windows-style paths resolve the same way on every platform.
pub fn base_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// A bare file name that stays inside whatever directory it is joined onto
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && base_name(name) == name
}

/// Case-insensitive check of the path's extension against a list (without dots)
pub fn has_extension_in(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
