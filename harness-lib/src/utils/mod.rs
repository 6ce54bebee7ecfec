mod datetime;
mod filesystem;
mod string;

pub use datetime::{format_elapsed, get_utc_iso_datetime};
pub use filesystem::{base_name, has_extension_in, is_plain_file_name, write_error_to_log};
pub use string::{number_to_string, quote_field, sheet_stem};
