use calamine::{Data, Range, Reader, open_workbook_auto};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::content::ContentMapping;
use crate::shim::DEFAULT_EXTENSION;
use crate::utils::{format_elapsed, has_extension_in, number_to_string, quote_field, sheet_stem};

static EMPTY_CELL: Data = Data::Empty;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read source directory '{}': {source}", path.display())]
    SourceDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write converted file '{}': {source}", path.display())]
    Mirror {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot open workbook '{}': {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("Invalid header in sheet '{sheet}': column {column} is numeric")]
    InvalidHeader { sheet: String, column: usize },
}

/// Produces the Content Mapping from a source directory.
///
/// `label` is loader-specific. For [`XlsDirLoader`] it names a directory that
/// also receives a copy of every converted file; an empty label disables that.
pub trait TableLoader {
    fn load(&self, source_dir: &Path, label: &str) -> Result<ContentMapping, LoadError>;
}

/// Type of a column, taken from the `<type>_` prefix of its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Comment,
    Int,
    Float,
    Str,
    Table,
}

impl ColumnType {
    pub fn from_prefix(prefix: &str) -> ColumnType {
        match prefix.to_lowercase().as_str() {
            "int" => ColumnType::Int,
            "float" => ColumnType::Float,
            "str" => ColumnType::Str,
            "table" => ColumnType::Table,
            _ => ColumnType::Comment,
        }
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    column_type: ColumnType,
}

impl Column {
    fn comment() -> Self {
        Column {
            name: String::new(),
            column_type: ColumnType::Comment,
        }
    }

    fn from_header(header: &str) -> Self {
        if let Some((prefix, rest)) = header.split_once('_') {
            let column_type = ColumnType::from_prefix(prefix);
            if column_type != ColumnType::Comment {
                return Column {
                    name: rest.to_string(),
                    column_type,
                };
            }
        }
        Column {
            name: header.to_string(),
            column_type: ColumnType::Comment,
        }
    }
}

/// Converts every workbook of a directory, one CSV per sheet.
#[derive(Debug, Clone)]
pub struct XlsDirLoader {
    workbook_extensions: Vec<String>,
    ignore_xls: HashSet<String>,
    ignore_sheets: HashSet<String>,
    output_extension: String,
    profile: bool,
}

impl Default for XlsDirLoader {
    fn default() -> Self {
        XlsDirLoader {
            workbook_extensions: vec!["xls".to_string()],
            ignore_xls: HashSet::new(),
            ignore_sheets: HashSet::new(),
            output_extension: DEFAULT_EXTENSION.to_string(),
            profile: true,
        }
    }
}

impl XlsDirLoader {
    pub fn new() -> Self {
        XlsDirLoader::default()
    }

    /// Extensions (without dot, case-insensitive) of the files to convert
    pub fn with_workbook_extensions(mut self, extensions: Vec<String>) -> Self {
        self.workbook_extensions = extensions;
        self
    }

    /// Workbooks to skip, matched against the file name or the full path
    pub fn with_ignored_workbooks(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.ignore_xls = names.into_iter().collect();
        self
    }

    /// Sheets to skip, matched against `lower(stem)_lower(sheet)`
    pub fn with_ignored_sheets(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.ignore_sheets = names.into_iter().collect();
        self
    }

    /// Suffix appended to every converted sheet name (default `.csv`)
    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    pub fn output_extension(&self) -> &str {
        &self.output_extension
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    fn is_ignored_workbook(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.ignore_xls.contains(&file_name)
            || self.ignore_xls.contains(&*path.to_string_lossy())
    }

    /// Workbook files of the directory, sorted so later duplicates win deterministically
    fn collect_workbooks(&self, source_dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let to_error = |source: io::Error| LoadError::SourceDir {
            path: source_dir.to_path_buf(),
            source,
        };

        let mut workbooks = Vec::new();
        for entry in fs::read_dir(source_dir).map_err(to_error)? {
            let path = entry.map_err(to_error)?.path();
            if !path.is_file() || !has_extension_in(&path, &self.workbook_extensions) {
                continue;
            }
            if self.is_ignored_workbook(&path) {
                debug!("Ignoring workbook {}", path.display());
                continue;
            }
            workbooks.push(path);
        }
        workbooks.sort();
        Ok(workbooks)
    }

    /// Convert the sheets of one workbook in order.
    ///
    /// An unreadable sheet or an invalid header stops the workbook there;
    /// sheets converted before it are kept.
    fn convert_workbook(&self, path: &Path) -> Result<ContentMapping, LoadError> {
        let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut converted = ContentMapping::new();
        for sheet_name in workbook.sheet_names() {
            let stem = sheet_stem(path, &sheet_name);
            if self.ignore_sheets.contains(&stem) {
                debug!("Ignoring sheet {stem}");
                continue;
            }

            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    warn!(
                        "Error reading sheet '{}' of {}: {}",
                        sheet_name,
                        path.display(),
                        e
                    );
                    break;
                }
            };

            match convert_sheet(&stem, &range) {
                Ok(csv) => {
                    converted.insert(format!("{stem}{}", self.output_extension), csv);
                }
                Err(e) => {
                    warn!("{e}, skipping the rest of {}", path.display());
                    break;
                }
            }
        }

        Ok(converted)
    }

    fn convert_all(&self, workbooks: &[PathBuf]) -> Vec<ContentMapping> {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .min(workbooks.len())
            .max(1);
        let chunk_size = workbooks.len().div_ceil(workers).max(1);

        thread::scope(|scope| {
            let handles: Vec<_> = workbooks
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .filter_map(|path| match self.convert_workbook(path) {
                                Ok(converted) => Some(converted),
                                Err(e) => {
                                    warn!("{e}");
                                    None
                                }
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }

    fn write_mirror(&self, mirror_dir: &Path, files: &ContentMapping) -> Result<(), LoadError> {
        fs::create_dir_all(mirror_dir).map_err(|source| LoadError::Mirror {
            path: mirror_dir.to_path_buf(),
            source,
        })?;
        for (name, content) in files.iter() {
            let path = mirror_dir.join(name);
            fs::write(&path, content).map_err(|source| LoadError::Mirror { path, source })?;
        }
        Ok(())
    }
}

impl TableLoader for XlsDirLoader {
    fn load(&self, source_dir: &Path, label: &str) -> Result<ContentMapping, LoadError> {
        let started = Instant::now();
        let workbooks = self.collect_workbooks(source_dir)?;

        let mut files = ContentMapping::new();
        for converted in self.convert_all(&workbooks) {
            for name in files.extend_from(converted) {
                warn!("Duplicate converted file {name}, keeping the last one");
            }
        }

        if !label.is_empty() {
            self.write_mirror(Path::new(label), &files)?;
        }

        if self.profile {
            info!(
                "Loaded {} csv files from {} workbooks in {}",
                files.len(),
                workbooks.len(),
                format_elapsed(started.elapsed())
            );
        }

        Ok(files)
    }
}

/// Convert one sheet into CSV text.
///
/// Absolute row 0 is the header, even when the sheet's used range starts
/// lower; a sheet with no cells gives a lone newline. Only columns whose
/// header carries a known type prefix (`int_`, `float_`, `str_`, `table_`)
/// are written; the prefix is dropped from the emitted header. The column set ends at the first blank
/// header cell followed only by blanks, and the data ends at the first row
/// that is blank across the column set.
pub fn convert_sheet(sheet: &str, range: &Range<Data>) -> Result<String, LoadError> {
    let (height, width) = match range.end() {
        Some((row, col)) => (row as usize + 1, col as usize + 1),
        None => (0, 0),
    };
    let cell_at = |row: usize, col: usize| {
        range
            .get_value((row as u32, col as u32))
            .unwrap_or(&EMPTY_CELL)
    };

    let header_row: Vec<&Data> = (0..width).map(|col| cell_at(0, col)).collect();
    let columns = parse_header(sheet, &header_row)?;
    let mut csv = join_typed(&columns, |column, _| column.name.clone());

    for row in 1..height {
        let cells: Vec<&Data> = (0..columns.len()).map(|col| cell_at(row, col)).collect();
        if cells.iter().all(|cell| is_blank(cell)) {
            break;
        }
        csv.push_str(&join_typed(&columns, |column, idx| {
            format_cell(column.column_type, cells[idx])
        }));
    }

    Ok(csv)
}

fn parse_header(sheet: &str, row: &[&Data]) -> Result<Vec<Column>, LoadError> {
    let mut columns = Vec::new();
    for (idx, &cell) in row.iter().enumerate() {
        if is_blank(cell) {
            if row[idx..].iter().all(|cell| is_blank(cell)) {
                break;
            }
            columns.push(Column::comment());
            continue;
        }
        if numeric_value(cell).is_some() {
            return Err(LoadError::InvalidHeader {
                sheet: sheet.to_string(),
                column: idx,
            });
        }
        columns.push(Column::from_header(&cell.to_string()));
    }
    Ok(columns)
}

/// One CSV line over the typed columns, comment columns left out
fn join_typed(columns: &[Column], mut field: impl FnMut(&Column, usize) -> String) -> String {
    let mut line = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.column_type != ColumnType::Comment)
        .map(|(idx, column)| field(column, idx))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn format_cell(column_type: ColumnType, cell: &Data) -> String {
    match column_type {
        ColumnType::Comment => String::new(),
        ColumnType::Int => {
            let value = numeric_value(cell).or_else(|| parsed_number(cell)).unwrap_or(0.0);
            (value.round() as i64).to_string()
        }
        ColumnType::Float => {
            let value = numeric_value(cell).or_else(|| parsed_number(cell)).unwrap_or(0.0);
            if value == 0.0 {
                "0.0".to_string()
            } else {
                format!("{value:.6}")
            }
        }
        ColumnType::Str => {
            let text = match cell {
                Data::String(s) => match s.trim_start().parse::<f64>() {
                    Ok(value) => number_to_string(value),
                    Err(_) => s.clone(),
                },
                Data::Bool(b) => b.to_string(),
                Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
                _ => numeric_value(cell).map(number_to_string).unwrap_or_default(),
            };
            quote_field(&text)
        }
        ColumnType::Table => match cell {
            Data::String(s) => quote_field(s),
            _ => quote_field(""),
        },
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn numeric_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::DateTime(dt) => Some(dt.as_f64()),
        _ => None,
    }
}

fn parsed_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::String(s) => s.trim_start().parse::<f64>().ok(),
        _ => None,
    }
}
