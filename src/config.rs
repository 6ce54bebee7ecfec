use clap::Parser;
use harness_lib::anyhow::{self, Context, Result};
use harness_lib::{DEFAULT_EXTENSION, DEFAULT_SENTINEL, HarnessSettings, XlsDirLoader};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xls-harness")]
#[command(about = "Run a CSV validator against workbooks converted in memory")]
#[command(version)]
pub struct Args {
    /// JSON file with default settings; command line values take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the workbooks to convert
    #[arg(short, long)]
    pub source_dir: Option<PathBuf>,

    /// Directory that also receives a copy of every converted CSV file
    #[arg(long)]
    pub label: Option<String>,

    /// Output path handed to the validator as its last argument
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory token the validator lists to see the converted files (default: dummy)
    #[arg(long)]
    pub sentinel: Option<String>,

    /// Suffix of the converted file names, also the filter of the files served from memory (default: .csv)
    #[arg(long)]
    pub extension: Option<String>,

    /// Workbook extension to convert, repeatable (default: xls)
    #[arg(long = "workbook-ext")]
    pub workbook_extensions: Vec<String>,

    /// Workbook to skip, by file name or full path; repeatable
    #[arg(long = "ignore-xls")]
    pub ignore_xls: Vec<String>,

    /// Sheet to skip, as `<workbook stem>_<sheet>` in lowercase; repeatable
    #[arg(long = "ignore-sheet")]
    pub ignore_sheets: Vec<String>,

    /// Do not log load timing
    #[arg(long)]
    pub no_profile: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    pub log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    pub verbose: bool,

    /// Shorthand for --log-level error
    #[arg(short, long)]
    pub quiet: bool,

    /// Validator program followed by its own leading arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub validator: Vec<String>,
}

/// Settings file layout; every field is optional
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source_dir: Option<PathBuf>,
    pub label: Option<String>,
    pub output: Option<PathBuf>,
    pub sentinel: Option<String>,
    pub extension: Option<String>,
    pub workbook_extensions: Vec<String>,
    pub ignore_xls: Vec<String>,
    pub ignore_sheets: Vec<String>,
    pub profile: Option<bool>,
    pub validator: Vec<String>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Fully resolved settings: command line over config file over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source_dir: PathBuf,
    pub label: String,
    pub output: PathBuf,
    pub sentinel: String,
    pub extension: String,
    pub workbook_extensions: Vec<String>,
    pub ignore_xls: Vec<String>,
    pub ignore_sheets: Vec<String>,
    pub profile: bool,
    pub program: String,
    pub program_args: Vec<String>,
}

impl Settings {
    pub fn resolve(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: &Args, file: FileConfig) -> Result<Self> {
        let source_dir = args
            .source_dir
            .clone()
            .or(file.source_dir)
            .ok_or_else(|| anyhow::anyhow!("No source directory given (--source-dir)"))?;
        let output = args
            .output
            .clone()
            .or(file.output)
            .ok_or_else(|| anyhow::anyhow!("No output path given (--output)"))?;

        let mut command = prefer(&args.validator, file.validator).into_iter();
        let program = command
            .next()
            .ok_or_else(|| anyhow::anyhow!("No validator command given (-- PROGRAM [ARGS...])"))?;

        let mut workbook_extensions = prefer(&args.workbook_extensions, file.workbook_extensions);
        if workbook_extensions.is_empty() {
            workbook_extensions.push("xls".to_string());
        }

        Ok(Settings {
            source_dir,
            label: args.label.clone().or(file.label).unwrap_or_default(),
            output,
            sentinel: args
                .sentinel
                .clone()
                .or(file.sentinel)
                .unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
            extension: args
                .extension
                .clone()
                .or(file.extension)
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            workbook_extensions,
            ignore_xls: prefer(&args.ignore_xls, file.ignore_xls),
            ignore_sheets: prefer(&args.ignore_sheets, file.ignore_sheets),
            profile: !args.no_profile && file.profile.unwrap_or(true),
            program,
            program_args: command.collect(),
        })
    }

    pub fn loader(&self) -> XlsDirLoader {
        XlsDirLoader::new()
            .with_workbook_extensions(self.workbook_extensions.clone())
            .with_ignored_workbooks(self.ignore_xls.clone())
            .with_ignored_sheets(self.ignore_sheets.clone())
            .with_output_extension(self.extension.clone())
            .with_profile(self.profile)
    }

    pub fn harness_settings(&self) -> HarnessSettings {
        HarnessSettings {
            source_dir: self.source_dir.clone(),
            label: self.label.clone(),
            sentinel: self.sentinel.clone(),
            extension: self.extension.clone(),
            output_path: self.output.clone(),
        }
    }
}

/// Command line list when given, otherwise the config file's
fn prefer(cli: &[String], file: Vec<String>) -> Vec<String> {
    if cli.is_empty() { file } else { cli.to_vec() }
}
