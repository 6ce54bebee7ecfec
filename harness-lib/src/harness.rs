use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::content::ContentMapping;
use crate::loader::TableLoader;
use crate::shim::{DEFAULT_EXTENSION, DEFAULT_SENTINEL, Redirector};
use crate::validator::ValidatorEntrypoint;

#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Directory handed to the loader
    pub source_dir: PathBuf,
    /// Loader label; for the workbook loader, a directory receiving copies of the converted files
    pub label: String,
    /// Directory token the validator lists to see the in-memory files
    pub sentinel: String,
    /// Suffix of the names served from memory
    pub extension: String,
    /// Where the validator conventionally writes its outputs
    pub output_path: PathBuf,
}

impl HarnessSettings {
    pub fn new(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        HarnessSettings {
            source_dir: source_dir.into(),
            label: String::new(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            output_path: output_path.into(),
        }
    }
}

/// Load, redirect, execute.
pub struct Harness<L> {
    loader: L,
    settings: HarnessSettings,
}

impl<L: TableLoader> Harness<L> {
    pub fn new(loader: L, settings: HarnessSettings) -> Self {
        Harness { loader, settings }
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn load(&self) -> Result<Arc<ContentMapping>> {
        let files = self
            .loader
            .load(&self.settings.source_dir, &self.settings.label)
            .with_context(|| {
                format!(
                    "Failed to load tables from {}",
                    self.settings.source_dir.display()
                )
            })?;
        Ok(Arc::new(files))
    }

    pub fn redirector(&self, files: Arc<ContentMapping>) -> Redirector {
        Redirector::new(files)
            .with_sentinel(self.settings.sentinel.clone())
            .with_extension(self.settings.extension.clone())
    }

    /// The two trailing arguments the validator receives: sentinel, then output path
    pub fn validator_args(&self) -> Vec<String> {
        vec![
            self.settings.sentinel.clone(),
            self.settings.output_path.to_string_lossy().into_owned(),
        ]
    }

    /// Run the three steps, returning how many files were served
    pub fn run(&self, validator: &dyn ValidatorEntrypoint) -> Result<usize> {
        let files = self.load()?;
        let count = files.len();
        info!("Loaded {} files, handing them to the validator", count);

        let redirector = self.redirector(files);
        validator.run(&redirector, &self.validator_args())?;
        Ok(count)
    }
}
