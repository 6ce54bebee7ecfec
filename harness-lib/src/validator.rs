use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

use crate::shim::{FileAccess, ShimError};
use crate::utils::is_plain_file_name;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Validator expects a root path and an output path as its last arguments, got {count} argument(s)")]
    MissingArguments { count: usize },

    #[error("Cannot use '{name}' as a file name in the stub directory")]
    UnsafeName { name: String },

    #[error("Cannot prepare stub directory '{}': {source}", path.display())]
    Stub {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Shim(#[from] ShimError),

    #[error("Cannot start validator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Validator '{program}' failed with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// The program run against the redirected files.
///
/// `args` ends with the root path to list (the sentinel) and the output path.
pub trait ValidatorEntrypoint {
    fn run(&self, files: &dyn FileAccess, args: &[String]) -> Result<()>;
}

impl<T> ValidatorEntrypoint for T
where
    T: Fn(&dyn FileAccess, &[String]) -> Result<()>,
{
    fn run(&self, files: &dyn FileAccess, args: &[String]) -> Result<()> {
        self(files, args)
    }
}

/// Runs an external program as a subprocess.
///
/// A subprocess cannot see the in-memory files, so the root directory is first
/// materialised into a temporary stub directory through the given
/// [`FileAccess`], and the root argument is replaced by that directory.
#[derive(Debug, Clone)]
pub struct ExternalValidator {
    program: String,
    args: Vec<String>,
}

impl ExternalValidator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ExternalValidator {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Copy every file listed under `root` into `stub_dir`, returning how many were written
    fn materialize(
        &self,
        files: &dyn FileAccess,
        root: &Path,
        stub_dir: &Path,
    ) -> Result<usize, ValidatorError> {
        let names = files.list_dir(root)?;
        for name in &names {
            if !is_plain_file_name(name) {
                return Err(ValidatorError::UnsafeName { name: name.clone() });
            }
            let content = files.read_to_string(&root.join(name))?;
            let target = stub_dir.join(name);
            fs::write(&target, content).map_err(|source| ValidatorError::Stub {
                path: target,
                source,
            })?;
        }
        Ok(names.len())
    }

    fn execute(&self, files: &dyn FileAccess, args: &[String]) -> Result<(), ValidatorError> {
        let root_idx = args
            .len()
            .checked_sub(2)
            .ok_or(ValidatorError::MissingArguments { count: args.len() })?;

        let stub = tempfile::Builder::new()
            .prefix("xls-harness-")
            .tempdir()
            .map_err(|source| ValidatorError::Stub {
                path: std::env::temp_dir(),
                source,
            })?;
        let written = self.materialize(files, Path::new(&args[root_idx]), stub.path())?;
        debug!("Wrote {} files to {}", written, stub.path().display());

        let mut forwarded = args.to_vec();
        forwarded[root_idx] = stub.path().to_string_lossy().into_owned();

        info!("Running validator {} {:?}", self.program, forwarded);
        let status = Command::new(&self.program)
            .args(&self.args)
            .args(&forwarded)
            .status()
            .map_err(|source| ValidatorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ValidatorError::Failed {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

impl ValidatorEntrypoint for ExternalValidator {
    fn run(&self, files: &dyn FileAccess, args: &[String]) -> Result<()> {
        self.execute(files, args)?;
        Ok(())
    }
}
