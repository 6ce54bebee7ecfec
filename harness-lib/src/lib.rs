#![allow(clippy::needless_return)]

mod content;
mod harness;
mod loader;
mod shim;
mod validator;
pub mod utils;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use content::ContentMapping;
pub use harness::{Harness, HarnessSettings};
pub use loader::{ColumnType, LoadError, TableLoader, XlsDirLoader, convert_sheet};
pub use shim::{
    AccessKind, DEFAULT_EXTENSION, DEFAULT_SENTINEL, FileAccess, FileHandle, OpenMode, RealFs,
    Redirector, ShimError,
};
pub use validator::{ExternalValidator, ValidatorEntrypoint, ValidatorError};

// Re-exported so the binary shares the same version
pub use anyhow;

pub const ERRORS_LOG_FILE: &str = "errors.log";
