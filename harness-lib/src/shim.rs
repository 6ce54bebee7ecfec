use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::content::ContentMapping;
use crate::utils::base_name;

/// Directory token that lists the in-memory files instead of a real directory
pub const DEFAULT_SENTINEL: &str = "dummy";

/// Suffix of the names served from memory when opened for text reading
pub const DEFAULT_EXTENSION: &str = ".csv";

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("key not found: '{name}'")]
    Lookup { name: String },

    #[error("invalid mode: '{mode}'")]
    InvalidMode { mode: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Append,
    CreateNew,
}

/// Parsed form of a conventional mode string (`"r"`, `"wb"`, `"a+"`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub access: AccessKind,
    pub binary: bool,
    pub update: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode {
        access: AccessKind::Read,
        binary: false,
        update: false,
    };

    pub const WRITE: OpenMode = OpenMode {
        access: AccessKind::Write,
        binary: false,
        update: false,
    };

    /// Plain text read, the only mode served from memory
    pub fn is_text_read(&self) -> bool {
        self.access == AccessKind::Read && !self.binary && !self.update
    }

    pub fn to_open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self.access {
            AccessKind::Read => {
                options.read(true);
            }
            AccessKind::Write => {
                options.write(true).create(true).truncate(true);
            }
            AccessKind::Append => {
                options.append(true).create(true);
            }
            AccessKind::CreateNew => {
                options.write(true).create_new(true);
            }
        }
        if self.update {
            options.read(true).write(true);
        }
        options
    }
}

impl FromStr for OpenMode {
    type Err = ShimError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        let invalid = || ShimError::InvalidMode {
            mode: mode.to_string(),
        };

        let mut access = None;
        let mut binary = false;
        let mut text = false;
        let mut update = false;

        for c in mode.chars() {
            let kind = match c {
                'r' => AccessKind::Read,
                'w' => AccessKind::Write,
                'a' => AccessKind::Append,
                'x' => AccessKind::CreateNew,
                'b' if !binary && !text => {
                    binary = true;
                    continue;
                }
                't' if !binary && !text => {
                    text = true;
                    continue;
                }
                '+' if !update => {
                    update = true;
                    continue;
                }
                _ => return Err(invalid()),
            };
            if access.replace(kind).is_some() {
                return Err(invalid());
            }
        }

        Ok(OpenMode {
            access: access.ok_or_else(invalid)?,
            binary,
            update,
        })
    }
}

/// Stream returned by [`FileAccess::open`]
#[derive(Debug)]
pub enum FileHandle {
    Memory(Cursor<Vec<u8>>),
    Disk(File),
}

impl FileHandle {
    pub fn is_in_memory(&self) -> bool {
        matches!(self, FileHandle::Memory(_))
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileHandle::Memory(cursor) => cursor.read(buf),
            FileHandle::Disk(file) => file.read(buf),
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileHandle::Memory(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "in-memory file is read-only",
            )),
            FileHandle::Disk(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileHandle::Memory(_) => Ok(()),
            FileHandle::Disk(file) => file.flush(),
        }
    }
}

/// File access capability handed to validators in place of the process filesystem
pub trait FileAccess {
    fn open(&self, path: &Path, mode: OpenMode) -> Result<FileHandle, ShimError>;

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, ShimError>;

    fn read_to_string(&self, path: &Path) -> Result<String, ShimError> {
        let mut content = String::new();
        self.open(path, OpenMode::READ)?.read_to_string(&mut content)?;
        Ok(content)
    }
}

/// The unmodified filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileAccess for RealFs {
    fn open(&self, path: &Path, mode: OpenMode) -> Result<FileHandle, ShimError> {
        Ok(FileHandle::Disk(mode.to_open_options().open(path)?))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, ShimError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

/// Serves the Content Mapping for the sentinel directory and for text reads of
/// names ending with the extension; everything else goes to `fallback`.
#[derive(Debug, Clone)]
pub struct Redirector<F = RealFs> {
    files: Arc<ContentMapping>,
    sentinel: String,
    extension: String,
    fallback: F,
}

impl Redirector<RealFs> {
    pub fn new(files: Arc<ContentMapping>) -> Self {
        Redirector::with_fallback(files, RealFs)
    }
}

impl<F> Redirector<F> {
    pub fn with_fallback(files: Arc<ContentMapping>, fallback: F) -> Self {
        Redirector {
            files,
            sentinel: DEFAULT_SENTINEL.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            fallback,
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn files(&self) -> &ContentMapping {
        &self.files
    }

    /// Base name to serve from memory, if the request is intercepted
    fn intercepted<'p>(&self, path: &'p Path, mode: OpenMode) -> Option<&'p str> {
        if !mode.is_text_read() {
            return None;
        }
        let base = base_name(path.to_str()?);
        base.ends_with(&self.extension).then_some(base)
    }
}

impl<F: FileAccess> FileAccess for Redirector<F> {
    fn open(&self, path: &Path, mode: OpenMode) -> Result<FileHandle, ShimError> {
        let Some(base) = self.intercepted(path, mode) else {
            return self.fallback.open(path, mode);
        };
        let content = self.files.get(base).ok_or_else(|| ShimError::Lookup {
            name: base.to_string(),
        })?;
        debug!("Serving {} from memory", path.display());
        Ok(FileHandle::Memory(Cursor::new(content.as_bytes().to_vec())))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, ShimError> {
        if path.as_os_str() == OsStr::new(&self.sentinel) {
            return Ok(self.files.names().map(str::to_string).collect());
        }
        self.fallback.list_dir(path)
    }
}
