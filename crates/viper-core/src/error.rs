//! Error types.
//!
//! Undo/redo on an empty history, regex compile failures and out-of-range viewport math are
//! deliberately *not* errors; see the individual modules for their fallback behavior.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors produced when applying an edit to the document.
pub enum EditError {
    #[error("range {start}..{end} is out of bounds for a document of {len} chars")]
    /// The edited range does not lie inside the document.
    OutOfRange {
        /// Start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
        /// Document length in characters.
        len: usize,
    },

    #[error("text at {start} does not match the text being replaced")]
    /// The `before` text of an edit is not what the document contains at `start`.
    Mismatch {
        /// Start character offset.
        start: usize,
    },

    #[error("document is read-only")]
    /// The core is in read-only mode.
    ReadOnly,
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Reasons a persisted undo history is rejected.
pub enum RestoreError {
    #[error("stored text hash {stored} does not match current text hash {current}")]
    /// The history was recorded against a different text.
    HashMismatch {
        /// Hash found in the store.
        stored: i32,
        /// Hash of the live document.
        current: i32,
    },

    #[error("missing key: {0}")]
    /// A required key is absent.
    MissingField(String),

    #[error("invalid value for {key}: {value:?}")]
    /// A key holds a value that cannot be parsed.
    InvalidValue {
        /// Full store key.
        key: String,
        /// Raw stored value.
        value: String,
    },

    #[error("position {position} exceeds history size {size}")]
    /// The stored cursor points past the stored entries.
    PositionOutOfRange {
        /// Stored position.
        position: usize,
        /// Stored entry count.
        size: usize,
    },
}

#[derive(Debug, Error)]
/// Errors from key-value store backends.
pub enum StoreError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    /// The store file is not a JSON object of strings.
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
/// Errors from loading, saving and listing files.
pub enum FileError {
    #[error("{path}: {source}")]
    /// Filesystem I/O failed.
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    #[error("unknown encoding: {0}")]
    /// The encoding label is not recognized.
    UnknownEncoding(String),

    #[error("text cannot be represented in {encoding}")]
    /// Saving would lose characters.
    Unencodable {
        /// Target encoding name.
        encoding: String,
    },

    #[error("privileged access failed: {0}")]
    /// Fallback through the shell session failed.
    Shell(#[from] ShellError),
}

impl FileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for a permission-denied I/O failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied)
    }
}

#[derive(Debug, Error)]
/// Errors from loading the editor configuration.
pub enum ConfigError {
    #[error("I/O error: {0}")]
    /// The config file could not be read.
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    /// The config file is not valid TOML for [`crate::EditorConfig`].
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    /// A value is out of its allowed range.
    Invalid(String),
}

#[derive(Debug, Error)]
/// Errors from a [`crate::ShellSession`].
pub enum ShellError {
    #[error("shell session is not acquired")]
    /// `run` was called while the lock count is zero.
    NotAcquired,

    #[error("failed to start shell: {0}")]
    /// The shell process could not be spawned.
    Spawn(#[source] io::Error),

    #[error("`{command}` failed with status {status:?}: {stderr}")]
    /// The command exited unsuccessfully.
    Failed {
        /// Command line passed to the shell.
        command: String,
        /// Exit status code, if any.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}
