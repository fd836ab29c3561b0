//! Error types for stevedore.
//!
//! This module defines all error types used throughout stevedore, using
//! a combination of `thiserror` for ergonomic error definitions and `miette`
//! for rich diagnostic output.
//!
//! # Error Handling Strategy
//!
//! - All errors derive from [`StevedoreError`]
//! - Structural failures (a closed loader, a malformed glob) are returned to
//!   the caller immediately
//! - Per-archive failures during a multi-archive search are reported to the
//!   loader's [`Reporter`](crate::logging::Reporter) and the search continues
//! - Errors are automatically converted to `miette::Result` for CLI output
//!
//! # Example
//!
//! ```
//! use stevedore::error::{Result, StevedoreError};
//! use stevedore::glob::AntGlob;
//!
//! fn compile(glob: &str) -> Result<AntGlob> {
//!     AntGlob::compile(glob)
//! }
//!
//! assert!(matches!(
//!     compile("src/{main,lib.rs"),
//!     Err(StevedoreError::InvalidGlob { .. })
//! ));
//! ```

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur in stevedore operations
#[derive(Error, Debug, Diagnostic)]
pub enum StevedoreError {
    /// A glob string could not be compiled.
    ///
    /// Raised at compile time, never deferred to match time. Typical causes
    /// are unbalanced braces, runs of three or more `*`, or a trailing escape.
    #[error("Invalid glob '{glob}': {message}")]
    #[diagnostic(
        code(stevedore::glob::invalid),
        help(
            "Globs use Ant syntax: '*' within a segment, '**' across segments, '?' for one \
             character and '{{a,b}}' for alternatives."
        )
    )]
    InvalidGlob {
        /// The glob as supplied by the caller
        glob: String,
        /// Why the glob was rejected
        message: String,
    },

    /// An archive could not be opened or its central directory is corrupt.
    ///
    /// During lookups this is reported to the diagnostic sink rather than
    /// returned, so one broken archive never hides units in the others.
    #[error("Failed to open archive '{location}'")]
    #[diagnostic(
        code(stevedore::archive::open_error),
        help("Check that the file exists and is a valid zip/jar archive.")
    )]
    ArchiveOpen {
        /// The archive location that failed to open
        location: PathBuf,
        /// The underlying zip error
        #[source]
        source: zip::result::ZipError,
    },

    /// An entry exists in an archive but its bytes could not be read.
    #[error("Failed to read '{name}' from archive '{location}'")]
    #[diagnostic(code(stevedore::archive::read_error))]
    ResourceRead {
        /// The entry name
        name: String,
        /// The archive holding the entry
        location: PathBuf,
        /// The underlying zip error
        #[source]
        source: zip::result::ZipError,
    },

    /// No registered archive resolved the requested unit.
    ///
    /// Absence is an expected outcome, so this is returned to the caller and
    /// never reported as a diagnostic.
    #[error("Unit '{name}' not found in any registered archive")]
    #[diagnostic(
        code(stevedore::loader::unit_not_found),
        help("Register the archive that provides this unit before loading it.")
    )]
    UnitNotFound {
        /// The logical unit name that was requested
        name: String,
    },

    /// The loader was used after it was closed.
    #[error("Archive loader is closed")]
    #[diagnostic(
        code(stevedore::loader::closed),
        help("Create a new loader; a closed loader cannot be reopened.")
    )]
    LoaderClosed,

    /// File system I/O error during stevedore operations.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(stevedore::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Git repository not found in the given directory or any parent.
    #[error("Git repository not found in '{path}' or any parent directories")]
    #[diagnostic(
        code(stevedore::git::repo_not_found),
        help("Use --dir instead of --git to select files outside a Git repository.")
    )]
    RepoNotFound {
        /// The path where the Git repository was searched for
        path: PathBuf,
    },

    /// Failed to read the Git index to enumerate tracked files.
    #[error("Failed to access Git index")]
    #[diagnostic(code(stevedore::git::index_error))]
    IndexError(#[from] git2::Error),

    /// A path could not be represented as UTF-8.
    #[error("Invalid path: {message}")]
    #[diagnostic(code(stevedore::path::invalid))]
    InvalidPath {
        /// Description of why the path is invalid
        message: String,
    },

    /// A duration option such as `--idle-threshold` could not be parsed.
    #[error("Invalid duration: '{value}' - {message}")]
    #[diagnostic(
        code(stevedore::config::invalid_duration),
        help("Specify a number with an optional suffix (e.g., '150ms', '10s', '2m', '1h').")
    )]
    InvalidDuration {
        /// The value provided
        value: String,
        /// Description of the parsing error
        message: String,
    },

    /// Required configuration is missing or inconsistent.
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(stevedore::config::error),
        help("Check the required configuration parameters.")
    )]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },
}

impl StevedoreError {
    /// Returns `true` when the error only signals that a unit was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StevedoreError::UnitNotFound { .. })
    }
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StevedoreError>;
