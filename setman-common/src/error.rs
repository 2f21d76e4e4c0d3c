//! Common error types for setman
//!
//! Every recoverable failure in the catalog is an [`Error`]: a [`Code`] drawn
//! from a closed set, a [`Severity`] that is independent of the code, and an
//! optional message that overrides the code's default text.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Common result type for setman operations
pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of failure kinds
///
/// The `Display` text of each variant is the default user-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    #[error("Failed to parse input")]
    ParseFailed,
    #[error("Cut with same identity and stage already exists")]
    ExistingCutConflicts,

    #[error("Cels folder already exists")]
    CelsFolderExists,
    #[error("Cels folder does not exist")]
    CelsFolderDoesntExist,
    #[error("Up folder already exists")]
    UpFolderExists,
    #[error("Up folder does not exist")]
    UpFolderDoesntExist,

    #[error("File does not exist")]
    FileDoesntExist,
    #[error("File is not valid or not a regular file")]
    FileNotValid,
    #[error("Failed to open file")]
    FileOpenFailed,
    #[error("Failed to read file")]
    FileReadFailed,
    #[error("Failed to write file")]
    FileWriteFailed,
    #[error("Failed to determine file size")]
    FileSizeCountFailed,
    #[error("File already exists")]
    FileAlreadyExists,

    #[error("Filesystem operation failed")]
    GenericFilesystemError,

    #[error("Folder does not exist")]
    FolderDoesntExist,
    #[error("Failed to open folder")]
    FolderOpenFailed,
    #[error("Folder already exists")]
    FolderAlreadyExists,

    #[error("Database operation failed")]
    DatabaseError,
    #[error("Configuration error")]
    ConfigError,

    #[error("Generic error")]
    Generic,
}

/// How serious an error is, independent of its code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Tagged error value: severity + code + optional message override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    severity: Severity,
    code: Code,
    message: Option<String>,
}

impl Error {
    /// Error-severity value carrying only the code's default message
    pub fn new(code: Code) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: None,
        }
    }

    /// Error-severity value with a message override
    pub fn with_message(code: Code, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: Some(message.into()),
        }
    }

    /// Catch-all error with a free-text message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::with_message(Code::Generic, message)
    }

    pub fn severity_of(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Override message when present, otherwise the code's default text
    pub fn message(&self) -> String {
        match &self.message {
            Some(msg) => msg.clone(),
            None => self.code.to_string(),
        }
    }

    pub fn is(&self, code: Code) -> bool {
        self.code == code
    }
}

impl From<Code> for Error {
    fn from(code: Code) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => Code::FileDoesntExist,
            std::io::ErrorKind::AlreadyExists => Code::FileAlreadyExists,
            _ => Code::GenericFilesystemError,
        };
        Self::with_message(code, err.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::with_message(Code::DatabaseError, err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::with_message(Code::ParseFailed, err.to_string())
    }
}
