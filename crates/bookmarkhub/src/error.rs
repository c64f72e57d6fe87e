//! Error types for bookmarkhub.
//!
//! This module defines all error types used throughout the bookmarkhub crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bookmarkhub operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored entry could not be decoded.
    #[error("stored entry '{key}' is corrupt: {source}")]
    CorruptEntry {
        /// Storage key of the entry.
        key: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Data Errors ===
    /// Bookmark or category input failed validation.
    #[error("invalid {entity}: {}", .problems.join(", "))]
    Validation {
        /// What was being validated ("bookmark", "category").
        entity: &'static str,
        /// Every problem found.
        problems: Vec<String>,
    },

    /// A bookmark with the same URL already exists.
    #[error("a bookmark for {url} already exists")]
    DuplicateBookmark {
        /// The conflicting URL.
        url: String,
    },

    /// A category with the same name already exists.
    #[error("a category named '{name}' already exists")]
    DuplicateCategory {
        /// The conflicting name.
        name: String,
    },

    /// No bookmark with the given id.
    #[error("bookmark not found: {id}")]
    BookmarkNotFound {
        /// The requested id.
        id: String,
    },

    /// No category with the given id or name.
    #[error("category not found: {id}")]
    CategoryNotFound {
        /// The requested id or name.
        id: String,
    },

    /// Requested page is outside the result set.
    #[error("page {page} is out of range (1-{total_pages})")]
    PageOutOfRange {
        /// The requested page.
        page: usize,
        /// Number of pages available.
        total_pages: usize,
    },

    /// The operation would delete every bookmark at once.
    #[error("refusing to clear bookmarks without a category filter")]
    ClearAllRefused,

    // === Privacy Errors ===
    /// The privacy password was rejected.
    #[error("privacy password is incorrect")]
    InvalidPassword,

    /// A new privacy password does not meet the rules.
    #[error("{0}")]
    PasswordRule(String),

    /// No privacy password has been set yet.
    #[error("privacy space has no password yet; run `bmhub privacy setup` first")]
    PasswordNotSet,

    /// A privacy password already exists.
    #[error("privacy space password is already set")]
    PasswordAlreadySet,

    /// The privacy space must be unlocked for this operation.
    #[error("privacy space is locked")]
    PrivacyLocked,

    /// Cipher text could not be decrypted.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    // === Backup Errors ===
    /// The backup document is malformed.
    #[error("invalid backup file: {0}")]
    InvalidBackup(String),

    /// The backup file exceeds the size limit.
    #[error("backup file {path} is {size} bytes, limit is {limit}")]
    BackupTooLarge {
        /// Path of the backup file.
        path: PathBuf,
        /// Actual size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing formatted output failed.
    #[error("formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// A specialized Result type for bookmarkhub operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for a single problem.
    #[must_use]
    pub fn validation(entity: &'static str, problem: impl Into<String>) -> Self {
        Self::Validation {
            entity,
            problems: vec![problem.into()],
        }
    }

    /// Create a password rule error.
    #[must_use]
    pub fn password_rule(message: impl Into<String>) -> Self {
        Self::PasswordRule(message.into())
    }

    /// Create a decryption error.
    #[must_use]
    pub fn decrypt(message: impl Into<String>) -> Self {
        Self::Decrypt(message.into())
    }

    /// Create a backup format error.
    #[must_use]
    pub fn invalid_backup(message: impl Into<String>) -> Self {
        Self::InvalidBackup(message.into())
    }

    /// Check if this error means the privacy password was wrong.
    #[must_use]
    pub fn is_invalid_password(&self) -> bool {
        matches!(self, Self::InvalidPassword)
    }

    /// Check if this error is a not-found lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BookmarkNotFound { .. } | Self::CategoryNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPassword;
        assert_eq!(err.to_string(), "privacy password is incorrect");

        let err = Error::decrypt("bad hex");
        assert_eq!(err.to_string(), "decryption failed: bad hex");
    }

    #[test]
    fn test_validation_error_joins_problems() {
        let err = Error::Validation {
            entity: "bookmark",
            problems: vec!["title is required".to_string(), "url is invalid".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "invalid bookmark: title is required, url is invalid"
        );
    }

    #[test]
    fn test_is_invalid_password() {
        assert!(Error::InvalidPassword.is_invalid_password());
        assert!(!Error::PrivacyLocked.is_invalid_password());
    }

    #[test]
    fn test_is_not_found() {
        let err = Error::BookmarkNotFound {
            id: "abc".to_string(),
        };
        assert!(err.is_not_found());
        let err = Error::CategoryNotFound {
            id: "work".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!Error::ClearAllRefused.is_not_found());
    }

    #[test]
    fn test_page_out_of_range_display() {
        let err = Error::PageOutOfRange {
            page: 7,
            total_pages: 3,
        };
        assert_eq!(err.to_string(), "page 7 is out of range (1-3)");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_fmt_error() {
        let err: Error = std::fmt::Error.into();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_corrupt_entry_names_key() {
        let source = serde_json::from_str::<Vec<i32>>("{").unwrap_err();
        let err = Error::CorruptEntry {
            key: "bookmarkhub_bookmarks".to_string(),
            source,
        };
        assert!(err.to_string().contains("bookmarkhub_bookmarks"));
    }

    #[test]
    fn test_backup_too_large_display() {
        let err = Error::BackupTooLarge {
            path: PathBuf::from("/tmp/backup.json"),
            size: 20,
            limit: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/backup.json"));
        assert!(msg.contains("limit is 10"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
