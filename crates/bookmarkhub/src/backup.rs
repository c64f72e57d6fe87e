//! Backup documents for export and import.
//!
//! A backup is a single JSON file holding the main partition in plaintext and,
//! optionally, the privacy partition as ciphertext under the privacy password.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bookmark::Bookmark;
use crate::category::Category;
use crate::error::{Error, Result};
use crate::library::{Library, MergeReport};

/// Format version written into new backups.
pub const BACKUP_VERSION: &str = "1.0";

/// A backup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// When the backup was made, RFC 3339.
    #[serde(default)]
    pub export_date: String,

    /// Main partition bookmarks.
    pub bookmarks: Vec<Bookmark>,

    /// Main partition categories.
    pub categories: Vec<Category>,

    /// Encrypted privacy partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_data: Option<String>,
}

fn default_version() -> String {
    BACKUP_VERSION.to_string()
}

impl Backup {
    /// Snapshot the main partition.
    #[must_use]
    pub fn new(main: &Library) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            bookmarks: main.bookmarks().to_vec(),
            categories: main.categories().to_vec(),
            privacy_data: None,
        }
    }

    /// Parse a backup document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBackup`] if the text is not JSON or lacks the
    /// `bookmarks` and `categories` arrays.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid_backup(e.to_string()))
    }

    /// Read a backup file no larger than `max_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupTooLarge`], an I/O error, or
    /// [`Error::InvalidBackup`].
    pub fn read_file(path: &Path, max_size: u64) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > max_size {
            return Err(Error::BackupTooLarge {
                path: path.to_path_buf(),
                size,
                limit: max_size,
            });
        }

        debug!("Reading backup from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::parse(&json)
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the backup to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!("Wrote backup to {}", path.display());
        Ok(())
    }

    /// The main partition held by the backup.
    #[must_use]
    pub fn main_library(&self) -> Library {
        Library::new(self.bookmarks.clone(), self.categories.clone())
    }
}

/// What happened to the privacy section during export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyExport {
    /// Privacy data was not requested.
    NotRequested,
    /// The privacy partition was empty and left out.
    Empty,
    /// Privacy data was included.
    Included {
        /// Private bookmarks exported.
        bookmarks: usize,
        /// Private categories exported.
        categories: usize,
    },
}

/// What happened to the privacy section during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivacyImport {
    /// The backup had no privacy section.
    Absent,
    /// The privacy section was ignored.
    Skipped {
        /// Why it was ignored.
        reason: String,
    },
    /// No privacy password existed; the imported data became the privacy
    /// space and the import password became its password.
    Adopted {
        /// Private bookmarks imported.
        bookmarks: usize,
        /// Private categories imported.
        categories: usize,
    },
    /// Merged into the unlocked privacy space.
    Merged(MergeReport),
    /// Held until the privacy space is unlocked.
    Deferred,
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Bookmarks now in the main partition.
    pub bookmarks: usize,
    /// Categories now in the main partition.
    pub categories: usize,
    /// Bookmarks moved to uncategorized because their category was missing.
    pub orphans_repaired: usize,
    /// Privacy section outcome.
    pub privacy: PrivacyImport,
}
