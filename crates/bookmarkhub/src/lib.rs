//! `bookmarkhub` - A local bookmark manager with an encrypted privacy space
//!
//! This library provides bookmark and category management over a local
//! `SQLite` key/value store: paged listings with category filters, an AND/OR
//! search syntax, backups, and a second password-protected partition.
//!
//! # Example
//!
//! ```
//! use bookmarkhub::{BookmarkDraft, BookmarkHub, CategoryFilter, Config, SearchQuery};
//!
//! let mut hub = BookmarkHub::open_in_memory(Config::default())?;
//! hub.library_mut().add_bookmark(BookmarkDraft {
//!     url: "doc.rust-lang.org/book".to_string(),
//!     title: "The Rust Book".to_string(),
//!     category_id: Some("study".to_string()),
//!     ..Default::default()
//! })?;
//! hub.save()?;
//!
//! let hits = hub
//!     .library()
//!     .filtered(&CategoryFilter::All, &SearchQuery::parse("rust|go book"));
//! assert_eq!(hits.len(), 1);
//! # Ok::<(), bookmarkhub::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod backup;
pub mod bookmark;
pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod hub;
pub mod library;
pub mod logging;
pub mod privacy;
pub mod search;
pub mod storage;

pub use backup::{Backup, ImportReport, PrivacyExport, PrivacyImport};
pub use bookmark::{Bookmark, BookmarkDraft, BookmarkPatch};
pub use category::{Category, CategoryDraft, CategoryPatch};
pub use config::Config;
pub use error::{Error, Result};
pub use hub::BookmarkHub;
pub use library::{CategoryFilter, Library, LibraryStats, MergeReport, Page};
pub use logging::init_logging;
pub use search::SearchQuery;
pub use storage::{Storage, StorageStats};
