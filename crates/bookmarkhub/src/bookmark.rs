//! Core bookmark types for bookmarkhub.
//!
//! This module defines the bookmark record as it is persisted, together with
//! the draft/patch types used to create and edit it and the URL helpers that
//! normalize and validate user input.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

static IMAGE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)(\?|$)").expect("image extension pattern")
});

/// A saved bookmark.
///
/// Serialized with camelCase keys and millisecond timestamps, the same shape
/// used in backup files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Unique identifier.
    #[serde(default = "new_id")]
    pub id: String,

    /// Display title.
    pub title: String,

    /// Normalized target URL.
    pub url: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Optional preview image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Owning category, `None` when uncategorized.
    #[serde(default)]
    pub category_id: Option<String>,

    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// When the bookmark was created.
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// When the bookmark was last modified.
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,

    /// How many times the bookmark was opened.
    #[serde(default)]
    pub visit_count: u64,

    /// When the bookmark was last opened.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_visited: Option<DateTime<Utc>>,
}

/// A fresh record identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Input for a new bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkDraft {
    /// Target URL as typed; normalized on creation.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional preview image URL.
    pub image_url: Option<String>,
    /// Optional category id.
    pub category_id: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
}

/// Changes to an existing bookmark. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkPatch {
    /// New URL.
    pub url: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New image URL; `Some(None)` removes it.
    pub image_url: Option<Option<String>>,
    /// New category; `Some(None)` makes the bookmark uncategorized.
    pub category_id: Option<Option<String>>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
}

impl BookmarkPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Bookmark {
    /// Create a bookmark from a draft, normalizing and validating the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every problem with the draft.
    pub fn new(draft: BookmarkDraft) -> Result<Self> {
        let now = Utc::now();
        let bookmark = Self {
            id: new_id(),
            title: sanitize_text(&draft.title),
            url: normalize_url(&draft.url),
            description: draft.description.as_deref().map(sanitize_text).unwrap_or_default(),
            image_url: non_empty(draft.image_url),
            category_id: non_empty(draft.category_id),
            tags: clean_tags(draft.tags),
            created_at: now,
            updated_at: now,
            visit_count: 0,
            last_visited: None,
        };
        bookmark.validate()?;
        Ok(bookmark)
    }

    /// Check the bookmark's fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.title.is_empty() {
            problems.push("title is required".to_string());
        }

        if self.url.is_empty() {
            problems.push("url is required".to_string());
        } else if !is_valid_url(&self.url) {
            problems.push(format!(
                "'{}' is not a valid url (e.g. example.com or https://www.example.com)",
                self.url
            ));
        }

        if let Some(image) = &self.image_url {
            if !is_valid_image_url(image) {
                problems.push(format!("'{image}' is not a valid image link"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                entity: "bookmark",
                problems,
            })
        }
    }

    /// Apply a patch, re-validating the result.
    ///
    /// The bookmark is left unchanged when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the patched bookmark is invalid.
    pub fn apply(&mut self, patch: BookmarkPatch) -> Result<()> {
        let mut updated = self.clone();

        if let Some(url) = patch.url {
            updated.url = normalize_url(&url);
        }
        if let Some(title) = patch.title {
            updated.title = sanitize_text(&title);
        }
        if let Some(description) = patch.description {
            updated.description = sanitize_text(&description);
        }
        if let Some(image_url) = patch.image_url {
            updated.image_url = non_empty(image_url);
        }
        if let Some(category_id) = patch.category_id {
            updated.category_id = non_empty(category_id);
        }
        if let Some(tags) = patch.tags {
            updated.tags = clean_tags(tags);
        }

        updated.validate()?;
        updated.updated_at = Utc::now();
        *self = updated;
        Ok(())
    }

    /// Record that the bookmark was opened.
    pub fn record_visit(&mut self) {
        let now = Utc::now();
        self.visit_count += 1;
        self.last_visited = Some(now);
    }

    /// Whether the bookmark belongs to no category.
    #[must_use]
    pub fn is_uncategorized(&self) -> bool {
        self.category_id.is_none()
    }

    /// Lowercased text the search engine scans.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        let mut parts = vec![self.title.as_str(), self.url.as_str(), self.description.as_str()];
        parts.extend(self.tags.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }

    /// Favicon URL for this bookmark's host.
    #[must_use]
    pub fn favicon_url(&self, service: &str) -> String {
        favicon_url(&self.url, service)
    }
}

/// Normalize a user-typed URL.
///
/// URLs that already carry an `http://` or `https://` scheme are kept as-is.
/// Anything else that looks like a domain (contains a dot and no spaces) gets
/// `https://` prepended; other input is returned trimmed but unchanged.
#[must_use]
pub fn normalize_url(input: &str) -> String {
    let url = input.trim();
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if url.contains('.') && !url.contains(' ') {
        return format!("https://{url}");
    }
    url.to_string()
}

/// Whether the string parses as an absolute URL.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}

/// Whether the string is an absolute URL pointing at a common image format.
#[must_use]
pub fn is_valid_image_url(url: &str) -> bool {
    is_valid_url(url) && IMAGE_EXTENSION.is_match(url)
}

/// Favicon lookup URL for the host of `url`, empty if the URL has no host.
#[must_use]
pub fn favicon_url(url: &str, service: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .map(|host| format!("{service}{host}&sz=32"))
        .unwrap_or_default()
}

/// Trim text and strip angle brackets.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    text.trim().replace(['<', '>'], "")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = sanitize_text(&tag);
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(url: &str, title: &str) -> BookmarkDraft {
        BookmarkDraft {
            url: url.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  http://example.com "), "http://example.com");
        assert_eq!(normalize_url("https://example.com/a"), "https://example.com/a");
        assert_eq!(normalize_url("not a url"), "not a url");
        assert_eq!(normalize_url("localhost"), "localhost");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://example.com"));
        assert!(!is_valid_url("localhost"));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn test_is_valid_image_url() {
        assert!(is_valid_image_url("https://img.example.com/cat.PNG"));
        assert!(is_valid_image_url("https://img.example.com/cat.webp?w=200"));
        assert!(!is_valid_image_url("https://img.example.com/cat.bmp"));
        assert!(!is_valid_image_url("cat.png"));
    }

    #[test]
    fn test_favicon_url() {
        let service = "https://www.google.com/s2/favicons?domain=";
        assert_eq!(
            favicon_url("https://docs.rs/serde", service),
            "https://www.google.com/s2/favicons?domain=docs.rs&sz=32"
        );
        assert_eq!(favicon_url("garbage", service), "");
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  <b>Rust</b> "), "bRust/b");
    }

    #[test]
    fn test_new_bookmark_normalizes() {
        let bookmark = Bookmark::new(BookmarkDraft {
            description: Some("  the book ".to_string()),
            category_id: Some("  ".to_string()),
            tags: vec!["rust".to_string(), "rust".to_string(), " ".to_string()],
            ..draft("doc.rust-lang.org/book", "  The Book ")
        })
        .unwrap();

        assert_eq!(bookmark.url, "https://doc.rust-lang.org/book");
        assert_eq!(bookmark.title, "The Book");
        assert_eq!(bookmark.description, "the book");
        assert!(bookmark.is_uncategorized());
        assert_eq!(bookmark.tags, vec!["rust".to_string()]);
        assert_eq!(bookmark.visit_count, 0);
        assert!(bookmark.last_visited.is_none());
        assert!(!bookmark.id.is_empty());
    }

    #[test]
    fn test_new_bookmark_collects_all_problems() {
        let err = Bookmark::new(draft("not a url", "  ")).unwrap_err();
        match err {
            Error::Validation { entity, problems } => {
                assert_eq!(entity, "bookmark");
                assert_eq!(problems.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_bookmark_rejects_bad_image() {
        let result = Bookmark::new(BookmarkDraft {
            image_url: Some("https://example.com/page.html".to_string()),
            ..draft("example.com", "Example")
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_patch() {
        let mut bookmark = Bookmark::new(draft("example.com", "Example")).unwrap();
        let created = bookmark.created_at;

        bookmark
            .apply(BookmarkPatch {
                title: Some("Renamed".to_string()),
                category_id: Some(Some("work".to_string())),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(bookmark.title, "Renamed");
        assert_eq!(bookmark.category_id.as_deref(), Some("work"));
        assert_eq!(bookmark.created_at, created);
        assert!(bookmark.updated_at >= created);
    }

    #[test]
    fn test_apply_invalid_patch_leaves_bookmark_unchanged() {
        let mut bookmark = Bookmark::new(draft("example.com", "Example")).unwrap();
        let before = bookmark.clone();

        let result = bookmark.apply(BookmarkPatch {
            url: Some("no dots here".to_string()),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(bookmark, before);
    }

    #[test]
    fn test_patch_clears_category() {
        let mut bookmark = Bookmark::new(BookmarkDraft {
            category_id: Some("work".to_string()),
            ..draft("example.com", "Example")
        })
        .unwrap();

        bookmark
            .apply(BookmarkPatch {
                category_id: Some(None),
                ..Default::default()
            })
            .unwrap();
        assert!(bookmark.is_uncategorized());
    }

    #[test]
    fn test_record_visit() {
        let mut bookmark = Bookmark::new(draft("example.com", "Example")).unwrap();
        bookmark.record_visit();
        bookmark.record_visit();

        assert_eq!(bookmark.visit_count, 2);
        assert!(bookmark.last_visited.is_some());
    }

    #[test]
    fn test_searchable_text_includes_tags() {
        let bookmark = Bookmark::new(BookmarkDraft {
            description: Some("Systems Programming".to_string()),
            tags: vec!["Lang".to_string()],
            ..draft("rust-lang.org", "Rust")
        })
        .unwrap();

        let text = bookmark.searchable_text();
        assert!(text.contains("rust"));
        assert!(text.contains("systems programming"));
        assert!(text.contains("lang"));
    }

    #[test]
    fn test_serialization_shape() {
        let bookmark = Bookmark::new(draft("example.com", "Example")).unwrap();
        let json = serde_json::to_value(&bookmark).unwrap();

        assert!(json.get("categoryId").is_some());
        assert!(json.get("visitCount").is_some());
        assert!(json["createdAt"].is_i64());
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "id": "lq3k2",
            "title": "Old",
            "url": "https://old.example.com",
            "categoryId": null,
            "createdAt": 1700000000000,
            "updatedAt": 1700000000000
        }"#;
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();

        assert_eq!(bookmark.description, "");
        assert_eq!(bookmark.visit_count, 0);
        assert!(bookmark.last_visited.is_none());
        assert_eq!(bookmark.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_deserialize_record_without_id_or_timestamps() {
        let json = r#"{"title": "Bare", "url": "https://bare.example.com"}"#;
        let before = Utc::now();
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();

        assert!(Uuid::parse_str(&bookmark.id).is_ok());
        assert!(bookmark.created_at >= before);
        assert!(bookmark.updated_at >= before);
        assert!(bookmark.is_uncategorized());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(BookmarkPatch::default().is_empty());
        let patch = BookmarkPatch {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
