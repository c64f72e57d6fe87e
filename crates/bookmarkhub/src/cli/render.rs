//! Text rendering for `bmhub` output.

use std::fmt::{self, Write};

use chrono::{DateTime, Local, Utc};
use serde_json::{json, Value};

use super::OutputFormat;
use crate::bookmark::Bookmark;
use crate::error::Result;
use crate::library::{Library, LibraryStats, Page};
use crate::storage::StorageStats;

/// How a timestamp reads relative to `now`.
///
/// Under a day is "today", under a week is "N days ago", anything older is
/// the local date.
#[must_use]
pub fn relative_date(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(when);
    if age.num_days() < 1 {
        "today".to_string()
    } else if age.num_days() < 7 {
        let days = age.num_days();
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{days} days ago")
        }
    } else {
        when.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

/// Cut `text` to at most `width` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn category_label<'a>(library: &'a Library, bookmark: &Bookmark) -> &'a str {
    bookmark
        .category_id
        .as_deref()
        .and_then(|id| library.category_name(id))
        .unwrap_or("Uncategorized")
}

/// Render one page of bookmarks.
///
/// JSON output adds a `faviconUrl` to every bookmark, built from
/// `favicon_service`.
///
/// # Errors
///
/// Returns an error if serialization or formatting fails.
pub fn page(
    library: &Library,
    page: &Page<'_>,
    format: OutputFormat,
    favicon_service: &str,
) -> Result<String> {
    let now = Utc::now();
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(page)?;
            if let Some(items) = value.get_mut("items").and_then(Value::as_array_mut) {
                for (item, bookmark) in items.iter_mut().zip(&page.items) {
                    if let Some(fields) = item.as_object_mut() {
                        fields.insert(
                            "faviconUrl".to_string(),
                            Value::String(bookmark.favicon_url(favicon_service)),
                        );
                    }
                }
            }
            out = serde_json::to_string_pretty(&value)?;
        }
        OutputFormat::Plain => {
            for bookmark in &page.items {
                writeln!(out, "{}", bookmark.title)?;
                writeln!(out, "  {}", bookmark.url)?;
                if !bookmark.description.is_empty() {
                    writeln!(out, "  {}", bookmark.description)?;
                }
                write!(
                    out,
                    "  [{}] {} | added {}",
                    category_label(library, bookmark),
                    bookmark.id,
                    relative_date(bookmark.created_at, now)
                )?;
                if !bookmark.tags.is_empty() {
                    write!(out, " | #{}", bookmark.tags.join(" #"))?;
                }
                out.push_str("\n\n");
            }
            write_footer(&mut out, page)?;
        }
        OutputFormat::Table => {
            writeln!(
                out,
                "{:<36}  {:<30}  {:<14}  {:<10}  URL",
                "ID", "TITLE", "CATEGORY", "ADDED"
            )?;
            for bookmark in &page.items {
                writeln!(
                    out,
                    "{:<36}  {:<30}  {:<14}  {:<10}  {}",
                    bookmark.id,
                    truncate(&bookmark.title, 30),
                    truncate(category_label(library, bookmark), 14),
                    relative_date(bookmark.created_at, now),
                    bookmark.url
                )?;
            }
            out.push('\n');
            write_footer(&mut out, page)?;
        }
    }

    Ok(out)
}

fn write_footer(out: &mut String, page: &Page<'_>) -> fmt::Result {
    if page.total_items == 0 {
        return write!(out, "No bookmarks found.");
    }
    write!(
        out,
        "Page {}/{} ({} bookmarks)",
        page.page, page.total_pages, page.total_items
    )?;
    if page.has_next {
        write!(out, ", next: --page {}", page.page + 1)?;
    }
    Ok(())
}

/// Render the category list with bookmark counts.
///
/// JSON output adds the readable `textColor` for each category colour.
///
/// # Errors
///
/// Returns an error if serialization or formatting fails.
pub fn categories(library: &Library, stats: &LibraryStats, format: OutputFormat) -> Result<String> {
    let counts = library.categories().iter().zip(&stats.per_category);

    if format == OutputFormat::Json {
        let mut entries = Vec::new();
        for (category, count) in counts {
            let mut value = serde_json::to_value(category)?;
            if let Some(fields) = value.as_object_mut() {
                fields.insert("textColor".to_string(), json!(category.contrast_color()));
                fields.insert("bookmarkCount".to_string(), json!(count.count));
            }
            entries.push(value);
        }
        return Ok(serde_json::to_string_pretty(&entries)?);
    }

    let mut out = String::new();
    if format == OutputFormat::Table {
        writeln!(
            out,
            "{:<36}  {:<20}  {:<8}  {:<8}  {:>5}  COUNT",
            "ID", "NAME", "COLOR", "TEXT", "ORDER"
        )?;
    }
    for (category, count) in counts {
        if format == OutputFormat::Table {
            writeln!(
                out,
                "{:<36}  {:<20}  {:<8}  {:<8}  {:>5}  {}",
                category.id,
                category.name,
                category.color,
                category.contrast_color(),
                category.order,
                count.count
            )?;
        } else {
            writeln!(
                out,
                "{} ({}) {} - {} bookmarks",
                category.name, category.id, category.color, count.count
            )?;
        }
    }
    write!(out, "Uncategorized: {} bookmarks", stats.uncategorized)?;
    Ok(out)
}

/// Render library and storage statistics.
///
/// # Errors
///
/// Returns an error if serialization or formatting fails.
pub fn stats(
    stats: &LibraryStats,
    storage: &StorageStats,
    private: bool,
    format: OutputFormat,
) -> Result<String> {
    if format == OutputFormat::Json {
        let value = json!({
            "space": if private { "privacy" } else { "main" },
            "library": stats,
            "storage": {
                "entries": storage.entries,
                "appBytes": storage.app_bytes,
                "dbSizeBytes": storage.db_size_bytes,
                "schemaVersion": storage.schema_version,
                "lastUpdated": storage.last_updated.map(|t| t.to_rfc3339()),
            },
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let last_saved = storage
        .last_updated
        .map_or_else(|| "never".to_string(), |t| relative_date(t, Utc::now()));

    let mut out = String::new();
    writeln!(out, "[{}]", if private { "Privacy space" } else { "Library" })?;
    writeln!(out, "  Bookmarks:      {}", stats.total_bookmarks)?;
    writeln!(out, "  Categories:     {}", stats.total_categories)?;
    writeln!(out, "  Categorized:    {}", stats.categorized)?;
    writeln!(out, "  Uncategorized:  {}", stats.uncategorized)?;
    writeln!(out, "  Total visits:   {}", stats.total_visits)?;
    writeln!(out)?;
    writeln!(out, "[Storage]")?;
    writeln!(out, "  Entries:        {}", storage.entries)?;
    writeln!(out, "  Data size:      {}", human_size(storage.app_bytes))?;
    writeln!(out, "  Database size:  {}", human_size(storage.db_size_bytes))?;
    write!(out, "  Last saved:     {last_saved}")?;
    Ok(out)
}

/// Format a byte count as B, KB or MB.
#[must_use]
pub fn human_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64;
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", value / 1024.0)
    } else {
        format!("{:.1} MB", value / (1024.0 * 1024.0))
    }
}
