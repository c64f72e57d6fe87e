//! A bookmark library: one partition of bookmarks and categories.
//!
//! The main partition and the privacy space are both a [`Library`]. All
//! mutation happens in memory; persisting is the caller's job.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch};
use crate::category::{sort_categories, Category, CategoryDraft, CategoryPatch};
use crate::config::DefaultCategory;
use crate::error::{Error, Result};
use crate::search::SearchQuery;

/// Which bookmarks a view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every bookmark.
    #[default]
    All,
    /// Bookmarks without a category.
    Uncategorized,
    /// Bookmarks in the category with this id.
    Category(String),
}

impl CategoryFilter {
    /// Whether the bookmark passes the filter.
    #[must_use]
    pub fn accepts(&self, bookmark: &Bookmark) -> bool {
        match self {
            Self::All => true,
            Self::Uncategorized => bookmark.category_id.is_none(),
            Self::Category(id) => bookmark.category_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// One page of a filtered view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a> {
    /// Bookmarks on this page, newest first.
    pub items: Vec<&'a Bookmark>,
    /// 1-based page number.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Bookmarks across all pages.
    pub total_items: usize,
    /// Number of pages; 0 when nothing matched.
    pub total_pages: usize,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

/// Outcome of [`Library::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Categories added.
    pub categories_added: usize,
    /// Bookmarks added.
    pub bookmarks_added: usize,
    /// Bookmarks skipped because their URL was already present.
    pub bookmarks_skipped: usize,
    /// Bookmarks moved to uncategorized afterwards.
    pub orphans_repaired: usize,
}

/// Bookmark count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category id.
    pub id: String,
    /// Category name.
    pub name: String,
    /// Bookmarks in the category.
    pub count: usize,
}

/// Summary numbers for a library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    /// All bookmarks.
    pub total_bookmarks: usize,
    /// All categories.
    pub total_categories: usize,
    /// Bookmarks with a category.
    pub categorized: usize,
    /// Bookmarks without a category.
    pub uncategorized: usize,
    /// Sum of visit counts.
    pub total_visits: u64,
    /// Per-category counts in category order.
    pub per_category: Vec<CategoryCount>,
}

/// Bookmarks and categories of one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    bookmarks: Vec<Bookmark>,
    categories: Vec<Category>,
}

impl Library {
    /// Create a library from stored collections.
    #[must_use]
    pub fn new(bookmarks: Vec<Bookmark>, categories: Vec<Category>) -> Self {
        let mut library = Self {
            bookmarks,
            categories,
        };
        sort_categories(&mut library.categories);
        library
    }

    /// Create an empty library seeded with the given categories.
    #[must_use]
    pub fn with_defaults(defaults: &[DefaultCategory]) -> Self {
        let categories = defaults
            .iter()
            .zip(0_i64..)
            .map(|(default, order)| Category::from_default(default, order))
            .collect();
        Self::new(Vec::new(), categories)
    }

    /// All bookmarks in insertion order.
    #[must_use]
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// All categories, sorted by order then creation time.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Split into the stored collections.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Bookmark>, Vec<Category>) {
        (self.bookmarks, self.categories)
    }

    /// Whether the library holds no bookmarks and no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty() && self.categories.is_empty()
    }

    // === Bookmarks ===

    /// Look up a bookmark by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BookmarkNotFound`] if no bookmark has the id.
    pub fn bookmark(&self, id: &str) -> Result<&Bookmark> {
        self.bookmarks
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| Error::BookmarkNotFound { id: id.to_string() })
    }

    fn bookmark_index(&self, id: &str) -> Result<usize> {
        self.bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::BookmarkNotFound { id: id.to_string() })
    }

    /// Add a bookmark.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, [`Error::CategoryNotFound`]
    /// for an unknown category, or [`Error::DuplicateBookmark`] if the URL is
    /// already saved.
    pub fn add_bookmark(&mut self, draft: BookmarkDraft) -> Result<&Bookmark> {
        let bookmark = Bookmark::new(draft)?;
        self.ensure_category(bookmark.category_id.as_deref())?;
        self.ensure_unique_url(&bookmark.url, None)?;

        debug!(id = %bookmark.id, url = %bookmark.url, "Adding bookmark");
        let index = self.bookmarks.len();
        self.bookmarks.push(bookmark);
        Ok(&self.bookmarks[index])
    }

    /// Edit a bookmark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BookmarkNotFound`], a validation error (also for an
    /// empty patch), [`Error::CategoryNotFound`] or
    /// [`Error::DuplicateBookmark`].
    pub fn update_bookmark(&mut self, id: &str, patch: BookmarkPatch) -> Result<&Bookmark> {
        let index = self.bookmark_index(id)?;
        if patch.is_empty() {
            return Err(Error::validation("bookmark", "nothing to change"));
        }

        if let Some(Some(category_id)) = &patch.category_id {
            let category_id = category_id.trim();
            if !category_id.is_empty() {
                self.ensure_category(Some(category_id))?;
            }
        }

        let mut updated = self.bookmarks[index].clone();
        updated.apply(patch)?;
        self.ensure_unique_url(&updated.url, Some(id))?;

        debug!(id, "Updating bookmark");
        self.bookmarks[index] = updated;
        Ok(&self.bookmarks[index])
    }

    /// Remove a bookmark, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BookmarkNotFound`] if no bookmark has the id.
    pub fn delete_bookmark(&mut self, id: &str) -> Result<Bookmark> {
        let index = self.bookmark_index(id)?;
        debug!(id, "Deleting bookmark");
        Ok(self.bookmarks.remove(index))
    }

    /// Record that a bookmark was opened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BookmarkNotFound`] if no bookmark has the id.
    pub fn record_visit(&mut self, id: &str) -> Result<&Bookmark> {
        let index = self.bookmark_index(id)?;
        self.bookmarks[index].record_visit();
        Ok(&self.bookmarks[index])
    }

    fn ensure_unique_url(&self, url: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .bookmarks
            .iter()
            .any(|b| b.url == url && Some(b.id.as_str()) != except_id);
        if taken {
            Err(Error::DuplicateBookmark {
                url: url.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn ensure_category(&self, category_id: Option<&str>) -> Result<()> {
        match category_id {
            Some(id) if !self.categories.iter().any(|c| c.id == id) => {
                Err(Error::CategoryNotFound { id: id.to_string() })
            }
            _ => Ok(()),
        }
    }

    // === Categories ===

    /// Find a category by id, or failing that by case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CategoryNotFound`] if nothing matches.
    pub fn resolve_category(&self, id_or_name: &str) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id_or_name)
            .or_else(|| self.categories.iter().find(|c| c.has_name(id_or_name)))
            .ok_or_else(|| Error::CategoryNotFound {
                id: id_or_name.to_string(),
            })
    }

    /// Name of the category with `id`, if it exists.
    #[must_use]
    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// Add a category.
    ///
    /// # Errors
    ///
    /// Returns a validation error or [`Error::DuplicateCategory`].
    pub fn add_category(&mut self, draft: CategoryDraft) -> Result<&Category> {
        let mut category = Category::new(draft.clone())?;
        self.ensure_unique_name(&category.name, None)?;

        if draft.order.is_none() {
            category.order = self.categories.iter().map(|c| c.order + 1).max().unwrap_or(0);
        }

        debug!(id = %category.id, name = %category.name, "Adding category");
        let id = category.id.clone();
        self.categories.push(category);
        sort_categories(&mut self.categories);
        self.category_ref(&id)
    }

    /// Edit a category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CategoryNotFound`], a validation error or
    /// [`Error::DuplicateCategory`].
    pub fn update_category(&mut self, id: &str, patch: CategoryPatch) -> Result<&Category> {
        let index = self.category_index(id)?;
        let mut updated = self.categories[index].clone();
        updated.apply(patch)?;
        self.ensure_unique_name(&updated.name, Some(id))?;

        debug!(id, "Updating category");
        self.categories[index] = updated;
        sort_categories(&mut self.categories);
        self.category_ref(id)
    }

    /// Remove a category. Its bookmarks become uncategorized.
    ///
    /// Returns the removed category and how many bookmarks were moved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CategoryNotFound`] if no category has the id.
    pub fn delete_category(&mut self, id: &str) -> Result<(Category, usize)> {
        let index = self.category_index(id)?;
        let category = self.categories.remove(index);

        let mut moved = 0;
        for bookmark in &mut self.bookmarks {
            if bookmark.category_id.as_deref() == Some(id) {
                bookmark.category_id = None;
                moved += 1;
            }
        }

        info!(id, moved, "Deleted category");
        Ok((category, moved))
    }

    fn category_index(&self, id: &str) -> Result<usize> {
        self.categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::CategoryNotFound { id: id.to_string() })
    }

    fn category_ref(&self, id: &str) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::CategoryNotFound { id: id.to_string() })
    }

    fn ensure_unique_name(&self, name: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .categories
            .iter()
            .any(|c| c.has_name(name) && Some(c.id.as_str()) != except_id);
        if taken {
            Err(Error::DuplicateCategory {
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    // === Views ===

    /// Bookmarks passing the filter and query, newest first.
    #[must_use]
    pub fn filtered(&self, filter: &CategoryFilter, query: &SearchQuery) -> Vec<&Bookmark> {
        let mut matches: Vec<&Bookmark> = self
            .bookmarks
            .iter()
            .filter(|b| filter.accepts(b) && query.matches(b))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    /// One page of the filtered view.
    ///
    /// An empty view is page 1 of 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PageOutOfRange`] for a page outside `1..=total_pages`.
    pub fn page(
        &self,
        filter: &CategoryFilter,
        query: &SearchQuery,
        page: usize,
        per_page: usize,
    ) -> Result<Page<'_>> {
        let per_page = per_page.max(1);
        let matches = self.filtered(filter, query);
        let total_items = matches.len();
        let total_pages = total_items.div_ceil(per_page);

        if total_items == 0 && page <= 1 {
            return Ok(Page {
                items: Vec::new(),
                page: 1,
                per_page,
                total_items,
                total_pages,
                has_next: false,
                has_prev: false,
            });
        }

        if page == 0 || page > total_pages {
            return Err(Error::PageOutOfRange { page, total_pages });
        }

        let items = matches
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Ok(Page {
            items,
            page,
            per_page,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        })
    }

    /// Delete exactly the bookmarks the filtered view shows.
    ///
    /// Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClearAllRefused`] for [`CategoryFilter::All`].
    pub fn clear(&mut self, filter: &CategoryFilter, query: &SearchQuery) -> Result<usize> {
        if *filter == CategoryFilter::All {
            return Err(Error::ClearAllRefused);
        }

        let before = self.bookmarks.len();
        self.bookmarks
            .retain(|b| !(filter.accepts(b) && query.matches(b)));
        let removed = before - self.bookmarks.len();

        info!(removed, ?filter, "Cleared bookmarks");
        Ok(removed)
    }

    // === Maintenance ===

    /// Move bookmarks pointing at missing categories to uncategorized.
    ///
    /// Returns the number of bookmarks fixed.
    pub fn repair_orphans(&mut self) -> usize {
        let known: HashSet<&str> = self.categories.iter().map(|c| c.id.as_str()).collect();
        let mut fixed = 0;
        for bookmark in &mut self.bookmarks {
            if let Some(id) = &bookmark.category_id {
                if !known.contains(id.as_str()) {
                    bookmark.category_id = None;
                    fixed += 1;
                }
            }
        }
        if fixed > 0 {
            info!(fixed, "Repaired bookmarks with missing categories");
        }
        fixed
    }

    /// Merge another dataset into this one.
    ///
    /// Categories are matched by name and bookmarks by URL; matches are kept
    /// as they are here. Imported bookmarks that pointed at a category with
    /// an existing name are moved to the existing category.
    pub fn merge(&mut self, bookmarks: Vec<Bookmark>, categories: Vec<Category>) -> MergeReport {
        let mut report = MergeReport::default();
        let mut remap: HashMap<String, String> = HashMap::new();

        for mut category in categories {
            if let Some(existing) = self.categories.iter().find(|c| c.has_name(&category.name)) {
                remap.insert(category.id, existing.id.clone());
                continue;
            }
            if self.categories.iter().any(|c| c.id == category.id) {
                let fresh = Uuid::new_v4().to_string();
                remap.insert(category.id.clone(), fresh.clone());
                category.id = fresh;
            }
            self.categories.push(category);
            report.categories_added += 1;
        }
        sort_categories(&mut self.categories);

        let mut urls: HashSet<String> = self.bookmarks.iter().map(|b| b.url.clone()).collect();
        for mut bookmark in bookmarks {
            if !urls.insert(bookmark.url.clone()) {
                report.bookmarks_skipped += 1;
                continue;
            }
            if let Some(id) = &bookmark.category_id {
                if let Some(target) = remap.get(id) {
                    bookmark.category_id = Some(target.clone());
                }
            }
            if self.bookmarks.iter().any(|b| b.id == bookmark.id) {
                bookmark.id = Uuid::new_v4().to_string();
            }
            self.bookmarks.push(bookmark);
            report.bookmarks_added += 1;
        }

        report.orphans_repaired = self.repair_orphans();
        info!(
            categories = report.categories_added,
            bookmarks = report.bookmarks_added,
            skipped = report.bookmarks_skipped,
            "Merged dataset"
        );
        report
    }

    /// Summary numbers.
    #[must_use]
    pub fn stats(&self) -> LibraryStats {
        let uncategorized = self
            .bookmarks
            .iter()
            .filter(|b| b.is_uncategorized())
            .count();

        let per_category = self
            .categories
            .iter()
            .map(|c| CategoryCount {
                id: c.id.clone(),
                name: c.name.clone(),
                count: self
                    .bookmarks
                    .iter()
                    .filter(|b| b.category_id.as_deref() == Some(c.id.as_str()))
                    .count(),
            })
            .collect();

        LibraryStats {
            total_bookmarks: self.bookmarks.len(),
            total_categories: self.categories.len(),
            categorized: self.bookmarks.len() - uncategorized,
            uncategorized,
            total_visits: self.bookmarks.iter().map(|b| b.visit_count).sum(),
            per_category,
        }
    }
}
