//! Category model.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bookmark::{new_id, sanitize_text};
use crate::config::DefaultCategory;
use crate::error::{Error, Result};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("hex colour pattern"));

/// Longest allowed category name, in characters.
pub const MAX_NAME_LENGTH: usize = 20;

/// Colours offered when creating a category.
pub const PRESET_COLORS: [&str; 15] = [
    "#2196F3", "#4CAF50", "#FF9800", "#9C27B0", "#F44336", "#00BCD4", "#795548", "#607D8B",
    "#E91E63", "#3F51B5", "#009688", "#8BC34A", "#CDDC39", "#FFC107", "#FF5722",
];

/// A named, coloured group of bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier.
    #[serde(default = "new_id")]
    pub id: String,

    /// Display name.
    pub name: String,

    /// `#RGB` or `#RRGGBB` colour.
    #[serde(default = "default_color")]
    pub color: String,

    /// Sort position, lower first.
    #[serde(default)]
    pub order: i64,

    /// When the category was created.
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Input for a new category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Display name.
    pub name: String,
    /// Colour; the first preset when `None`.
    pub color: Option<String>,
    /// Sort position.
    pub order: Option<i64>,
}

/// Changes to an existing category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    /// New name.
    pub name: Option<String>,
    /// New colour.
    pub color: Option<String>,
    /// New sort position.
    pub order: Option<i64>,
}

fn default_color() -> String {
    PRESET_COLORS[0].to_string()
}

impl Category {
    /// Create a category from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name or colour is invalid.
    pub fn new(draft: CategoryDraft) -> Result<Self> {
        let category = Self {
            id: new_id(),
            name: sanitize_text(&draft.name),
            color: draft
                .color
                .map(|c| c.trim().to_string())
                .unwrap_or_else(default_color),
            order: draft.order.unwrap_or(0),
            created_at: Utc::now(),
        };
        category.validate()?;
        Ok(category)
    }

    /// Build a category from a configured default.
    #[must_use]
    pub fn from_default(default: &DefaultCategory, order: i64) -> Self {
        Self {
            id: default.id.clone(),
            name: default.name.clone(),
            color: default.color.clone(),
            order,
            created_at: Utc::now(),
        }
    }

    /// Check the category's fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.name.is_empty() {
            problems.push("name is required".to_string());
        } else if self.name.chars().count() > MAX_NAME_LENGTH {
            problems.push(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            ));
        }

        if !is_valid_color(&self.color) {
            problems.push(format!("'{}' is not a valid colour", self.color));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                entity: "category",
                problems,
            })
        }
    }

    /// Apply a patch, re-validating the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the patched category is invalid; the
    /// category is left unchanged in that case.
    pub fn apply(&mut self, patch: CategoryPatch) -> Result<()> {
        let mut updated = self.clone();
        if let Some(name) = patch.name {
            updated.name = sanitize_text(&name);
        }
        if let Some(color) = patch.color {
            updated.color = color.trim().to_string();
        }
        if let Some(order) = patch.order {
            updated.order = order;
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Text colour readable on top of this category's colour.
    #[must_use]
    pub fn contrast_color(&self) -> &'static str {
        contrast_color(&self.color)
    }

    /// Whether `name` refers to this category, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Whether `color` is a `#RGB` or `#RRGGBB` hex colour.
#[must_use]
pub fn is_valid_color(color: &str) -> bool {
    HEX_COLOR.is_match(color)
}

/// Black or white, whichever reads better on `color`.
///
/// Invalid colours get black text.
#[must_use]
pub fn contrast_color(color: &str) -> &'static str {
    let Some((r, g, b)) = parse_rgb(color) else {
        return "#000000";
    };
    let brightness = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
    if brightness > 128 {
        "#000000"
    } else {
        "#FFFFFF"
    }
}

fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
    if !is_valid_color(color) {
        return None;
    }
    let hex = &color[1..];
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Sort categories by `order`, then by creation time.
pub fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(compare);
}

fn compare(a: &Category, b: &Category) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.created_at.cmp(&b.created_at))
}
