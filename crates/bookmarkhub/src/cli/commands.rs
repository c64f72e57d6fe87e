//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::bookmark::{BookmarkDraft, BookmarkPatch};
use crate::category::{CategoryDraft, CategoryPatch};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Address to save (`https://` is added to bare domains)
    pub url: String,

    /// Bookmark title
    #[arg(short, long)]
    pub title: String,

    /// Longer description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Preview image URL
    #[arg(long, value_name = "URL")]
    pub image: Option<String>,

    /// Category id or name
    #[arg(short, long)]
    pub category: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

impl AddCommand {
    /// Build a draft with the category already resolved to an id.
    #[must_use]
    pub fn to_draft(&self, category_id: Option<String>) -> BookmarkDraft {
        BookmarkDraft {
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            image_url: self.image.clone(),
            category_id,
            tags: self.tags.clone(),
        }
    }
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Bookmark id
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New address
    #[arg(short, long)]
    pub url: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New preview image URL
    #[arg(long, value_name = "URL", conflicts_with = "no_image")]
    pub image: Option<String>,

    /// Remove the preview image
    #[arg(long)]
    pub no_image: bool,

    /// Move to this category (id or name)
    #[arg(short, long, conflicts_with = "uncategorized")]
    pub category: Option<String>,

    /// Remove the bookmark from its category
    #[arg(long)]
    pub uncategorized: bool,

    /// Replace the tags (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Option<Vec<String>>,
}

impl EditCommand {
    /// Build a patch with the category already resolved to an id.
    #[must_use]
    pub fn to_patch(&self, category_id: Option<String>) -> BookmarkPatch {
        let image_url = if self.no_image {
            Some(None)
        } else {
            self.image.clone().map(Some)
        };
        let category_id = if self.uncategorized {
            Some(None)
        } else {
            category_id.map(Some)
        };

        BookmarkPatch {
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            image_url,
            category_id,
            tags: self.tags.clone(),
        }
    }
}

/// Category filter and paging shared by listing commands.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Only show this category (id or name)
    #[arg(short, long, conflicts_with = "uncategorized")]
    pub category: Option<String>,

    /// Only show bookmarks without a category
    #[arg(long)]
    pub uncategorized: bool,

    /// Page to show
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Bookmarks per page (defaults to the configured value)
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Filter and paging
    #[command(flatten)]
    pub view: ViewArgs,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Query: words must all match; `a|b` matches either
    pub query: String,

    /// Filter and paging
    #[command(flatten)]
    pub view: ViewArgs,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Clear this category (id or name)
    #[arg(short, long, conflicts_with = "uncategorized", required_unless_present = "uncategorized")]
    pub category: Option<String>,

    /// Clear bookmarks without a category
    #[arg(long)]
    pub uncategorized: bool,

    /// Only clear bookmarks matching this query
    #[arg(long)]
    pub query: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Category commands.
#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// Create a category
    Add {
        /// Category name
        name: String,

        /// Hex colour such as #2196F3
        #[arg(long)]
        color: Option<String>,

        /// Sort position
        #[arg(long)]
        order: Option<i64>,
    },

    /// List categories with bookmark counts
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Change a category
    Edit {
        /// Category id or name
        category: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New hex colour
        #[arg(long)]
        color: Option<String>,

        /// New sort position
        #[arg(long)]
        order: Option<i64>,
    },

    /// Delete a category; its bookmarks become uncategorized
    Delete {
        /// Category id or name
        category: String,
    },
}

impl CategoryCommand {
    /// Draft for `category add`.
    #[must_use]
    pub fn draft(name: &str, color: Option<&String>, order: Option<i64>) -> CategoryDraft {
        CategoryDraft {
            name: name.to_string(),
            color: color.cloned(),
            order,
        }
    }

    /// Patch for `category edit`.
    #[must_use]
    pub fn patch(name: Option<&String>, color: Option<&String>, order: Option<i64>) -> CategoryPatch {
        CategoryPatch {
            name: name.cloned(),
            color: color.cloned(),
            order,
        }
    }
}

/// Privacy space commands.
///
/// The current password comes from the global `--password` option.
#[derive(Debug, Subcommand)]
pub enum PrivacyCommand {
    /// Set the privacy password for the first time
    Setup {
        /// Repeat the password
        #[arg(long, value_name = "PASSWORD")]
        confirm: String,
    },

    /// Show whether a password is set and what the privacy space holds
    Status,

    /// Change the privacy password
    ChangePassword {
        /// New password
        #[arg(long = "new", value_name = "PASSWORD")]
        new_password: String,

        /// Repeat the new password
        #[arg(long, value_name = "PASSWORD")]
        confirm: String,
    },
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Output file (defaults to a dated file in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include the privacy space, encrypted with `--password`
    #[arg(long)]
    pub include_privacy: bool,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Backup file to import
    pub file: PathBuf,

    /// Password of this privacy space, when it differs from the backup's
    #[arg(long, value_name = "PASSWORD")]
    pub vault_password: Option<String>,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(id: &str) -> EditCommand {
        EditCommand {
            id: id.to_string(),
            title: None,
            url: None,
            description: None,
            image: None,
            no_image: false,
            category: None,
            uncategorized: false,
            tags: None,
        }
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_add_to_draft() {
        let cmd = AddCommand {
            url: "example.com".to_string(),
            title: "Example".to_string(),
            description: None,
            image: None,
            category: Some("Work".to_string()),
            tags: vec!["a".to_string()],
        };
        let draft = cmd.to_draft(Some("work".to_string()));
        assert_eq!(draft.category_id.as_deref(), Some("work"));
        assert_eq!(draft.tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_empty_edit_is_empty_patch() {
        assert!(edit("x").to_patch(None).is_empty());
    }

    #[test]
    fn test_edit_removals() {
        let cmd = EditCommand {
            no_image: true,
            uncategorized: true,
            ..edit("x")
        };
        let patch = cmd.to_patch(None);
        assert_eq!(patch.image_url, Some(None));
        assert_eq!(patch.category_id, Some(None));
    }

    #[test]
    fn test_edit_category() {
        let patch = edit("x").to_patch(Some("news".to_string()));
        assert_eq!(patch.category_id, Some(Some("news".to_string())));
    }

    #[test]
    fn test_category_patch() {
        let name = "Renamed".to_string();
        let patch = CategoryCommand::patch(Some(&name), None, Some(2));
        assert_eq!(patch.name.as_deref(), Some("Renamed"));
        assert_eq!(patch.order, Some(2));
    }
}
