//! Command-line interface for bookmarkhub.
//!
//! This module provides the CLI structure for the `bmhub` binary and the
//! renderers it prints with.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, CategoryCommand, ClearCommand, ConfigCommand, EditCommand, ExportCommand,
    ImportCommand, ListCommand, OutputFormat, PrivacyCommand, ResetCommand, SearchCommand,
    ViewArgs,
};

use crate::logging::Verbosity;

/// bmhub - Keep your bookmarks in one place
///
/// Saves, categorizes and searches bookmarks in a local database, with an
/// optional password-protected privacy space.
#[derive(Debug, Parser)]
#[command(name = "bmhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Work in the privacy space (needs --password)
    #[arg(long, global = true, requires = "password")]
    pub private: bool,

    /// Privacy space password
    #[arg(
        long,
        global = true,
        env = "BMHUB_PASSWORD",
        hide_env_values = true,
        value_name = "PASSWORD"
    )]
    pub password: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Commands that work on the bookmark database
    #[command(flatten)]
    Hub(HubCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Commands that open the bookmark database.
#[derive(Debug, Subcommand)]
pub enum HubCommand {
    /// Save a new bookmark
    Add(AddCommand),

    /// Change a bookmark
    Edit(EditCommand),

    /// Delete a bookmark
    Delete {
        /// Bookmark id
        id: String,
    },

    /// Print a bookmark's URL and count the visit
    Open {
        /// Bookmark id
        id: String,
    },

    /// List bookmarks, newest first
    List(ListCommand),

    /// Search bookmarks
    Search(SearchCommand),

    /// Delete every bookmark in a category or search result
    Clear(ClearCommand),

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Show library and storage statistics
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Manage the privacy space
    #[command(subcommand)]
    Privacy(PrivacyCommand),

    /// Write a backup file
    Export(ExportCommand),

    /// Restore from a backup file
    Import(ImportCommand),

    /// Delete all stored data, including the privacy space
    Reset(ResetCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
