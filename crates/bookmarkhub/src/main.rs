//! `bmhub` - CLI for bookmarkhub
//!
//! This binary provides the command-line interface for managing bookmarks,
//! categories, backups and the privacy space.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use bookmarkhub::cli::{
    render, CategoryCommand, ClearCommand, Cli, Command, ConfigCommand, ExportCommand,
    HubCommand, ImportCommand, PrivacyCommand, ViewArgs,
};
use bookmarkhub::{
    init_logging, BookmarkHub, CategoryFilter, Config, Error, PrivacyExport, PrivacyImport,
    SearchQuery,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match cli.command {
        Command::Config(cmd) => handle_config(cli.config, &cmd),
        Command::Hub(cmd) => {
            let config = Config::load_from(cli.config)?;
            let mut hub = BookmarkHub::open(config)?;

            if cli.private {
                let password = require_password(cli.password.as_deref())?;
                hub.unlock(password)
                    .context("could not open the privacy space")?;
            }

            handle_hub(&mut hub, cli.password.as_deref(), cmd)
        }
    }
}

fn handle_hub(hub: &mut BookmarkHub, password: Option<&str>, cmd: HubCommand) -> Result<()> {
    match cmd {
        HubCommand::Add(cmd) => {
            let category_id = resolve_category(hub, cmd.category.as_deref())?;
            let bookmark = hub.library_mut().add_bookmark(cmd.to_draft(category_id))?;
            println!("Added \"{}\" ({})", bookmark.title, bookmark.id);
            hub.save()?;
        }
        HubCommand::Edit(cmd) => {
            let category_id = resolve_category(hub, cmd.category.as_deref())?;
            let patch = cmd.to_patch(category_id);
            let bookmark = hub.library_mut().update_bookmark(&cmd.id, patch)?;
            println!("Updated \"{}\"", bookmark.title);
            hub.save()?;
        }
        HubCommand::Delete { id } => {
            let bookmark = hub.library_mut().delete_bookmark(&id)?;
            println!("Deleted \"{}\"", bookmark.title);
            hub.save()?;
        }
        HubCommand::Open { id } => {
            let bookmark = hub.library_mut().record_visit(&id)?;
            println!("{}", bookmark.url);
            hub.save()?;
        }
        HubCommand::List(cmd) => handle_view(hub, &cmd.view, &SearchQuery::default())?,
        HubCommand::Search(cmd) => handle_view(hub, &cmd.view, &SearchQuery::parse(&cmd.query))?,
        HubCommand::Clear(cmd) => handle_clear(hub, &cmd)?,
        HubCommand::Category(cmd) => handle_category(hub, cmd)?,
        HubCommand::Stats { format } => {
            let stats = hub.library().stats();
            let storage = hub.storage_stats()?;
            println!(
                "{}",
                render::stats(&stats, &storage, hub.is_private(), format)?
            );
        }
        HubCommand::Privacy(cmd) => handle_privacy(hub, password, cmd)?,
        HubCommand::Export(cmd) => handle_export(hub, password, &cmd)?,
        HubCommand::Import(cmd) => handle_import(hub, password, cmd)?,
        HubCommand::Reset(cmd) => {
            if !cmd.yes {
                println!("This deletes every bookmark, category and the privacy space.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let removed = hub.clear_all()?;
            println!("Removed {removed} stored entries.");
        }
    }

    Ok(())
}

fn require_password(password: Option<&str>) -> Result<&str> {
    password
        .filter(|p| !p.is_empty())
        .context("this command needs the privacy password (--password or BMHUB_PASSWORD)")
}

fn resolve_category(hub: &BookmarkHub, category: Option<&str>) -> Result<Option<String>> {
    Ok(category
        .map(|c| hub.library().resolve_category(c).map(|c| c.id.clone()))
        .transpose()?)
}

fn view_filter(hub: &BookmarkHub, category: Option<&str>, uncategorized: bool) -> Result<CategoryFilter> {
    if uncategorized {
        return Ok(CategoryFilter::Uncategorized);
    }
    Ok(resolve_category(hub, category)?.map_or(CategoryFilter::All, CategoryFilter::Category))
}

fn handle_view(hub: &BookmarkHub, view: &ViewArgs, query: &SearchQuery) -> Result<()> {
    let filter = view_filter(hub, view.category.as_deref(), view.uncategorized)?;
    let per_page = view
        .per_page
        .unwrap_or(hub.config().display.items_per_page);

    let library = hub.library();
    let page = library.page(&filter, query, view.page, per_page)?;
    let favicons = &hub.config().display.favicon_service;
    println!("{}", render::page(library, &page, view.format, favicons)?);
    Ok(())
}

fn handle_clear(hub: &mut BookmarkHub, cmd: &ClearCommand) -> Result<()> {
    let filter = view_filter(hub, cmd.category.as_deref(), cmd.uncategorized)?;
    let query = SearchQuery::parse(cmd.query.as_deref().unwrap_or_default());

    if !cmd.yes {
        let count = hub.library().filtered(&filter, &query).len();
        println!("This deletes {count} bookmarks.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let removed = hub.library_mut().clear(&filter, &query)?;
    hub.save()?;
    println!("Deleted {removed} bookmarks.");
    Ok(())
}

fn handle_category(hub: &mut BookmarkHub, cmd: CategoryCommand) -> Result<()> {
    match cmd {
        CategoryCommand::Add { name, color, order } => {
            let draft = CategoryCommand::draft(&name, color.as_ref(), order);
            let category = hub.library_mut().add_category(draft)?;
            println!("Added category \"{}\" ({})", category.name, category.id);
        }
        CategoryCommand::List { format } => {
            let library = hub.library();
            println!(
                "{}",
                render::categories(library, &library.stats(), format)?
            );
            return Ok(());
        }
        CategoryCommand::Edit {
            category,
            name,
            color,
            order,
        } => {
            let id = hub.library().resolve_category(&category)?.id.clone();
            let patch = CategoryCommand::patch(name.as_ref(), color.as_ref(), order);
            let category = hub.library_mut().update_category(&id, patch)?;
            println!("Updated category \"{}\"", category.name);
        }
        CategoryCommand::Delete { category } => {
            let id = hub.library().resolve_category(&category)?.id.clone();
            let (category, moved) = hub.library_mut().delete_category(&id)?;
            println!(
                "Deleted category \"{}\"; {moved} bookmarks are now uncategorized",
                category.name
            );
        }
    }
    hub.save()?;
    Ok(())
}

fn handle_privacy(hub: &mut BookmarkHub, password: Option<&str>, cmd: PrivacyCommand) -> Result<()> {
    match cmd {
        PrivacyCommand::Setup { confirm } => {
            hub.setup_privacy(require_password(password)?, &confirm)?;
            println!("Privacy space password set.");
        }
        PrivacyCommand::Status => {
            let has_password = hub.vault().has_password()?;
            println!("Password set:   {}", if has_password { "yes" } else { "no" });

            let Some(password) = password.filter(|_| has_password) else {
                return Ok(());
            };
            if !hub.is_private() {
                match hub.unlock(password) {
                    Ok(_) => {}
                    Err(Error::InvalidPassword) => {
                        println!("Unlocked:       no (wrong password)");
                        return Ok(());
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            let stats = hub.privacy_library()?.stats();
            println!("Unlocked:       yes");
            println!("Bookmarks:      {}", stats.total_bookmarks);
            println!("Categories:     {}", stats.total_categories);
        }
        PrivacyCommand::ChangePassword {
            new_password,
            confirm,
        } => {
            hub.change_password(require_password(password)?, &new_password, &confirm)?;
            println!("Privacy space password changed.");
        }
    }
    Ok(())
}

fn handle_export(hub: &BookmarkHub, password: Option<&str>, cmd: &ExportCommand) -> Result<()> {
    let privacy_password = if cmd.include_privacy {
        Some(require_password(password)?)
    } else {
        None
    };

    let (backup, outcome) = hub.export(privacy_password)?;
    let path = cmd.output.clone().unwrap_or_else(|| {
        PathBuf::from(hub.config().backup_file_name(Local::now().date_naive()))
    });
    backup.write_file(&path)?;

    println!(
        "Exported {} bookmarks and {} categories to {}",
        backup.bookmarks.len(),
        backup.categories.len(),
        path.display()
    );
    match outcome {
        PrivacyExport::NotRequested => {}
        PrivacyExport::Empty => eprintln!("Warning: the privacy space is empty; it was not exported."),
        PrivacyExport::Included {
            bookmarks,
            categories,
        } => println!("Included privacy space: {bookmarks} bookmarks, {categories} categories (encrypted)"),
    }
    Ok(())
}

fn handle_import(hub: &mut BookmarkHub, password: Option<&str>, cmd: ImportCommand) -> Result<()> {
    let report = hub
        .import_file(&cmd.file, password)
        .with_context(|| format!("could not import {}", cmd.file.display()))?;

    println!(
        "Imported {} bookmarks and {} categories.",
        report.bookmarks, report.categories
    );
    if report.orphans_repaired > 0 {
        println!(
            "{} bookmarks had missing categories and are now uncategorized.",
            report.orphans_repaired
        );
    }

    match report.privacy {
        PrivacyImport::Absent => {}
        PrivacyImport::Skipped { reason } => {
            eprintln!("Warning: privacy data was not imported ({reason}).");
        }
        PrivacyImport::Adopted {
            bookmarks,
            categories,
        } => println!(
            "Created the privacy space from the backup: {bookmarks} bookmarks, {categories} categories. Its password is the backup password."
        ),
        PrivacyImport::Merged(merge) => println!(
            "Merged into the privacy space: {} bookmarks added, {} already present.",
            merge.bookmarks_added, merge.bookmarks_skipped
        ),
        PrivacyImport::Deferred => {
            let vault_password = cmd.vault_password.as_deref().or(password);
            let merged = match vault_password {
                Some(vault_password) => match hub.unlock(vault_password) {
                    Ok(merged) => merged,
                    Err(Error::InvalidPassword) => None,
                    Err(err) => return Err(err.into()),
                },
                None => None,
            };
            match merged {
                Some(merge) => println!(
                    "Merged into the privacy space: {} bookmarks added, {} already present.",
                    merge.bookmarks_added, merge.bookmarks_skipped
                ),
                None => eprintln!(
                    "Warning: privacy data was decrypted but not merged; re-run with --vault-password set to this privacy space's password."
                ),
            }
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Display]");
                println!("  Items per page:     {}", config.display.items_per_page);
                println!("  Favicon service:    {}", config.display.favicon_service);
                println!();
                println!("[Privacy]");
                println!(
                    "  Min password len:   {}",
                    config.privacy.min_password_length
                );
                println!();
                println!("[Backup]");
                println!("  File prefix:        {}", config.backup.file_prefix);
                println!(
                    "  Max file size:      {}",
                    render::human_size(config.backup.max_file_size)
                );
                println!();
                println!("[Categories]");
                for category in &config.categories.defaults {
                    println!(
                        "  {:<18}  {} {}",
                        category.id, category.name, category.color
                    );
                }
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .clone()
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
