//! The application session.
//!
//! [`BookmarkHub`] owns the store, the main library and, once unlocked, the
//! privacy library. Commands mutate the active library and call
//! [`BookmarkHub::save`] to persist it.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backup::{Backup, ImportReport, PrivacyExport, PrivacyImport};
use crate::bookmark::Bookmark;
use crate::category::Category;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::library::{Library, MergeReport};
use crate::privacy::{seal, unseal, PrivacyPayload, Vault};
use crate::storage::{keys, Storage, StorageStats};

/// An unlocked privacy space.
#[derive(Debug)]
struct PrivacySession {
    library: Library,
    password: String,
}

/// Configuration, storage and loaded libraries for one process.
#[derive(Debug)]
pub struct BookmarkHub {
    config: Config,
    storage: Storage,
    main: Library,
    privacy: Option<PrivacySession>,
    pending_import: Option<PrivacyPayload>,
}

impl BookmarkHub {
    /// Open the database named by `config` and load the main library.
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be opened or holds corrupt data.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        Self::with_storage(config, storage)
    }

    /// Open a hub over a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be created.
    pub fn open_in_memory(config: Config) -> Result<Self> {
        Self::with_storage(config, Storage::open_in_memory()?)
    }

    /// Load the main library from `storage`.
    ///
    /// A store that has never held categories is seeded with the configured
    /// defaults. Bookmarks pointing at missing categories are repaired, and
    /// records missing ids or timestamps are written back completed.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data is corrupt or saving fails.
    pub fn with_storage(config: Config, storage: Storage) -> Result<Self> {
        let bookmarks: Vec<Bookmark> = storage.get_json(keys::BOOKMARKS)?.unwrap_or_default();
        let stored: Option<Vec<Category>> = storage.get_json(keys::CATEGORIES)?;

        let seeded = stored.is_none();
        let mut main = match stored {
            Some(categories) => Library::new(bookmarks, categories),
            None => {
                info!("Seeding default categories");
                let mut library = Library::with_defaults(&config.categories.defaults);
                library.merge(bookmarks, Vec::new());
                library
            }
        };
        let repaired = main.repair_orphans();
        let rewritten = !seeded
            && (differs_from_stored(&storage, keys::BOOKMARKS, main.bookmarks())?
                || differs_from_stored(&storage, keys::CATEGORIES, main.categories())?);

        let hub = Self {
            config,
            storage,
            main,
            privacy: None,
            pending_import: None,
        };
        if rewritten {
            debug!("Rewriting main library in current format");
        }
        if seeded || repaired > 0 || rewritten {
            hub.save_main()?;
        }

        debug!(
            bookmarks = hub.main.bookmarks().len(),
            categories = hub.main.categories().len(),
            "Loaded main library"
        );
        Ok(hub)
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Password access to the privacy partition.
    #[must_use]
    pub fn vault(&self) -> Vault<'_> {
        Vault::new(&self.storage, self.config.privacy.min_password_length)
    }

    /// The main library.
    #[must_use]
    pub fn main(&self) -> &Library {
        &self.main
    }

    /// Whether the privacy space is unlocked and active.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.privacy.is_some()
    }

    /// The active library: the privacy space when unlocked, else the main one.
    #[must_use]
    pub fn library(&self) -> &Library {
        self.privacy.as_ref().map_or(&self.main, |s| &s.library)
    }

    /// Mutable access to the active library.
    pub fn library_mut(&mut self) -> &mut Library {
        match &mut self.privacy {
            Some(session) => &mut session.library,
            None => &mut self.main,
        }
    }

    /// The unlocked privacy library.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrivacyLocked`] until [`BookmarkHub::unlock`] succeeds.
    pub fn privacy_library(&self) -> Result<&Library> {
        self.privacy
            .as_ref()
            .map(|session| &session.library)
            .ok_or(Error::PrivacyLocked)
    }

    /// Persist the active library.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the database operation fails.
    pub fn save(&self) -> Result<()> {
        match &self.privacy {
            Some(session) => self.vault().save(&session.library, &session.password),
            None => self.save_main(),
        }
    }

    /// Persist the main library.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_main(&self) -> Result<()> {
        self.storage.set_many(&[
            (keys::BOOKMARKS, serde_json::to_string(self.main.bookmarks())?),
            (keys::CATEGORIES, serde_json::to_string(self.main.categories())?),
        ])
    }

    // === Privacy space ===

    /// Set the first privacy password.
    ///
    /// # Errors
    ///
    /// See [`Vault::setup`].
    pub fn setup_privacy(&self, password: &str, confirm: &str) -> Result<()> {
        self.vault().setup(password, confirm)
    }

    /// Unlock the privacy space and make it active.
    ///
    /// Privacy data held back by an earlier import is merged now; its merge
    /// report is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPassword`], [`Error::PasswordNotSet`] or a
    /// decryption error.
    pub fn unlock(&mut self, password: &str) -> Result<Option<MergeReport>> {
        let mut library = self.vault().unlock(password)?;

        let merged = self.pending_import.take().map(|payload| {
            info!("Merging privacy data from earlier import");
            library.merge(payload.bookmarks, payload.categories)
        });
        if merged.is_some() {
            self.vault().save(&library, password)?;
        }

        self.privacy = Some(PrivacySession {
            library,
            password: password.to_string(),
        });
        Ok(merged)
    }

    /// Leave the privacy space. The main library becomes active.
    pub fn lock(&mut self) {
        if self.privacy.take().is_some() {
            debug!("Privacy space locked");
        }
    }

    /// Whether imported privacy data is waiting for an unlock.
    #[must_use]
    pub fn has_pending_import(&self) -> bool {
        self.pending_import.is_some()
    }

    /// Change the privacy password.
    ///
    /// # Errors
    ///
    /// See [`Vault::change_password`].
    pub fn change_password(&mut self, current: &str, new: &str, confirm: &str) -> Result<()> {
        self.vault().change_password(current, new, confirm)?;
        if let Some(session) = &mut self.privacy {
            session.password = new.to_string();
        }
        Ok(())
    }

    // === Backup ===

    /// Build a backup of the main library, plus the privacy space when
    /// `privacy_password` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordNotSet`] if privacy data is requested but no
    /// privacy password exists, or [`Error::InvalidPassword`] if the password
    /// is wrong.
    pub fn export(&self, privacy_password: Option<&str>) -> Result<(Backup, PrivacyExport)> {
        let mut backup = Backup::new(&self.main);

        let Some(password) = privacy_password else {
            return Ok((backup, PrivacyExport::NotRequested));
        };

        let vault = self.vault();
        if !vault.has_password()? {
            return Err(Error::PasswordNotSet);
        }

        let unlocked;
        let library = match &self.privacy {
            Some(session) if session.password == password => &session.library,
            _ => {
                unlocked = vault.unlock(password)?;
                &unlocked
            }
        };

        if library.bookmarks().is_empty() && library.categories().is_empty() {
            warn!("Privacy space is empty; leaving it out of the backup");
            return Ok((backup, PrivacyExport::Empty));
        }

        backup.privacy_data = Some(seal(library, password)?);
        let outcome = PrivacyExport::Included {
            bookmarks: library.bookmarks().len(),
            categories: library.categories().len(),
        };
        info!("Exported privacy data");
        Ok((backup, outcome))
    }

    /// Import a backup file.
    ///
    /// # Errors
    ///
    /// See [`Backup::read_file`] and [`BookmarkHub::import`].
    pub fn import_file(&mut self, path: &Path, password: Option<&str>) -> Result<ImportReport> {
        let backup = Backup::read_file(path, self.config.backup.max_file_size)?;
        self.import(backup, password)
    }

    /// Replace the main library with the backup's and handle its privacy
    /// section.
    ///
    /// Privacy data that can't be decrypted is skipped with a warning; the
    /// main data stays imported.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn import(&mut self, backup: Backup, password: Option<&str>) -> Result<ImportReport> {
        let mut main = backup.main_library();
        let orphans_repaired = main.repair_orphans();
        self.main = main;
        self.save_main()?;
        info!(
            bookmarks = self.main.bookmarks().len(),
            categories = self.main.categories().len(),
            "Imported main data"
        );

        let privacy = match (backup.privacy_data.as_deref(), password) {
            (None, _) => PrivacyImport::Absent,
            (Some(_), None) => {
                warn!("Backup has privacy data but no password was given; skipping it");
                PrivacyImport::Skipped {
                    reason: "no password supplied".to_string(),
                }
            }
            (Some(sealed), Some(password)) => self.import_privacy(sealed, password)?,
        };

        Ok(ImportReport {
            bookmarks: self.main.bookmarks().len(),
            categories: self.main.categories().len(),
            orphans_repaired,
            privacy,
        })
    }

    fn import_privacy(&mut self, sealed: &str, password: &str) -> Result<PrivacyImport> {
        let payload = match unseal(sealed, password) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Could not decrypt privacy data: {}", err);
                return Ok(PrivacyImport::Skipped {
                    reason: err.to_string(),
                });
            }
        };

        if !self.vault().has_password()? {
            let mut library = payload.into_library();
            library.repair_orphans();
            self.vault().adopt(&library, password)?;
            return Ok(PrivacyImport::Adopted {
                bookmarks: library.bookmarks().len(),
                categories: library.categories().len(),
            });
        }

        if let Some(session) = &mut self.privacy {
            let report = session
                .library
                .merge(payload.bookmarks, payload.categories);
            self.save()?;
            return Ok(PrivacyImport::Merged(report));
        }

        info!("Holding imported privacy data until the privacy space is unlocked");
        self.pending_import = Some(payload);
        Ok(PrivacyImport::Deferred)
    }

    // === Maintenance ===

    /// Storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn storage_stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }

    /// Delete all stored application data, including the privacy space.
    ///
    /// The in-memory main library is reset to the default categories; the
    /// store is left empty until the next save.
    ///
    /// Returns the number of stored entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_all(&mut self) -> Result<usize> {
        let removed = self.storage.clear_app_data()?;
        self.main = Library::with_defaults(&self.config.categories.defaults);
        self.privacy = None;
        self.pending_import = None;
        warn!("Cleared all stored data");
        Ok(removed)
    }
}

fn differs_from_stored<T: Serialize + ?Sized>(
    storage: &Storage,
    key: &str,
    value: &T,
) -> Result<bool> {
    let current = serde_json::to_string(value)?;
    Ok(storage.get_raw(key)?.as_deref() != Some(current.as_str()))
}
