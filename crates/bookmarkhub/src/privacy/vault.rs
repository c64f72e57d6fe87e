//! The privacy vault: password verifier plus encrypted privacy partition.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cipher;
use crate::bookmark::Bookmark;
use crate::category::Category;
use crate::error::{Error, Result};
use crate::library::Library;
use crate::storage::{keys, Storage};

/// Context string for the password verifier hash.
const VERIFIER_CONTEXT: &str = "bookmarkhub 2024-01-01 privacy password verifier";

/// Prefix marking a current-format verifier.
const VERIFIER_PREFIX: &str = "b3:";

/// Salt older releases appended before base64-encoding the password.
const LEGACY_SALT: &str = "salt_key_2024";

/// Plaintext of the encrypted privacy partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyPayload {
    /// Private bookmarks.
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,

    /// Private categories.
    #[serde(default)]
    pub categories: Vec<Category>,

    /// When the payload was written.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PrivacyPayload {
    /// Snapshot a library.
    #[must_use]
    pub fn from_library(library: &Library) -> Self {
        Self {
            bookmarks: library.bookmarks().to_vec(),
            categories: library.categories().to_vec(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Turn the payload back into a library.
    #[must_use]
    pub fn into_library(self) -> Library {
        Library::new(self.bookmarks, self.categories)
    }
}

/// Encrypt a library snapshot under `password`.
///
/// # Errors
///
/// Returns an error if serialization fails or the password is empty.
pub fn seal(library: &Library, password: &str) -> Result<String> {
    let json = serde_json::to_string(&PrivacyPayload::from_library(library))?;
    cipher::encrypt(&json, password)
}

/// Decrypt a payload produced by [`seal`].
///
/// # Errors
///
/// Returns [`Error::Decrypt`] if the ciphertext cannot be decrypted or does
/// not hold a payload.
pub fn unseal(sealed: &str, password: &str) -> Result<PrivacyPayload> {
    let json = cipher::decrypt(sealed, password)?;
    serde_json::from_str(&json).map_err(|e| Error::decrypt(format!("invalid privacy payload: {e}")))
}

/// Hash a password into the stored verifier format.
#[must_use]
pub fn verifier_for(password: &str) -> String {
    let hash = blake3::derive_key(VERIFIER_CONTEXT, password.as_bytes());
    format!("{VERIFIER_PREFIX}{}", hex::encode(hash))
}

/// Whether `stored` is a verifier older releases wrote for `password`.
fn matches_legacy(stored: &str, password: &str) -> bool {
    stored == BASE64.encode(format!("{password}{LEGACY_SALT}")) || stored == BASE64.encode(password)
}

/// Password-protected access to the privacy partition in a [`Storage`].
#[derive(Debug)]
pub struct Vault<'a> {
    storage: &'a Storage,
    min_password_length: usize,
}

impl<'a> Vault<'a> {
    /// Create a vault over `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage, min_password_length: usize) -> Self {
        Self {
            storage,
            min_password_length,
        }
    }

    /// Whether a privacy password has been set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn has_password(&self) -> Result<bool> {
        self.storage.contains(keys::PRIVACY_PASSWORD)
    }

    /// Set the first privacy password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordAlreadySet`] if a password exists, or
    /// [`Error::PasswordRule`] if the password is too short or the
    /// confirmation differs.
    pub fn setup(&self, password: &str, confirm: &str) -> Result<()> {
        if self.has_password()? {
            return Err(Error::PasswordAlreadySet);
        }
        self.check_new_password(password, confirm)?;

        self.storage
            .set_raw(keys::PRIVACY_PASSWORD, &verifier_for(password))?;
        info!("Privacy password set");
        Ok(())
    }

    fn check_new_password(&self, password: &str, confirm: &str) -> Result<()> {
        if password.chars().count() < self.min_password_length {
            return Err(Error::password_rule(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }
        if password != confirm {
            return Err(Error::password_rule("passwords do not match"));
        }
        Ok(())
    }

    /// Check `password` against the stored verifier.
    ///
    /// A legacy verifier that matches is replaced by the current format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordNotSet`] if no password exists, or an error
    /// if the database operation fails.
    pub fn verify(&self, password: &str) -> Result<bool> {
        let stored = self
            .storage
            .get_raw(keys::PRIVACY_PASSWORD)?
            .ok_or(Error::PasswordNotSet)?;

        if stored.starts_with(VERIFIER_PREFIX) {
            return Ok(stored == verifier_for(password));
        }

        if matches_legacy(&stored, password) {
            self.storage
                .set_raw(keys::PRIVACY_PASSWORD, &verifier_for(password))?;
            info!("Upgraded legacy privacy password verifier");
            return Ok(true);
        }

        Ok(false)
    }

    fn require(&self, password: &str) -> Result<()> {
        if self.verify(password)? {
            Ok(())
        } else {
            warn!("Rejected privacy password");
            Err(Error::InvalidPassword)
        }
    }

    /// Verify `password` and load the privacy partition.
    ///
    /// Plaintext privacy data left by older releases is folded into the
    /// encrypted partition and deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPassword`], [`Error::PasswordNotSet`], or
    /// [`Error::Decrypt`] if the stored partition can't be decrypted.
    pub fn unlock(&self, password: &str) -> Result<Library> {
        self.require(password)?;

        let mut library = self.load(password)?;
        let migrated = self.migrate_legacy(&mut library)?;
        let repaired = library.repair_orphans();

        if migrated || repaired > 0 {
            self.save(&library, password)?;
        }
        if migrated {
            self.storage.remove(keys::LEGACY_PRIVACY_BOOKMARKS)?;
            self.storage.remove(keys::LEGACY_PRIVACY_CATEGORIES)?;
            info!("Moved legacy plaintext privacy data into the encrypted store");
        }

        debug!(
            bookmarks = library.bookmarks().len(),
            "Privacy space unlocked"
        );
        Ok(library)
    }

    fn load(&self, password: &str) -> Result<Library> {
        match self.storage.get_raw(keys::PRIVACY_DATA_SECURE)? {
            Some(sealed) => Ok(unseal(&sealed, password)?.into_library()),
            None => Ok(Library::default()),
        }
    }

    fn migrate_legacy(&self, library: &mut Library) -> Result<bool> {
        let bookmarks: Option<Vec<Bookmark>> =
            self.storage.get_json(keys::LEGACY_PRIVACY_BOOKMARKS)?;
        let categories: Option<Vec<Category>> =
            self.storage.get_json(keys::LEGACY_PRIVACY_CATEGORIES)?;

        if bookmarks.is_none() && categories.is_none() {
            return Ok(false);
        }

        library.merge(bookmarks.unwrap_or_default(), categories.unwrap_or_default());
        Ok(true)
    }

    /// Encrypt and store the privacy partition.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the database operation fails.
    pub fn save(&self, library: &Library, password: &str) -> Result<()> {
        self.storage
            .set_raw(keys::PRIVACY_DATA_SECURE, &seal(library, password)?)?;
        debug!("Privacy space saved");
        Ok(())
    }

    /// Make `library` the privacy partition under a new `password`.
    ///
    /// Used when importing privacy data before any password was set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordAlreadySet`] if a password exists.
    pub fn adopt(&self, library: &Library, password: &str) -> Result<()> {
        if self.has_password()? {
            return Err(Error::PasswordAlreadySet);
        }
        self.storage.set_many(&[
            (keys::PRIVACY_DATA_SECURE, seal(library, password)?),
            (keys::PRIVACY_PASSWORD, verifier_for(password)),
        ])?;
        info!("Privacy space created from imported data");
        Ok(())
    }

    /// Replace the privacy password, re-encrypting the stored partition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordRule`] if the current password is missing,
    /// the new one is too short, the confirmation differs or nothing would
    /// change; [`Error::InvalidPassword`] if `current` is wrong.
    pub fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<()> {
        if current.is_empty() {
            return Err(Error::password_rule("current password is required"));
        }
        self.check_new_password(new, confirm)?;
        if new == current {
            return Err(Error::password_rule(
                "new password must differ from the current one",
            ));
        }
        self.require(current)?;

        let mut entries = vec![(keys::PRIVACY_PASSWORD, verifier_for(new))];
        if let Some(sealed) = self.storage.get_raw(keys::PRIVACY_DATA_SECURE)? {
            let plain = cipher::decrypt(&sealed, current)?;
            entries.push((keys::PRIVACY_DATA_SECURE, cipher::encrypt(&plain, new)?));
        }
        self.storage.set_many(&entries)?;

        info!("Privacy password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::BookmarkDraft;

    fn storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn sample_library() -> Library {
        let mut library = Library::default();
        library
            .add_bookmark(BookmarkDraft {
                url: "secret.example.com".to_string(),
                title: "Secret".to_string(),
                ..Default::default()
            })
            .unwrap();
        library
    }

    #[test]
    fn test_setup_and_verify() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        assert!(!vault.has_password().unwrap());

        vault.setup("hunter2", "hunter2").unwrap();
        assert!(vault.has_password().unwrap());
        assert!(vault.verify("hunter2").unwrap());
        assert!(!vault.verify("hunter3").unwrap());
    }

    #[test]
    fn test_setup_rules() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);

        let err = vault.setup("abc", "abc").unwrap_err();
        assert!(err.to_string().contains("at least 4"));

        let err = vault.setup("abcd", "abce").unwrap_err();
        assert!(err.to_string().contains("do not match"));

        vault.setup("abcd", "abcd").unwrap();
        assert!(matches!(
            vault.setup("efgh", "efgh").unwrap_err(),
            Error::PasswordAlreadySet
        ));
    }

    #[test]
    fn test_verify_without_password() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        assert!(matches!(
            vault.verify("any").unwrap_err(),
            Error::PasswordNotSet
        ));
    }

    #[test]
    fn test_legacy_verifiers_are_upgraded() {
        for legacy in [BASE64.encode("pass1234salt_key_2024"), BASE64.encode("pass1234")] {
            let storage = storage();
            storage.set_raw(keys::PRIVACY_PASSWORD, &legacy).unwrap();
            let vault = Vault::new(&storage, 4);

            assert!(!vault.verify("wrong").unwrap());
            assert!(vault.verify("pass1234").unwrap());
            assert_eq!(
                storage.get_raw(keys::PRIVACY_PASSWORD).unwrap().unwrap(),
                verifier_for("pass1234")
            );
        }
    }

    #[test]
    fn test_verifier_hides_password() {
        let verifier = verifier_for("hunter2");
        assert!(verifier.starts_with(VERIFIER_PREFIX));
        assert!(!verifier.contains("hunter2"));
        assert_eq!(verifier, verifier_for("hunter2"));
    }

    #[test]
    fn test_save_and_unlock() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        vault.setup("hunter2", "hunter2").unwrap();

        assert!(vault.unlock("hunter2").unwrap().is_empty());

        vault.save(&sample_library(), "hunter2").unwrap();
        let raw = storage.get_raw(keys::PRIVACY_DATA_SECURE).unwrap().unwrap();
        assert!(!raw.contains("secret.example.com"));

        let library = vault.unlock("hunter2").unwrap();
        assert_eq!(library.bookmarks().len(), 1);
        assert_eq!(library.bookmarks()[0].title, "Secret");
    }

    #[test]
    fn test_unlock_wrong_password() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        vault.setup("hunter2", "hunter2").unwrap();

        assert!(vault.unlock("nope").unwrap_err().is_invalid_password());
    }

    #[test]
    fn test_unlock_migrates_legacy_plaintext() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        vault.setup("hunter2", "hunter2").unwrap();

        let (bookmarks, _) = sample_library().into_parts();
        storage
            .set_json(keys::LEGACY_PRIVACY_BOOKMARKS, &bookmarks)
            .unwrap();

        let library = vault.unlock("hunter2").unwrap();
        assert_eq!(library.bookmarks().len(), 1);
        assert!(!storage.contains(keys::LEGACY_PRIVACY_BOOKMARKS).unwrap());

        // Now served from the encrypted store
        let again = vault.unlock("hunter2").unwrap();
        assert_eq!(again.bookmarks().len(), 1);
    }

    #[test]
    fn test_unlock_migrates_records_from_older_versions() {
        let storage = storage();
        storage
            .set_raw(keys::PRIVACY_PASSWORD, &BASE64.encode("pw12salt_key_2024"))
            .unwrap();
        storage
            .set_raw(
                keys::LEGACY_PRIVACY_CATEGORIES,
                r##"[{"id":"diary","name":"日记","color":"#9C27B0"}]"##,
            )
            .unwrap();
        storage
            .set_raw(
                keys::LEGACY_PRIVACY_BOOKMARKS,
                r#"[{"id":"k9x1","title":"Notes","url":"https://notes.example.com","categoryId":"diary","createdAt":1700000000000}]"#,
            )
            .unwrap();
        let vault = Vault::new(&storage, 4);

        let library = vault.unlock("pw12").unwrap();
        assert_eq!(library.categories().len(), 1);
        assert_eq!(library.bookmarks()[0].category_id.as_deref(), Some("diary"));
        assert!(!storage.contains(keys::LEGACY_PRIVACY_CATEGORIES).unwrap());
        assert!(!storage.contains(keys::LEGACY_PRIVACY_BOOKMARKS).unwrap());

        let again = vault.unlock("pw12").unwrap();
        assert_eq!(again.bookmarks().len(), 1);
    }

    #[test]
    fn test_change_password_reencrypts() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        vault.setup("old-pass", "old-pass").unwrap();
        vault.save(&sample_library(), "old-pass").unwrap();

        vault
            .change_password("old-pass", "new-pass", "new-pass")
            .unwrap();

        assert!(vault.unlock("old-pass").unwrap_err().is_invalid_password());
        let library = vault.unlock("new-pass").unwrap();
        assert_eq!(library.bookmarks().len(), 1);
    }

    #[test]
    fn test_change_password_rules() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        vault.setup("old-pass", "old-pass").unwrap();

        assert!(vault.change_password("", "new-pass", "new-pass").is_err());
        assert!(vault.change_password("old-pass", "new", "new").is_err());
        assert!(vault
            .change_password("old-pass", "new-pass", "new-pazz")
            .is_err());
        assert!(vault
            .change_password("old-pass", "old-pass", "old-pass")
            .is_err());
        assert!(vault
            .change_password("bad-pass", "new-pass", "new-pass")
            .unwrap_err()
            .is_invalid_password());

        // Nothing changed
        assert!(vault.verify("old-pass").unwrap());
    }

    #[test]
    fn test_adopt() {
        let storage = storage();
        let vault = Vault::new(&storage, 4);
        vault.adopt(&sample_library(), "imported").unwrap();

        assert!(vault.verify("imported").unwrap());
        assert_eq!(vault.unlock("imported").unwrap().bookmarks().len(), 1);
        assert!(matches!(
            vault.adopt(&Library::default(), "again").unwrap_err(),
            Error::PasswordAlreadySet
        ));
    }

    #[test]
    fn test_seal_round_trip_keeps_timestamp() {
        let sealed = seal(&sample_library(), "pw").unwrap();
        let payload = unseal(&sealed, "pw").unwrap();
        assert_eq!(payload.bookmarks.len(), 1);
        assert!(payload.timestamp.is_some());
    }

    #[test]
    fn test_payload_without_timestamp() {
        let payload: PrivacyPayload =
            serde_json::from_str(r#"{"bookmarks": [], "categories": []}"#).unwrap();
        assert!(payload.timestamp.is_none());
        assert!(payload.into_library().is_empty());
    }
}
