//! End-to-end checks against a file-backed database.

use bookmarkhub::{
    BookmarkDraft, BookmarkHub, CategoryDraft, CategoryFilter, Config, Error, PrivacyExport,
    PrivacyImport, SearchQuery,
};

fn config_in(dir: &tempfile::TempDir, name: &str) -> Config {
    let mut config = Config::default();
    config.storage.database_path = Some(dir.path().join(name));
    config
}

fn draft(url: &str, title: &str, category: Option<&str>) -> BookmarkDraft {
    BookmarkDraft {
        url: url.to_string(),
        title: title.to_string(),
        category_id: category.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut hub = BookmarkHub::open(config_in(&dir, "hub.db")).unwrap();
        let recipes = hub
            .library_mut()
            .add_category(CategoryDraft {
                name: "Recipes".to_string(),
                color: Some("#E91E63".to_string()),
                order: None,
            })
            .unwrap()
            .id
            .clone();
        hub.library_mut()
            .add_bookmark(draft("bread.example.com", "Bread", Some(&recipes)))
            .unwrap();
        hub.library_mut()
            .add_bookmark(draft("doc.rust-lang.org", "Rust docs", Some("study")))
            .unwrap();
        hub.save().unwrap();
    }

    let hub = BookmarkHub::open(config_in(&dir, "hub.db")).unwrap();
    let library = hub.library();
    assert_eq!(library.bookmarks().len(), 2);
    assert_eq!(library.categories().len(), 6);

    let recipes = library.resolve_category("recipes").unwrap();
    let hits = library.filtered(
        &CategoryFilter::Category(recipes.id.clone()),
        &SearchQuery::parse("bread|cake"),
    );
    assert_eq!(hits.len(), 1);
}

#[test]
fn backup_moves_both_partitions_between_databases() {
    let dir = tempfile::tempdir().unwrap();
    let backup_path = dir.path().join("backup.json");

    let mut source = BookmarkHub::open(config_in(&dir, "source.db")).unwrap();
    source
        .library_mut()
        .add_bookmark(draft("news.example.com", "News", Some("news")))
        .unwrap();
    source.save().unwrap();

    source.setup_privacy("letmein", "letmein").unwrap();
    source.unlock("letmein").unwrap();
    source
        .library_mut()
        .add_bookmark(draft("diary.example.com", "Diary", None))
        .unwrap();
    source.save().unwrap();
    source.lock();

    let (backup, outcome) = source.export(Some("letmein")).unwrap();
    assert!(matches!(outcome, PrivacyExport::Included { bookmarks: 1, .. }));
    backup.write_file(&backup_path).unwrap();

    let raw = std::fs::read_to_string(&backup_path).unwrap();
    assert!(raw.contains("news.example.com"));
    assert!(!raw.contains("diary.example.com"));

    let mut target = BookmarkHub::open(config_in(&dir, "target.db")).unwrap();
    let report = target.import_file(&backup_path, Some("letmein")).unwrap();
    assert_eq!(report.bookmarks, 1);
    assert!(matches!(report.privacy, PrivacyImport::Adopted { .. }));

    assert!(target
        .unlock("wrong-password")
        .unwrap_err()
        .is_invalid_password());
    target.unlock("letmein").unwrap();
    assert_eq!(target.library().bookmarks()[0].title, "Diary");
}

#[test]
fn changed_password_applies_after_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut hub = BookmarkHub::open(config_in(&dir, "hub.db")).unwrap();
        hub.setup_privacy("first", "first").unwrap();
        hub.unlock("first").unwrap();
        hub.library_mut()
            .add_bookmark(draft("hidden.example.com", "Hidden", None))
            .unwrap();
        hub.save().unwrap();
        hub.change_password("first", "second", "second").unwrap();
    }

    let mut hub = BookmarkHub::open(config_in(&dir, "hub.db")).unwrap();
    assert!(matches!(
        hub.unlock("first").unwrap_err(),
        Error::InvalidPassword
    ));
    hub.unlock("second").unwrap();
    assert_eq!(hub.library().bookmarks().len(), 1);
}
