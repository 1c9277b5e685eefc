// Integration tests for the file-system patch library
// Scans a temporary library, persists favorites and searches the patch database

use mymusic_patch_editor::ui::AppHost;
use mymusic_patch_editor::{
    CategoryKind, LibraryPaths, MenuAction, PatchDatabase, PatchLibrary, PatchSelector,
    PatchStorage, UserDefaultKey, UserDefaults,
};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write_patch(path: &Path, author: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let body = format!(
        "CcnK<?xml version=\"1.0\"?><patch><meta author=\"{}\" comment=\"test patch\" /></patch>",
        author
    );
    fs::write(path, body).unwrap();
}

fn sample_library(dir: &TempDir) -> LibraryPaths {
    let paths = LibraryPaths::new(dir.path().join("data"), dir.path().join("user"));

    write_patch(&paths.factory().join("Templates/Init Saw.fxp"), "Factory");
    write_patch(&paths.factory().join("Leads/Mono/Acid.fxp"), "Alice");
    write_patch(&paths.factory().join("Loose.fxp"), "Bob");
    write_patch(&paths.third_party().join("Acme/Brass.fxp"), "Acme");
    write_patch(&paths.user.join("Mine/My Pad.fxp"), "Me");
    fs::write(paths.user.join("Mine/notes.txt"), "not a patch").unwrap();

    paths
}

fn wait_idle(library: &PatchLibrary) {
    let start = Instant::now();
    while library.patch_db().number_of_jobs_outstanding() > 0 {
        assert!(start.elapsed() < Duration::from_secs(5), "indexing timed out");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_scan_builds_categories_per_library_kind() {
    let dir = TempDir::new().unwrap();
    let paths = sample_library(&dir);
    let library = PatchLibrary::open(paths, UserDefaults::in_memory()).unwrap();
    let catalog = library.catalog();

    assert_eq!(catalog.patches.len(), 5);

    let acid = catalog.patches.iter().find(|p| p.name == "Acid").unwrap();
    assert_eq!(catalog.categories[acid.category].name, "Leads/Mono");
    assert_eq!(acid.author, "Alice");

    let loose = catalog.patches.iter().find(|p| p.name == "Loose").unwrap();
    assert_eq!(catalog.categories[loose.category].name, "Factory");

    let brass = catalog.patches.iter().find(|p| p.name == "Brass").unwrap();
    assert_eq!(catalog.category_kind(brass.category), CategoryKind::ThirdParty);

    let pad = catalog.patches.iter().find(|p| p.name == "My Pad").unwrap();
    assert_eq!(catalog.category_kind(pad.category), CategoryKind::User);
}

#[test]
fn test_initial_patch_resolves() {
    let dir = TempDir::new().unwrap();
    let library = PatchLibrary::open(sample_library(&dir), UserDefaults::in_memory()).unwrap();

    let init = library.initial_patch();
    assert!(library
        .catalog()
        .find_patch(&init.name, &init.category, init.is_factory())
        .is_some());
}

#[test]
fn test_favorites_persist_across_scans() {
    let dir = TempDir::new().unwrap();
    let defaults_file = dir.path().join("user_defaults.json");
    let paths = sample_library(&dir);

    {
        let mut library =
            PatchLibrary::open(paths.clone(), UserDefaults::load(&defaults_file)).unwrap();
        let acid = library
            .catalog()
            .find_patch_by_path(&paths.factory().join("Leads/Mono/Acid.fxp"))
            .unwrap();
        library.set_patch_favorite(acid, true);
        library.update_user_default(UserDefaultKey::LastPatchPath, "/somewhere");
    }

    let library = PatchLibrary::open(paths, UserDefaults::load(&defaults_file)).unwrap();
    let favorites = library.catalog().favorites();

    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].1.name, "Acid");
    assert_eq!(
        library.user_default(UserDefaultKey::LastPatchPath).as_deref(),
        Some("/somewhere")
    );
}

#[test]
fn test_refresh_picks_up_new_files() {
    let dir = TempDir::new().unwrap();
    let paths = sample_library(&dir);
    let mut library = PatchLibrary::open(paths.clone(), UserDefaults::in_memory()).unwrap();

    write_patch(&paths.user.join("Mine/Second.fxp"), "Me");
    library.refresh_patch_list();

    assert_eq!(library.catalog().patches.len(), 6);
    assert!(library.take_errors().is_empty());
}

#[test]
fn test_patch_database_search() {
    let dir = TempDir::new().unwrap();
    let mut library = PatchLibrary::open(sample_library(&dir), UserDefaults::in_memory()).unwrap();

    library.initialize_patch_db();
    wait_idle(&library);

    let results = library.patch_db().query_from_query_string("alice acid");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Acid");

    assert!(library.patch_db().query_from_query_string("nothing-matches").is_empty());
}

#[test]
fn test_reported_errors_are_drained() {
    let dir = TempDir::new().unwrap();
    let mut library = PatchLibrary::open(sample_library(&dir), UserDefaults::in_memory()).unwrap();

    library.report_error("This function has not been implemented yet!", "Coming Soon");

    let errors = library.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Coming Soon");
    assert!(library.take_errors().is_empty());
}

#[test]
fn test_refresh_keeps_selector_on_same_patch() {
    let dir = TempDir::new().unwrap();
    let paths = LibraryPaths::new(dir.path().join("data"), dir.path().join("user"));
    write_patch(&paths.user.join("B/Bravo.fxp"), "Me");

    let mut library = PatchLibrary::open(paths.clone(), UserDefaults::in_memory()).unwrap();
    let mut selector = PatchSelector::new();
    let bravo = library
        .catalog()
        .find_patch_by_path(&paths.user.join("B/Bravo.fxp"))
        .unwrap();
    selector.set_current_patch(bravo, &library);

    // Alpha sorts first, shifting Bravo's index
    write_patch(&paths.user.join("A/Alpha.fxp"), "Me");
    selector.perform(MenuAction::RefreshPatchBrowser, &mut library, &mut AppHost::new());

    let id = selector.current_patch_id().unwrap();
    assert_eq!(library.catalog().patches[id].name, "Bravo");
    assert_eq!(library.catalog().patches[0].name, "Alpha");
    assert_eq!(selector.patch_name(), "Bravo");
}

#[test]
fn test_refresh_after_current_patch_deleted() {
    let dir = TempDir::new().unwrap();
    let paths = LibraryPaths::new(dir.path().join("data"), dir.path().join("user"));
    write_patch(&paths.user.join("A/Alpha.fxp"), "Me");
    write_patch(&paths.user.join("B/Bravo.fxp"), "Me");

    let mut library = PatchLibrary::open(paths.clone(), UserDefaults::in_memory()).unwrap();
    let mut selector = PatchSelector::new();
    let bravo = library
        .catalog()
        .find_patch_by_path(&paths.user.join("B/Bravo.fxp"))
        .unwrap();
    selector.set_current_patch(bravo, &library);

    fs::remove_file(paths.user.join("B/Bravo.fxp")).unwrap();
    selector.rescan_library(&mut library);

    assert_eq!(selector.current_patch_id(), None);
    assert_eq!(selector.patch_name(), "Bravo");
    assert!(!selector.is_favorite());
}

#[cfg(unix)]
#[test]
fn test_scan_skips_symlink_loop() {
    let dir = TempDir::new().unwrap();
    let paths = sample_library(&dir);
    std::os::unix::fs::symlink(&paths.user, paths.user.join("Mine/Loop")).unwrap();

    let mut library = PatchLibrary::open(paths, UserDefaults::in_memory()).unwrap();

    assert_eq!(library.catalog().patches.len(), 5);
    assert!(library.catalog().patches.iter().any(|p| p.name == "My Pad"));
    assert!(library.take_errors().is_empty());
}

#[test]
fn test_last_patch_path_default() {
    let dir = TempDir::new().unwrap();
    let paths = sample_library(&dir);
    let mut library = PatchLibrary::open(paths.clone(), UserDefaults::in_memory()).unwrap();

    let start = library.user_default_path(UserDefaultKey::LastPatchPath, &paths.user);
    assert_eq!(start, paths.user);

    let chosen = dir.path().join("downloads");
    library.update_user_default_path(UserDefaultKey::LastPatchPath, &chosen);
    assert_eq!(
        library.user_default_path(UserDefaultKey::LastPatchPath, &paths.user),
        chosen
    );
}
