// Patch storage layer
//
// The widgets never touch the file system themselves. They talk to a
// `PatchStorage` (catalog, favorites, user defaults, error reporting) and to
// the `PatchDatabase` it owns (type-ahead search).

pub mod database;
pub mod defaults;
pub mod library;
pub mod types;

use std::path::{Path, PathBuf};

pub use database::{PatchDatabase, PatchDb, PatchRecord};
pub use defaults::{InitialPatch, UserDefaultKey, UserDefaults};
pub use library::{LibraryPaths, PatchLibrary};
pub use types::{
    CatalogBuilder, CategoryKind, CategoryRef, Patch, PatchCatalog, PatchCategory, PatchInfo,
};

/// Directory name used under the platform config/data/document dirs
pub const APP_DIR_NAME: &str = "MyMusic Patch Editor";

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage collaborator of the patch browser
///
/// Mutating calls never fail towards the caller: problems are logged or
/// reported to the user through `report_error`.
pub trait PatchStorage {
    fn catalog(&self) -> &PatchCatalog;

    fn set_patch_favorite(&mut self, patch: usize, favorite: bool);

    fn user_default(&self, key: UserDefaultKey) -> Option<String>;

    fn update_user_default(&mut self, key: UserDefaultKey, value: &str);

    /// Path-valued user default, `fallback` when unset or empty
    fn user_default_path(&self, key: UserDefaultKey, fallback: &Path) -> PathBuf {
        match self.user_default(key) {
            Some(value) if !value.is_empty() => PathBuf::from(value),
            _ => fallback.to_path_buf(),
        }
    }

    fn update_user_default_path(&mut self, key: UserDefaultKey, path: &Path) {
        self.update_user_default(key, &path.to_string_lossy());
    }

    /// Show a user-facing error dialog
    fn report_error(&mut self, message: &str, title: &str);

    /// Rescan the patch folders
    fn refresh_patch_list(&mut self);

    /// Start the database and queue indexing of the current catalog if needed
    fn initialize_patch_db(&mut self);

    fn patch_db(&self) -> &dyn PatchDatabase;

    fn user_patches_path(&self) -> &Path;

    fn data_path(&self) -> &Path;

    fn factory_patches_path(&self) -> PathBuf {
        self.data_path().join("patches_factory")
    }

    fn third_party_patches_path(&self) -> PathBuf {
        self.data_path().join("patches_3rdparty")
    }

    fn initial_patch(&self) -> InitialPatch {
        let default = InitialPatch::default();
        InitialPatch {
            name: self
                .user_default(UserDefaultKey::InitialPatchName)
                .unwrap_or(default.name),
            category: self
                .user_default(UserDefaultKey::InitialPatchCategory)
                .unwrap_or(default.category),
            category_type: self
                .user_default(UserDefaultKey::InitialPatchCategoryType)
                .unwrap_or(default.category_type),
        }
    }
}
