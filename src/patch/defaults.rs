// User defaults - key/value settings persisted between sessions

use crate::patch::{APP_DIR_NAME, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const USER_DEFAULTS_FILE: &str = "user_defaults.json";

/// Settings keys used by the patch browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserDefaultKey {
    InitialPatchName,
    InitialPatchCategory,
    InitialPatchCategoryType,
    LastPatchPath,
}

impl UserDefaultKey {
    pub fn name(&self) -> &'static str {
        match self {
            UserDefaultKey::InitialPatchName => "initialPatchName",
            UserDefaultKey::InitialPatchCategory => "initialPatchCategory",
            UserDefaultKey::InitialPatchCategoryType => "initialPatchCategoryType",
            UserDefaultKey::LastPatchPath => "lastPatchPath",
        }
    }
}

/// The patch loaded by "Initialize Patch"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPatch {
    pub name: String,
    pub category: String,
    /// "Factory" or "User"
    pub category_type: String,
}

impl InitialPatch {
    pub fn is_factory(&self) -> bool {
        self.category_type == "Factory"
    }
}

impl Default for InitialPatch {
    fn default() -> Self {
        Self {
            name: "Init Saw".to_string(),
            category: "Templates".to_string(),
            category_type: "Factory".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserDefaultsFile {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    favorites: BTreeSet<PathBuf>,
}

/// Key/value settings store backed by a JSON file
///
/// A store without a path keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct UserDefaults {
    path: Option<PathBuf>,
    data: UserDefaultsFile,
}

impl UserDefaults {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// `<config dir>/<app>/user_defaults.json`
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(USER_DEFAULTS_FILE))
    }

    /// Load settings from `path`; a missing or unreadable file gives empty settings
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match Self::read_file(&path) {
            Ok(data) => data,
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring unreadable user defaults {}: {}", path.display(), e);
                }
                UserDefaultsFile::default()
            }
        };

        Self {
            path: Some(path),
            data,
        }
    }

    fn read_file(path: &Path) -> StorageResult<UserDefaultsFile> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self) -> StorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, content).map_err(StorageError::Io)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: UserDefaultKey) -> Option<&str> {
        self.data.values.get(key.name()).map(String::as_str)
    }

    pub fn get_or(&self, key: UserDefaultKey, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn set(&mut self, key: UserDefaultKey, value: &str) -> StorageResult<()> {
        log::debug!("User default {} = {}", key.name(), value);
        self.data
            .values
            .insert(key.name().to_string(), value.to_string());
        self.save()
    }

    /// Path-valued setting, falling back when unset or empty
    pub fn get_path(&self, key: UserDefaultKey, fallback: &Path) -> PathBuf {
        match self.get(key) {
            Some(value) if !value.is_empty() => PathBuf::from(value),
            _ => fallback.to_path_buf(),
        }
    }

    pub fn set_path(&mut self, key: UserDefaultKey, path: &Path) -> StorageResult<()> {
        self.set(key, &path.to_string_lossy())
    }

    pub fn initial_patch(&self) -> InitialPatch {
        let default = InitialPatch::default();
        InitialPatch {
            name: self.get_or(UserDefaultKey::InitialPatchName, &default.name),
            category: self.get_or(UserDefaultKey::InitialPatchCategory, &default.category),
            category_type: self.get_or(
                UserDefaultKey::InitialPatchCategoryType,
                &default.category_type,
            ),
        }
    }

    pub fn is_favorite(&self, patch: &Path) -> bool {
        self.data.favorites.contains(patch)
    }

    pub fn set_favorite(&mut self, patch: &Path, favorite: bool) -> StorageResult<()> {
        if favorite {
            self.data.favorites.insert(patch.to_path_buf());
        } else {
            self.data.favorites.remove(patch);
        }
        self.save()
    }
}
