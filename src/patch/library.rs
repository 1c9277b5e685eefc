// Patch library - scans the factory, third party and user patch folders

use crate::messaging::{Notification, NotificationCategory};
use crate::patch::database::{PatchDatabase, PatchDb, PatchRecord};
use crate::patch::defaults::{InitialPatch, UserDefaultKey, UserDefaults};
use crate::patch::types::{CATEGORY_SEPARATOR_STR, CatalogBuilder, CategoryKind, PatchCatalog, PatchInfo};
use crate::patch::{APP_DIR_NAME, PatchStorage, StorageResult};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Patch file extension
pub const PATCH_EXTENSION: &str = "fxp";

/// Maximum number of unread error notifications kept
const MAX_PENDING_ERRORS: usize = 32;

/// Folder layout of a patch library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    pub data: PathBuf,
    pub user: PathBuf,
}

impl LibraryPaths {
    pub fn new(data: impl Into<PathBuf>, user: impl Into<PathBuf>) -> Self {
        Self {
            data: data.into(),
            user: user.into(),
        }
    }

    /// Data under the platform data dir, user patches under Documents
    pub fn default_location() -> Option<Self> {
        let data = dirs::data_dir()?.join(APP_DIR_NAME);
        let user = dirs::document_dir()
            .unwrap_or_else(|| data.clone())
            .join(APP_DIR_NAME)
            .join("Patches");
        Some(Self::new(data, user))
    }

    pub fn factory(&self) -> PathBuf {
        self.data.join("patches_factory")
    }

    pub fn third_party(&self) -> PathBuf {
        self.data.join("patches_3rdparty")
    }

    fn roots(&self) -> [(CategoryKind, PathBuf); 3] {
        [
            (CategoryKind::Factory, self.factory()),
            (CategoryKind::ThirdParty, self.third_party()),
            (CategoryKind::User, self.user.clone()),
        ]
    }
}

/// Category a patch file at the top of a root folder lands in
fn root_category_name(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Factory => "Factory",
        CategoryKind::ThirdParty => "Third Party",
        CategoryKind::User => "User",
    }
}

/// Metadata stored in the XML part of a patch file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchMeta {
    pub author: String,
    pub comment: String,
}

/// Pull `author` and `comment` out of the first `<meta .../>` element
pub fn read_patch_meta(bytes: &[u8]) -> PatchMeta {
    let text = String::from_utf8_lossy(bytes);
    let Some(start) = text.find("<meta ") else {
        return PatchMeta::default();
    };
    let element = match text[start..].find('>') {
        Some(end) => &text[start..start + end],
        None => &text[start..],
    };

    PatchMeta {
        author: xml_attribute(element, "author").unwrap_or_default(),
        comment: xml_attribute(element, "comment").unwrap_or_default(),
    }
}

fn xml_attribute(element: &str, name: &str) -> Option<String> {
    let needle = format!(" {}=\"", name);
    let start = element.find(&needle)? + needle.len();
    let end = element[start..].find('"')? + start;
    Some(
        element[start..end]
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#10;", "\n")
            .replace("&amp;", "&"),
    )
}

/// Scan the three patch roots into a catalog
///
/// Every directory becomes a category, nested ones named with `/`. Missing
/// roots are skipped.
pub fn scan_library(paths: &LibraryPaths, defaults: &UserDefaults) -> StorageResult<PatchCatalog> {
    let mut builder = CatalogBuilder::new();

    for (kind, root) in paths.roots() {
        if !root.is_dir() {
            log::debug!("Patch root {} not found, skipping", root.display());
            continue;
        }

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            // An unreadable root fails the scan, a bad entry below it is skipped
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let relative = path.strip_prefix(&root).unwrap_or(path);

            if entry.file_type().is_dir() {
                builder.add_category(kind, &category_name(relative));
                continue;
            }

            if path.extension().and_then(|e| e.to_str()) != Some(PATCH_EXTENSION) {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let category = match relative.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => category_name(parent),
                _ => root_category_name(kind).to_string(),
            };

            let meta = std::fs::read(path)
                .map(|bytes| read_patch_meta(&bytes))
                .unwrap_or_default();

            let info = PatchInfo {
                name: name.to_string(),
                path: path.to_path_buf(),
                author: meta.author,
                comment: meta.comment,
                is_favorite: defaults.is_favorite(path),
            };
            builder.add_patch(kind, &category, info);
        }
    }

    Ok(builder.build())
}

fn category_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(CATEGORY_SEPARATOR_STR)
}

/// File-system backed `PatchStorage`
pub struct PatchLibrary {
    paths: LibraryPaths,
    catalog: PatchCatalog,
    defaults: UserDefaults,
    db: PatchDb,
    db_indexed: bool,
    errors: VecDeque<Notification>,
}

impl PatchLibrary {
    /// Scan `paths` and build the library
    pub fn open(paths: LibraryPaths, defaults: UserDefaults) -> StorageResult<Self> {
        let catalog = scan_library(&paths, &defaults)?;
        log::info!(
            "Patch library: {} patches in {} categories",
            catalog.patches.len(),
            catalog.categories.len()
        );
        Ok(Self::from_catalog(catalog, paths, defaults))
    }

    /// Library over an already built catalog, without scanning
    pub fn from_catalog(catalog: PatchCatalog, paths: LibraryPaths, defaults: UserDefaults) -> Self {
        Self {
            paths,
            catalog,
            defaults,
            db: PatchDb::new(),
            db_indexed: false,
            errors: VecDeque::new(),
        }
    }

    /// Drain errors reported since the last call
    pub fn take_errors(&mut self) -> Vec<Notification> {
        self.errors.drain(..).collect()
    }

    fn records(&self) -> Vec<PatchRecord> {
        self.catalog
            .patches
            .iter()
            .map(|p| PatchRecord {
                file: p.path.clone(),
                name: p.name.clone(),
                cat: self
                    .catalog
                    .categories
                    .get(p.category)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                author: p.author.clone(),
            })
            .collect()
    }
}

impl PatchStorage for PatchLibrary {
    fn catalog(&self) -> &PatchCatalog {
        &self.catalog
    }

    fn set_patch_favorite(&mut self, patch: usize, favorite: bool) {
        let Some(entry) = self.catalog.patches.get_mut(patch) else {
            return;
        };
        entry.is_favorite = favorite;

        if let Err(e) = self.defaults.set_favorite(&entry.path, favorite) {
            log::warn!("Failed to persist favorite flag: {}", e);
        }
    }

    fn user_default(&self, key: UserDefaultKey) -> Option<String> {
        self.defaults.get(key).map(str::to_string)
    }

    fn update_user_default(&mut self, key: UserDefaultKey, value: &str) {
        if let Err(e) = self.defaults.set(key, value) {
            log::warn!("Failed to persist user default {}: {}", key.name(), e);
        }
    }

    fn user_default_path(&self, key: UserDefaultKey, fallback: &Path) -> PathBuf {
        self.defaults.get_path(key, fallback)
    }

    fn update_user_default_path(&mut self, key: UserDefaultKey, path: &Path) {
        if let Err(e) = self.defaults.set_path(key, path) {
            log::warn!("Failed to persist user default {}: {}", key.name(), e);
        }
    }

    fn report_error(&mut self, message: &str, title: &str) {
        log::warn!("{}: {}", title, message);
        self.errors.push_back(Notification::error(
            NotificationCategory::Storage,
            title.to_string(),
            message.to_string(),
        ));
        if self.errors.len() > MAX_PENDING_ERRORS {
            self.errors.pop_front();
        }
    }

    fn refresh_patch_list(&mut self) {
        match scan_library(&self.paths, &self.defaults) {
            Ok(catalog) => {
                log::info!("Rescanned patch library: {} patches", catalog.patches.len());
                self.catalog = catalog;
                if self.db_indexed {
                    self.db.clear();
                    self.db.enqueue(self.records());
                }
            }
            Err(e) => self.report_error(&e.to_string(), "Patch Library Error"),
        }
    }

    fn initialize_patch_db(&mut self) {
        self.db.initialize();
        if !self.db_indexed {
            self.db_indexed = true;
            self.db.enqueue(self.records());
        }
    }

    fn patch_db(&self) -> &dyn PatchDatabase {
        &self.db
    }

    fn user_patches_path(&self) -> &Path {
        &self.paths.user
    }

    fn data_path(&self) -> &Path {
        &self.paths.data
    }

    fn initial_patch(&self) -> InitialPatch {
        self.defaults.initial_patch()
    }
}
