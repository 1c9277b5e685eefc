// Types for the patch catalog (patches, categories, orderings)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Separator used in nested category names ("Leads/Mono")
pub const CATEGORY_SEPARATOR: char = '/';
pub const CATEGORY_SEPARATOR_STR: &str = "/";

/// A saved synthesizer preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    /// Index into `PatchCatalog::categories`
    pub category: usize,
    pub path: PathBuf,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Reference from a category to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    pub internal_id: usize,
}

/// Where a category comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Factory,
    ThirdParty,
    User,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 3] = [
        CategoryKind::Factory,
        CategoryKind::ThirdParty,
        CategoryKind::User,
    ];
}

/// Hierarchical grouping of patches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchCategory {
    /// Full path of the category, nested levels joined with `/`
    pub name: String,
    pub internal_id: usize,
    pub children: Vec<CategoryRef>,
    pub is_root: bool,
    pub is_factory: bool,
    pub number_of_patches_in_category_and_children: usize,
}

impl PatchCategory {
    /// Category name without the path leading to it
    pub fn leaf_name(&self) -> &str {
        leaf_name(&self.name)
    }
}

pub fn leaf_name(name: &str) -> &str {
    match name.rfind(CATEGORY_SEPARATOR) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

fn parent_name(name: &str) -> Option<&str> {
    name.rfind(CATEGORY_SEPARATOR).map(|pos| &name[..pos])
}

/// Read-only snapshot of everything the storage layer knows about patches
///
/// Categories are grouped factory first, then third party, then user. The two
/// boundaries mark where each group starts; when a group is empty its boundary
/// equals the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchCatalog {
    pub patches: Vec<Patch>,
    pub categories: Vec<PatchCategory>,
    /// Patch indices in alphabetical order
    pub patch_ordering: Vec<usize>,
    /// Category indices in alphabetical order within each group
    pub category_ordering: Vec<usize>,
    pub first_third_party_category: usize,
    pub first_user_category: usize,
}

impl PatchCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_kind(&self, category: usize) -> CategoryKind {
        if category >= self.first_user_category {
            CategoryKind::User
        } else if category >= self.first_third_party_category {
            CategoryKind::ThirdParty
        } else {
            CategoryKind::Factory
        }
    }

    /// Favorite patches paired with their index, sorted by name
    pub fn favorites(&self) -> Vec<(usize, &Patch)> {
        let mut favs: Vec<(usize, &Patch)> = self
            .patches
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_favorite)
            .collect();

        favs.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        favs
    }

    /// Resolve a child reference by name and internal id
    pub fn find_category(&self, child: &CategoryRef) -> Option<usize> {
        self.categories
            .iter()
            .position(|c| c.name == child.name && c.internal_id == child.internal_id)
    }

    pub fn find_patch(&self, name: &str, category_name: &str, factory: bool) -> Option<usize> {
        self.patches.iter().position(|p| {
            p.name == name
                && self.categories.get(p.category).is_some_and(|c| {
                    c.name == category_name && c.is_factory == factory
                })
        })
    }

    pub fn find_patch_by_path(&self, path: &std::path::Path) -> Option<usize> {
        self.patches.iter().position(|p| p.path == path)
    }

    /// Patches of one category in alphabetical order
    pub fn patches_in_category(&self, category: usize) -> Vec<usize> {
        self.patch_ordering
            .iter()
            .copied()
            .filter(|&p| self.patches.get(p).is_some_and(|patch| patch.category == category))
            .collect()
    }
}

/// Patch data handed to the builder before indices are assigned
#[derive(Debug, Clone, Default)]
pub struct PatchInfo {
    pub name: String,
    pub path: PathBuf,
    pub author: String,
    pub comment: String,
    pub is_favorite: bool,
}

impl PatchInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// Assembles a `PatchCatalog` from category paths and patches
///
/// Categories keep their discovery order in the catalog; the orderings are
/// computed separately so lookups through them stay meaningful.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    groups: BTreeMap<u8, Vec<String>>,
    patches: Vec<(CategoryKind, String, PatchInfo)>,
}

fn group_key(kind: CategoryKind) -> u8 {
    match kind {
        CategoryKind::Factory => 0,
        CategoryKind::ThirdParty => 1,
        CategoryKind::User => 2,
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category, and every parent of it, even if it holds no patches
    pub fn add_category(&mut self, kind: CategoryKind, name: &str) -> &mut Self {
        let name = name.trim_matches(CATEGORY_SEPARATOR);
        if name.is_empty() {
            return self;
        }

        if let Some(parent) = parent_name(name) {
            self.add_category(kind, parent);
        }

        let group = self.groups.entry(group_key(kind)).or_default();
        if !group.iter().any(|c| c == name) {
            group.push(name.to_string());
        }
        self
    }

    pub fn add_patch(&mut self, kind: CategoryKind, category: &str, patch: PatchInfo) -> &mut Self {
        self.add_category(kind, category);
        let category = category.trim_matches(CATEGORY_SEPARATOR).to_string();
        self.patches.push((kind, category, patch));
        self
    }

    pub fn build(&self) -> PatchCatalog {
        let mut catalog = PatchCatalog::new();
        let mut boundaries = [0usize; 3];

        for kind in CategoryKind::ALL {
            let key = group_key(kind);
            boundaries[key as usize] = catalog.categories.len();

            let Some(names) = self.groups.get(&key) else {
                continue;
            };

            let group_start = catalog.categories.len();
            for name in names {
                let internal_id = catalog.categories.len();
                catalog.categories.push(PatchCategory {
                    name: name.clone(),
                    internal_id,
                    children: Vec::new(),
                    is_root: parent_name(name).is_none(),
                    is_factory: kind == CategoryKind::Factory,
                    number_of_patches_in_category_and_children: 0,
                });
            }

            // Link children within the group
            for idx in group_start..catalog.categories.len() {
                let mut children: Vec<CategoryRef> = catalog.categories[group_start..]
                    .iter()
                    .filter(|c| parent_name(&c.name) == Some(catalog.categories[idx].name.as_str()))
                    .map(|c| CategoryRef {
                        name: c.name.clone(),
                        internal_id: c.internal_id,
                    })
                    .collect();
                children.sort_by_key(|c| c.name.to_lowercase());
                catalog.categories[idx].children = children;
            }

            let mut ordering: Vec<usize> = (group_start..catalog.categories.len()).collect();
            ordering.sort_by_key(|&c| catalog.categories[c].name.to_lowercase());
            catalog.category_ordering.extend(ordering);
        }

        catalog.first_third_party_category = boundaries[1];
        catalog.first_user_category = boundaries[2];

        for (kind, category, info) in &self.patches {
            let range = match kind {
                CategoryKind::Factory => 0..boundaries[1],
                CategoryKind::ThirdParty => boundaries[1]..boundaries[2],
                CategoryKind::User => boundaries[2]..catalog.categories.len(),
            };
            let Some(category_idx) = range
                .clone()
                .find(|&c| catalog.categories[c].name == *category)
            else {
                continue;
            };

            catalog.patches.push(Patch {
                name: info.name.clone(),
                category: category_idx,
                path: info.path.clone(),
                author: info.author.clone(),
                comment: info.comment.clone(),
                is_favorite: info.is_favorite,
            });

            // Count the patch in its category and every ancestor
            let mut name = Some(category.as_str());
            while let Some(current) = name {
                if let Some(c) = range.clone().find(|&c| catalog.categories[c].name == current) {
                    catalog.categories[c].number_of_patches_in_category_and_children += 1;
                }
                name = parent_name(current);
            }
        }

        let mut ordering: Vec<usize> = (0..catalog.patches.len()).collect();
        ordering.sort_by_key(|&p| catalog.patches[p].name.to_lowercase());
        catalog.patch_ordering = ordering;

        catalog
    }
}
