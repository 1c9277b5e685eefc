// Patch menu builder - turns the catalog into a menu description
//
// Pure functions over `PatchCatalog`: nothing here touches the GUI or storage.

use crate::menu::model::{Menu, MenuAction, MenuEntry, to_os_case_for_menu};
use crate::patch::types::{PatchCatalog, leaf_name};

/// Maximum number of patches in one category sub-menu
pub const SPLIT_COUNT: usize = 256;

/// Patches per menu column
pub const COLUMN_LENGTH: usize = 32;

pub const NOT_IMPLEMENTED_MESSAGE: &str = "This function has not been implemented yet!";
pub const NOT_IMPLEMENTED_TITLE: &str = "Coming Soon";

/// Selection state the menu reflects
#[derive(Debug, Clone, Default)]
pub struct MenuContext {
    pub current_patch: Option<usize>,
    pub current_category: Option<usize>,
    /// Current patch is a user patch (enables rename / delete)
    pub is_user: bool,
    /// Resolved manual URL for the help row
    pub help_url: Option<String>,
}

/// Number of sub-menus a category with `patch_count` patches is split into
pub fn sub_menu_count(patch_count: usize) -> usize {
    1 + (patch_count.max(2) - 1) / SPLIT_COUNT
}

/// Build the classic patch menu
///
/// With `single_category` only the current category is listed inline. Returns
/// `None` when single-category mode has no category to show.
pub fn build_classic_menu(
    catalog: &PatchCatalog,
    ctx: &MenuContext,
    single_category: bool,
) -> Option<Menu> {
    let mut menu = Menu::new();

    if single_category {
        let category = single_menu_category(catalog, ctx)?;
        let name = catalog.categories.get(category)?.leaf_name().to_uppercase();

        menu.add_section_header(format!("PATCHES ({})", name));
        populate_patch_menu_for_category(catalog, ctx, category, &mut menu, true, false);
    } else {
        populate_all_categories(catalog, ctx, &mut menu);
    }

    add_functions(&mut menu, ctx);
    Some(menu)
}

/// Menu shown when right-clicking the favorites button
pub fn build_favorites_menu(catalog: &PatchCatalog) -> Option<Menu> {
    let mut menu = Menu::new();
    menu.add_section_header("FAVORITES");
    optionally_add_favorites(catalog, &mut menu, false, false).then_some(menu)
}

fn single_menu_category(catalog: &PatchCatalog, ctx: &MenuContext) -> Option<usize> {
    if let Some(category) = ctx.current_category {
        return Some(category);
    }

    // No category yet (fresh instance): prefer "Init", else the first one
    if catalog.category_ordering.is_empty() {
        return None;
    }

    catalog
        .category_ordering
        .iter()
        .copied()
        .rev()
        .find(|&c| {
            catalog
                .categories
                .get(c)
                .is_some_and(|cat| cat.name.eq_ignore_ascii_case("Init"))
        })
        .or_else(|| catalog.category_ordering.first().copied())
}

fn populate_all_categories(catalog: &PatchCatalog, ctx: &MenuContext, menu: &mut Menu) {
    let category_count = catalog.categories.len();
    let mut added_favorites = false;

    if category_count > 0 && catalog.first_third_party_category > 0 {
        menu.add_section_header("FACTORY PATCHES");
    }

    for i in 0..category_count {
        if i == catalog.first_third_party_category || i == catalog.first_user_category {
            let third_party = i == catalog.first_third_party_category
                && catalog.first_user_category != i;

            menu.add_column_break();
            if third_party {
                menu.add_section_header("THIRD PARTY PATCHES");
            } else {
                menu.add_section_header("USER PATCHES");
                if optionally_add_favorites(catalog, menu, false, true) {
                    menu.add_separator();
                }
            }
            added_favorites = true;
        }

        let Some(&category) = catalog.category_ordering.get(i) else {
            continue;
        };
        populate_patch_menu_for_category(catalog, ctx, category, menu, false, true);
    }

    if !added_favorites {
        optionally_add_favorites(catalog, menu, true, true);
    }
}

/// Add favorite patches (sorted by name) to `menu`
///
/// Returns false, leaving the menu untouched, when there are no favorites.
pub fn optionally_add_favorites(
    catalog: &PatchCatalog,
    menu: &mut Menu,
    add_column_break: bool,
    add_to_sub_menu: bool,
) -> bool {
    let favorites = catalog.favorites();
    if favorites.is_empty() {
        return false;
    }

    if add_column_break {
        menu.add_column_break();
        menu.add_section_header("FAVORITES");
    }

    if add_to_sub_menu {
        let mut sub_menu = Menu::new();
        sub_menu.add_section_header("FAVORITES");
        for (idx, patch) in &favorites {
            sub_menu.add_item(patch.name.clone(), MenuAction::LoadPatch(*idx));
        }
        menu.add_sub_menu("Favorites", sub_menu, false);
    } else {
        for (idx, patch) in &favorites {
            menu.add_item(patch.name.clone(), MenuAction::LoadPatch(*idx));
        }
    }

    true
}

/// Add one category (and its children) to `menu`
///
/// Inline mode adds the patches straight into `menu`; otherwise each split
/// part becomes a sub-menu named after the category. Returns true if the
/// current patch was found in this category or below.
fn populate_patch_menu_for_category(
    catalog: &PatchCatalog,
    ctx: &MenuContext,
    category: usize,
    menu: &mut Menu,
    inline: bool,
    root_call: bool,
) -> bool {
    let Some(cat) = catalog.categories.get(category) else {
        return false;
    };

    // Top level only lists root categories, children come through recursion
    if root_call && !cat.is_root {
        return false;
    }

    if cat.number_of_patches_in_category_and_children == 0 {
        return false;
    }

    let patches = catalog.patches_in_category(category);
    let parts = sub_menu_count(patches.len());
    let menu_name = leaf_name(&cat.name);
    let mut any_checked = false;

    for part in 0..parts {
        let mut part_menu = Menu::new();
        let target = if inline { &mut *menu } else { &mut part_menu };
        let mut part_checked = false;

        let start = part * SPLIT_COUNT;
        let end = ((part + 1) * SPLIT_COUNT).min(patches.len());
        let mut count = 0;

        for &p in patches.get(start..end).unwrap_or_default() {
            let checked = ctx.current_patch == Some(p);
            part_checked |= checked;

            target.add_checked_item(catalog.patches[p].name.clone(), checked, MenuAction::LoadPatch(p));
            count += 1;

            if count % COLUMN_LENGTH == 0 {
                target.add_column_break();
                if inline {
                    target.add_section_header("");
                }
            }
        }

        // Child categories hang off the last part only
        if part + 1 == parts {
            for child in &cat.children {
                let Some(child_idx) = catalog.find_category(child) else {
                    continue;
                };
                if populate_patch_menu_for_category(catalog, ctx, child_idx, target, false, false) {
                    part_checked = true;
                }
            }
        }

        any_checked |= part_checked;

        if !inline {
            let label = if parts > 1 {
                format!("{} {}", menu_name, part + 1)
            } else {
                menu_name.to_string()
            };
            menu.add_sub_menu(label, part_menu, part_checked);
        }
    }

    any_checked
}

fn add_functions(menu: &mut Menu, ctx: &MenuContext) {
    menu.add_column_break();
    menu.add_section_header("FUNCTIONS");

    menu.add_item(to_os_case_for_menu("Initialize Patch"), MenuAction::InitializePatch);
    menu.add_item(
        to_os_case_for_menu("Set Current Patch as Default"),
        MenuAction::SetCurrentPatchAsDefault,
    );
    menu.add_separator();

    menu.add_item(to_os_case_for_menu("Save Patch"), MenuAction::SavePatch);
    menu.add_item(
        to_os_case_for_menu("Load Patch from File..."),
        MenuAction::LoadPatchFromFile,
    );
    menu.add_separator();

    if ctx.is_user {
        menu.add_item(to_os_case_for_menu("Rename Patch"), MenuAction::RenamePatch);
        menu.add_item(to_os_case_for_menu("Delete Patch"), MenuAction::DeletePatch);
    }
    menu.add_separator();

    menu.add_item(
        to_os_case_for_menu("Open Patch Database"),
        MenuAction::OpenPatchDatabase,
    );
    menu.add_item(
        to_os_case_for_menu("Refresh Patch Browser"),
        MenuAction::RefreshPatchBrowser,
    );
    menu.add_separator();

    menu.add_item(
        to_os_case_for_menu("Open User Patches Folder..."),
        MenuAction::OpenUserPatchesFolder,
    );
    menu.add_item(
        to_os_case_for_menu("Open Factory Patches Folder..."),
        MenuAction::OpenFactoryPatchesFolder,
    );
    menu.add_item(
        to_os_case_for_menu("Open Third Party Patches Folder..."),
        MenuAction::OpenThirdPartyPatchesFolder,
    );
    menu.add_separator();

    menu.push(MenuEntry::HelpTitle {
        title: "Patch Browser".to_string(),
        url: ctx.help_url.clone(),
    });
}
