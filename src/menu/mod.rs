// Patch menus as plain data
//
// `builder` produces a `Menu` tree from the catalog; the UI layer renders it
// and hands the chosen `MenuAction` back to the patch selector.

pub mod builder;
pub mod model;

pub use builder::{
    COLUMN_LENGTH, MenuContext, SPLIT_COUNT, build_classic_menu, build_favorites_menu,
    optionally_add_favorites, sub_menu_count,
};
pub use model::{Menu, MenuAction, MenuEntry, to_os_case_for_menu};
