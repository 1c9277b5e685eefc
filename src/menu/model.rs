// Menu description tree, independent of the GUI toolkit

/// What happens when a menu item is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    LoadPatch(usize),
    InitializePatch,
    SetCurrentPatchAsDefault,
    SavePatch,
    LoadPatchFromFile,
    RenamePatch,
    DeletePatch,
    OpenPatchDatabase,
    RefreshPatchBrowser,
    OpenUserPatchesFolder,
    OpenFactoryPatchesFolder,
    OpenThirdPartyPatchesFolder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item {
        label: String,
        enabled: bool,
        checked: bool,
        action: MenuAction,
    },
    SubMenu {
        label: String,
        menu: Menu,
        checked: bool,
    },
    SectionHeader(String),
    Separator,
    ColumnBreak,
    /// Title row with an optional link to the online manual
    HelpTitle {
        title: String,
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, entry: MenuEntry) {
        self.entries.push(entry);
    }

    pub fn add_item(&mut self, label: impl Into<String>, action: MenuAction) {
        self.add_checked_item(label, false, action);
    }

    pub fn add_checked_item(&mut self, label: impl Into<String>, checked: bool, action: MenuAction) {
        self.entries.push(MenuEntry::Item {
            label: label.into(),
            enabled: true,
            checked,
            action,
        });
    }

    pub fn add_sub_menu(&mut self, label: impl Into<String>, menu: Menu, checked: bool) {
        self.entries.push(MenuEntry::SubMenu {
            label: label.into(),
            menu,
            checked,
        });
    }

    pub fn add_section_header(&mut self, title: impl Into<String>) {
        self.entries.push(MenuEntry::SectionHeader(title.into()));
    }

    pub fn add_separator(&mut self) {
        self.entries.push(MenuEntry::Separator);
    }

    pub fn add_column_break(&mut self) {
        self.entries.push(MenuEntry::ColumnBreak);
    }

    /// Direct sub-menu with the given label
    pub fn sub_menu(&self, label: &str) -> Option<&Menu> {
        self.entries.iter().find_map(|e| match e {
            MenuEntry::SubMenu { label: l, menu, .. } if l == label => Some(menu),
            _ => None,
        })
    }

    pub fn sub_menu_labels(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                MenuEntry::SubMenu { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn section_headers(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                MenuEntry::SectionHeader(title) => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Actions of the items directly in this menu, in order
    pub fn actions(&self) -> Vec<MenuAction> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                MenuEntry::Item { action, .. } => Some(*action),
                _ => None,
            })
            .collect()
    }

    pub fn item_labels(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                MenuEntry::Item { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Split the entries into columns at each column break
    pub fn columns(&self) -> Vec<&[MenuEntry]> {
        self.entries
            .split(|e| matches!(e, MenuEntry::ColumnBreak))
            .collect()
    }
}

/// Platform casing for menu labels
///
/// macOS keeps title case. Elsewhere labels become sentence case: every letter
/// after the first is lowered, except upper-case letters followed by another
/// upper-case letter or a non-letter, so acronyms survive.
pub fn to_os_case_for_menu(label: &str) -> String {
    if cfg!(target_os = "macos") {
        return label.to_string();
    }
    to_sentence_case(label)
}

pub(crate) fn to_sentence_case(label: &str) -> String {
    let chars: Vec<char> = label.chars().collect();
    let mut out = String::with_capacity(label.len());

    for (i, &c) in chars.iter().enumerate() {
        if i == 0 || i + 1 >= chars.len() {
            out.push(c);
            continue;
        }
        let next = chars[i + 1];
        let keep = c.is_uppercase() && (next.is_uppercase() || !next.is_alphabetic());
        if keep {
            out.push(c);
        } else {
            out.extend(c.to_lowercase());
        }
    }

    out
}
