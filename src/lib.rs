// MyMusic Patch Editor - Library exports for the editor binary and tests

pub mod host;
pub mod menu;
pub mod messaging;
pub mod patch;
pub mod ui;
pub mod undo;

// Re-export commonly used types for convenience
pub use host::{EditorHost, FileChooserRequest, OverlayKind};
pub use menu::{Menu, MenuAction, MenuContext, MenuEntry, build_classic_menu, build_favorites_menu};
pub use messaging::{Notification, NotificationCategory, NotificationLevel};
pub use patch::{
    CatalogBuilder, CategoryKind, LibraryPaths, PatchCatalog, PatchDatabase, PatchDb, PatchInfo,
    PatchLibrary, PatchStorage, StorageError, UserDefaultKey, UserDefaults,
};
pub use ui::{OverlayWrapper, PatchEditorApp, PatchSelector};
pub use undo::{ModSource, ParamValue, SynthState, UndoError, UndoManager, UndoTarget};
