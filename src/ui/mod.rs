pub mod app;
pub mod menu_render;
pub mod overlay;
pub mod patch_selector;
pub mod type_ahead;

pub use app::{AppHost, PatchEditorApp};
pub use overlay::{OverlayLayout, OverlaySkin, OverlayWrapper};
pub use patch_selector::PatchSelector;
pub use type_ahead::PatchDbTypeAhead;
