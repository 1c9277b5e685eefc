// Host editor collaborator of the patch selector

use std::path::{Path, PathBuf};

/// Overlays the patch selector can ask the editor to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    PatchBrowser,
    SavePatch,
}

/// File chooser parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChooserRequest {
    pub title: String,
    pub start_dir: PathBuf,
    /// Glob such as "*.fxp"
    pub pattern: String,
}

impl FileChooserRequest {
    /// Extension part of the pattern ("*.fxp" -> "fxp")
    pub fn extension(&self) -> &str {
        self.pattern.trim_start_matches("*.")
    }
}

/// The editor window hosting the patch selector
pub trait EditorHost {
    fn show_overlay(&mut self, overlay: OverlayKind);

    fn close_overlay(&mut self, overlay: OverlayKind);

    /// Let the user pick files; empty when cancelled
    fn launch_file_chooser(&mut self, request: FileChooserRequest) -> Vec<PathBuf>;

    /// Load a patch file on the next editor idle
    fn queue_patch_file_load(&mut self, path: &Path);

    /// Manual page for a special help topic, relative or absolute
    fn help_url_for_special(&self, special: &str) -> Option<String>;

    fn fully_resolved_help_url(&self, url: &str) -> String;

    fn open_file_or_folder(&mut self, path: &Path);

    fn open_url(&mut self, url: &str);

    /// Middle click on a control
    fn control_modifier_clicked(&mut self);
}
