use mymusic_patch_editor::patch::APP_DIR_NAME;
use mymusic_patch_editor::{LibraryPaths, PatchEditorApp, PatchLibrary, UserDefaults};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== MyMusic Patch Editor ===");

    // Optional argument: data folder holding patches_factory / patches_3rdparty
    let paths = match std::env::args().nth(1).map(PathBuf::from) {
        Some(data) => {
            let user = data.join("patches_user");
            LibraryPaths::new(data, user)
        }
        None => match LibraryPaths::default_location() {
            Some(paths) => paths,
            None => {
                log::error!("Could not determine the {} data folder", APP_DIR_NAME);
                return;
            }
        },
    };
    log::info!("Data folder: {}", paths.data.display());
    log::info!("User patches: {}", paths.user.display());

    let defaults = match UserDefaults::default_location() {
        Some(path) => UserDefaults::load(path),
        None => UserDefaults::in_memory(),
    };

    let library = match PatchLibrary::open(paths, defaults) {
        Ok(library) => library,
        Err(e) => {
            log::error!("Failed to open patch library: {}", e);
            return;
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 520.0])
            .with_title("MyMusic Patch Editor"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "MyMusic Patch Editor",
        native_options,
        Box::new(|_cc| Ok(Box::new(PatchEditorApp::new(library)))),
    ) {
        log::error!("Editor window failed: {}", e);
    }
}
