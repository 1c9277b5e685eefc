// Patch editor app - patch selector, overlays and undoable synth controls

use crate::host::{EditorHost, FileChooserRequest, OverlayKind};
use crate::menu::MenuAction;
use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::patch::library::{PATCH_EXTENSION, read_patch_meta};
use crate::patch::{PatchLibrary, PatchStorage};
use crate::ui::overlay::{OverlaySkin, OverlayWrapper};
use crate::ui::patch_selector::PatchSelector;
use crate::undo::target::{N_FX_SLOTS, N_OSCS};
use crate::undo::{SharedEditor, SynthState, UndoManager};
use eframe::egui;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Online manual the help rows point to
pub const MANUAL_URL: &str = "https://mymusic.example.org/manual";

/// Number of synth parameters the editor exposes
pub const PARAMETER_COUNT: usize = 64;

const OSC_TYPES: [&str; 4] = ["Classic", "Sine", "Wavetable", "FM2"];
const FX_TYPES: [&str; 4] = ["Off", "Delay", "Reverb", "Chorus"];

/// `EditorHost` implementation backed by the app window
///
/// Requests that need the egui context (URLs, overlays) are recorded and
/// picked up by `PatchEditorApp::update`.
#[derive(Debug, Default)]
pub struct AppHost {
    open_overlays: HashSet<OverlayKind>,
    queued_loads: VecDeque<PathBuf>,
    pending_urls: Vec<String>,
}

impl AppHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, overlay: OverlayKind) -> bool {
        self.open_overlays.contains(&overlay)
    }

    pub fn take_queued_loads(&mut self) -> Vec<PathBuf> {
        self.queued_loads.drain(..).collect()
    }

    pub fn take_pending_urls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_urls)
    }
}

impl EditorHost for AppHost {
    fn show_overlay(&mut self, overlay: OverlayKind) {
        log::debug!("Opening overlay {:?}", overlay);
        self.open_overlays.insert(overlay);
    }

    fn close_overlay(&mut self, overlay: OverlayKind) {
        self.open_overlays.remove(&overlay);
    }

    fn launch_file_chooser(&mut self, request: FileChooserRequest) -> Vec<PathBuf> {
        rfd::FileDialog::new()
            .set_title(request.title.as_str())
            .set_directory(&request.start_dir)
            .add_filter("Patch", &[request.extension()])
            .pick_file()
            .into_iter()
            .collect()
    }

    fn queue_patch_file_load(&mut self, path: &Path) {
        self.queued_loads.push_back(path.to_path_buf());
    }

    fn help_url_for_special(&self, special: &str) -> Option<String> {
        Some(format!("{}.html", special))
    }

    fn fully_resolved_help_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", MANUAL_URL, url.trim_start_matches('/'))
        }
    }

    fn open_file_or_folder(&mut self, path: &Path) {
        self.pending_urls.push(format!("file://{}", path.display()));
    }

    fn open_url(&mut self, url: &str) {
        self.pending_urls.push(url.to_string());
    }

    fn control_modifier_clicked(&mut self) {
        log::debug!("Middle click on patch selector");
    }
}

pub struct PatchEditorApp {
    library: PatchLibrary,
    selector: PatchSelector,
    host: AppHost,
    synth: Arc<Mutex<SynthState>>,
    undo: UndoManager,
    save_name: String,
    // Notification system
    notification_queue: VecDeque<Notification>,
    max_notifications: usize,
}

impl PatchEditorApp {
    pub fn new(library: PatchLibrary) -> Self {
        let synth = Arc::new(Mutex::new(SynthState::new(PARAMETER_COUNT)));
        let editor: SharedEditor = synth.clone();

        let mut app = Self {
            library,
            selector: PatchSelector::new(),
            host: AppHost::new(),
            synth,
            undo: UndoManager::new(editor),
            save_name: String::new(),
            notification_queue: VecDeque::new(),
            max_notifications: 10,
        };

        // Start on the configured initial patch
        app.selector
            .perform(MenuAction::InitializePatch, &mut app.library, &mut app.host);
        app.process_selection();
        app
    }

    fn notify(&mut self, notification: Notification) {
        self.notification_queue.push_back(notification);
        if self.notification_queue.len() > self.max_notifications {
            self.notification_queue.pop_front();
        }
    }

    fn update_notifications(&mut self) {
        for notification in self.library.take_errors() {
            self.notify(notification);
        }
    }

    /// Recent notifications (less than 5 seconds old)
    fn get_recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(5000))
            .take(3)
            .collect()
    }

    /// Apply the selection queued by the patch selector
    fn process_selection(&mut self) {
        let Some(id) = self.selector.take_enqueued_selection() else {
            return;
        };
        let Some(patch) = self.library.catalog().patches.get(id) else {
            log::warn!("Ignoring selection of unknown patch {}", id);
            return;
        };

        let name = patch.name.clone();
        self.selector.set_current_patch(id, &self.library);
        self.patch_loaded(&name);
    }

    fn process_file_loads(&mut self) {
        for path in self.host.take_queued_loads() {
            if let Some(id) = self.library.catalog().find_patch_by_path(&path) {
                self.selector.select_patch(id);
                self.process_selection();
                continue;
            }

            match std::fs::read(&path) {
                Ok(bytes) => {
                    let meta = read_patch_meta(&bytes);
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.selector.set_external_patch(&name, &meta.author);
                    self.patch_loaded(&name);
                }
                Err(e) => self
                    .library
                    .report_error(&format!("{}: {}", path.display(), e), "Patch Load Error"),
            }
        }
    }

    fn patch_loaded(&mut self, name: &str) {
        log::info!("Loaded patch '{}'", name);
        self.undo.clear();
        self.notify(Notification::info(
            NotificationCategory::Generic,
            format!("Loaded {}", name),
        ));
    }

    fn save_current_patch(&mut self) {
        let name = self.save_name.trim().to_string();
        if name.is_empty() {
            self.library.report_error("Please enter a patch name", "Save Patch");
            return;
        }

        let source = self
            .selector
            .current_patch_id()
            .and_then(|id| self.library.catalog().patches.get(id))
            .map(|p| p.path.clone());
        let Some(source) = source else {
            self.library
                .report_error("The current patch has no file to save from", "Save Patch");
            return;
        };

        let target = self
            .library
            .user_patches_path()
            .join(format!("{}.{}", name, PATCH_EXTENSION));

        let copied = std::fs::create_dir_all(self.library.user_patches_path())
            .and_then(|_| std::fs::copy(&source, &target));
        if let Err(e) = copied {
            self.library.report_error(&e.to_string(), "Save Patch");
            return;
        }

        log::info!("Saved patch to {}", target.display());
        self.selector.rescan_library(&mut self.library);
        if let Some(id) = self.library.catalog().find_patch_by_path(&target) {
            self.selector.set_current_patch(id, &self.library);
        }
        self.host.close_overlay(OverlayKind::SavePatch);
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let redo = ctx.input_mut(|i| {
            i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
        });
        let undo = ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z));

        if redo {
            self.redo();
        } else if undo {
            self.undo();
        }
    }

    fn undo(&mut self) {
        self.undo.dump_stack();
        if !self.undo.undo() && self.undo.can_undo() {
            self.notify(Notification::warning(
                NotificationCategory::Undo,
                "Undo failed".to_string(),
            ));
        }
    }

    fn redo(&mut self) {
        if !self.undo.redo() && self.undo.can_redo() {
            self.notify(Notification::warning(
                NotificationCategory::Undo,
                "Redo failed".to_string(),
            ));
        }
    }

    fn draw_undo_buttons(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let undo_text = self.undo.undo_description().unwrap_or_default();
            if ui
                .add_enabled(self.undo.can_undo(), egui::Button::new("↶ Undo"))
                .on_hover_text(undo_text)
                .clicked()
            {
                self.undo();
            }

            let redo_text = self.undo.redo_description().unwrap_or_default();
            if ui
                .add_enabled(self.undo.can_redo(), egui::Button::new("↷ Redo"))
                .on_hover_text(redo_text)
                .clicked()
            {
                self.redo();
            }

            ui.weak(format!(
                "{} / {} in history",
                self.undo.undo_count(),
                self.undo.redo_count()
            ));
        });
    }

    fn draw_macros(&mut self, ui: &mut egui::Ui) {
        let Ok(macros) = self.synth.lock().map(|s| s.macros) else {
            return;
        };

        ui.horizontal_wrapped(|ui| {
            for (i, before) in macros.iter().copied().enumerate() {
                let mut value = before;
                let response = ui.add(
                    egui::Slider::new(&mut value, 0.0..=1.0)
                        .vertical()
                        .text(format!("M{}", i + 1)),
                );

                // One record per gesture, holding the value from before the drag
                if response.drag_started() || (response.changed() && !response.dragged()) {
                    self.undo.push_macro_change(i, before);
                }

                if response.changed()
                    && let Ok(mut synth) = self.synth.lock()
                {
                    synth.macros[i] = value;
                }
            }
        });
    }

    fn draw_oscillators(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for osc in 0..N_OSCS {
                let Ok(current) = self.synth.lock().map(|s| s.oscillators[0][osc].osc_type) else {
                    return;
                };
                let mut selected = current;

                egui::ComboBox::from_id_salt(("osc_type", osc))
                    .selected_text(type_name(&OSC_TYPES, current))
                    .show_ui(ui, |ui| {
                        for (t, name) in OSC_TYPES.iter().enumerate() {
                            ui.selectable_value(&mut selected, t as u32, *name);
                        }
                    });

                if selected != current {
                    self.undo.push_oscillator(0, osc);
                    if let Ok(mut synth) = self.synth.lock() {
                        let snapshot = &mut synth.oscillators[0][osc];
                        snapshot.osc_type = selected;
                        snapshot.params.clear();
                    }
                }
            }
        });
    }

    fn draw_fx(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for slot in 0..N_FX_SLOTS.min(4) {
                let Ok(current) = self.synth.lock().map(|s| s.fx[slot].fx_type) else {
                    return;
                };
                let mut selected = current;

                egui::ComboBox::from_id_salt(("fx_type", slot))
                    .selected_text(type_name(&FX_TYPES, current))
                    .show_ui(ui, |ui| {
                        for (t, name) in FX_TYPES.iter().enumerate() {
                            ui.selectable_value(&mut selected, t as u32, *name);
                        }
                    });

                if selected != current {
                    self.undo.push_fx(slot);
                    if let Ok(mut synth) = self.synth.lock() {
                        synth.fx[slot].fx_type = selected;
                        synth.fx[slot].params.clear();
                    }
                }
            }
        });
    }

    fn draw_patch_browser(&mut self, ui: &mut egui::Ui, area: egui::Rect) {
        let layer = egui::LayerId::new(egui::Order::Foreground, egui::Id::new("patch_browser"));
        let mut overlay_ui = ui.new_child(egui::UiBuilder::new().layer_id(layer).max_rect(area));

        let mut wrapper = OverlayWrapper::new("Patch Browser")
            .with_icon("☰")
            .on_close(|| log::debug!("Patch browser closed"));

        let mut picked = None;
        let catalog = self.library.catalog();
        let current = self.selector.current_patch_id();

        let (_, closed) = wrapper.show(&mut overlay_ui, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for &category in &catalog.category_ordering {
                    let Some(cat) = catalog.categories.get(category) else {
                        continue;
                    };
                    let patches = catalog.patches_in_category(category);
                    if patches.is_empty() {
                        continue;
                    }

                    egui::CollapsingHeader::new(format!(
                        "{} ({})",
                        cat.name, cat.number_of_patches_in_category_and_children
                    ))
                    .id_salt(("browser_category", category))
                    .show(ui, |ui| {
                        for p in patches {
                            let name = &catalog.patches[p].name;
                            if ui.selectable_label(current == Some(p), name).clicked() {
                                picked = Some(p);
                            }
                        }
                    });
                }
            });
        });

        if let Some(p) = picked {
            self.selector
                .perform(MenuAction::LoadPatch(p), &mut self.library, &mut self.host);
        }
        if closed {
            self.host.close_overlay(OverlayKind::PatchBrowser);
        }
    }

    fn draw_save_dialog(&mut self, ui: &mut egui::Ui, area: egui::Rect) {
        let layer = egui::LayerId::new(egui::Order::Foreground, egui::Id::new("save_patch"));
        let mut overlay_ui = ui.new_child(egui::UiBuilder::new().layer_id(layer).max_rect(area));

        let bounds = egui::Rect::from_center_size(area.center(), egui::vec2(320.0, 110.0));
        let mut wrapper = OverlayWrapper::modal("Save Patch", bounds).with_skin(OverlaySkin {
            background: egui::Color32::from_black_alpha(200),
            ..OverlaySkin::default()
        });

        let save_name = &mut self.save_name;
        let (save, closed) = wrapper.show(&mut overlay_ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(save_name);
            });
            ui.add_space(8.0);
            ui.button("Save").clicked()
        });

        if save {
            self.save_current_patch();
        }
        if closed {
            self.host.close_overlay(OverlayKind::SavePatch);
        }
    }

    /// Status bar at the bottom of the window
    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.separator();
        ui.horizontal(|ui| {
            let recent_notifications = self.get_recent_notifications();

            if recent_notifications.is_empty() {
                ui.label("Ready");
            } else {
                for notification in recent_notifications {
                    let (icon, color) = match notification.level {
                        NotificationLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 150, 255)),
                        NotificationLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 165, 0)),
                        NotificationLevel::Error => ("✖", egui::Color32::RED),
                    };

                    ui.colored_label(color, icon);
                    if !notification.title.is_empty() {
                        ui.colored_label(color, format!("{}:", notification.title));
                    }
                    ui.colored_label(color, &notification.message);
                    ui.add_space(10.0);
                }
            }
        });
    }
}

fn type_name(names: &[&'static str], t: u32) -> &'static str {
    names.get(t as usize).copied().unwrap_or("?")
}

impl eframe::App for PatchEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("patch_selector_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            self.selector.ui(ui, &mut self.library, &mut self.host);
            ui.add_space(4.0);
        });

        self.process_selection();
        self.process_file_loads();
        self.update_notifications();

        for url in self.host.take_pending_urls() {
            ctx.open_url(egui::OpenUrl::new_tab(url));
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let area = ui.available_rect_before_wrap();

            self.draw_undo_buttons(ui);
            ui.separator();

            ui.heading("Macros");
            self.draw_macros(ui);
            ui.add_space(10.0);

            ui.heading("Oscillators");
            self.draw_oscillators(ui);
            ui.add_space(10.0);

            ui.heading("Effects");
            self.draw_fx(ui);

            if self.host.is_open(OverlayKind::PatchBrowser) {
                self.draw_patch_browser(ui, area);
            }
            if self.host.is_open(OverlayKind::SavePatch) {
                self.draw_save_dialog(ui, area);
            }
        });
    }
}
