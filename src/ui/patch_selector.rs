// Patch selector widget - current patch display, patch menus, favorites and search
//
// The widget only keeps transient display/selection state. Patch data comes
// from `PatchStorage`; loading, overlays and file choosers go through the
// `EditorHost`. Loading is asynchronous: `load_patch` queues an id and the
// editor picks it up with `take_enqueued_selection`.

use crate::host::{EditorHost, FileChooserRequest, OverlayKind};
use crate::menu::builder::{NOT_IMPLEMENTED_MESSAGE, NOT_IMPLEMENTED_TITLE};
use crate::menu::{Menu, MenuAction, MenuContext, build_classic_menu, build_favorites_menu};
use crate::patch::library::PATCH_EXTENSION;
use crate::patch::{CategoryKind, PatchStorage, UserDefaultKey};
use crate::ui::menu_render::{MenuChoice, render_menu};
use crate::ui::type_ahead::PatchDbTypeAhead;
use eframe::egui;
use egui::{Align2, Color32, FontId, Modifiers, PointerButton, Pos2, Rect, Vec2};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Delay between checks of the patch database while it is indexing
pub const TYPEAHEAD_POLL_INTERVAL: Duration = Duration::from_millis(1000 / 30);

/// Hover time per comment tooltip countdown step
pub const TOOLTIP_STEP: Duration = Duration::from_millis(200);
const TOOLTIP_STEPS: i32 = 5;

/// Side of the favorites and search buttons
const BUTTON_SIZE: f32 = 15.0;

const SELECTOR_HEIGHT: f32 = 36.0;

/// A mouse press on the selector
#[derive(Debug, Clone, Copy)]
pub struct SelectorClick {
    pub pos: Pos2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

#[derive(Debug, Default)]
struct TypeAheadState {
    on: bool,
    enabled: bool,
    text: String,
    next_poll: Option<Instant>,
    focus_requested: bool,
    selected_row: usize,
}

pub struct PatchSelector {
    current_patch: Option<usize>,
    current_category: Option<usize>,
    enqueue_sel_id: Option<usize>,
    value_changed: bool,

    pname: String,
    category: String,
    author: String,
    comment: String,
    is_favorite: bool,
    is_user: bool,

    type_ahead: TypeAheadState,
    provider: PatchDbTypeAhead,

    hovering: bool,
    favorites_hover: bool,
    search_hover: bool,
    tooltip_countdown: i32,
    next_tooltip_step: Option<Instant>,
    tooltip_visible: bool,

    open_menu: Option<(Menu, Pos2)>,
}

impl Default for PatchSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchSelector {
    pub fn new() -> Self {
        Self {
            current_patch: None,
            current_category: None,
            enqueue_sel_id: None,
            value_changed: false,
            pname: String::new(),
            category: String::new(),
            author: String::new(),
            comment: String::new(),
            is_favorite: false,
            is_user: false,
            type_ahead: TypeAheadState::default(),
            provider: PatchDbTypeAhead::new(),
            hovering: false,
            favorites_hover: false,
            search_hover: false,
            tooltip_countdown: -1,
            next_tooltip_step: None,
            tooltip_visible: false,
            open_menu: None,
        }
    }

    /// Show `patch` from the catalog as the current patch
    pub fn set_current_patch(&mut self, patch: usize, storage: &dyn PatchStorage) {
        let catalog = storage.catalog();
        let Some(entry) = catalog.patches.get(patch) else {
            return;
        };

        self.current_patch = Some(patch);
        self.current_category = Some(entry.category);
        self.pname = entry.name.clone();
        self.author = entry.author.clone();
        self.comment = entry.comment.clone();
        self.is_favorite = entry.is_favorite;
        self.category = catalog
            .categories
            .get(entry.category)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.is_user = catalog.category_kind(entry.category) == CategoryKind::User;
    }

    /// Show a patch that is not part of the catalog (loaded from a file)
    pub fn set_external_patch(&mut self, name: &str, author: &str) {
        self.current_patch = None;
        self.current_category = None;
        self.pname = name.to_string();
        self.author = author.to_string();
        self.category.clear();
        self.comment.clear();
        self.is_favorite = false;
        self.is_user = false;
    }

    pub fn current_patch_id(&self) -> Option<usize> {
        self.current_patch
    }

    pub fn current_category_id(&self) -> Option<usize> {
        self.current_category
    }

    pub fn patch_name(&self) -> &str {
        &self.pname
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// Queue `id` for loading; negative ids are ignored
    pub fn load_patch(&mut self, id: i32) {
        if let Ok(id) = usize::try_from(id) {
            self.select_patch(id);
        }
    }

    /// Queue catalog patch `id` for loading
    pub fn select_patch(&mut self, id: usize) {
        self.queue_selection(id);
    }

    fn queue_selection(&mut self, id: usize) {
        self.enqueue_sel_id = Some(id);
        self.value_changed = true;
    }

    /// Selection queued since the last call, if any
    pub fn take_enqueued_selection(&mut self) -> Option<usize> {
        if !std::mem::take(&mut self.value_changed) {
            return None;
        }
        self.enqueue_sel_id
    }

    fn menu_context(&self, host: &dyn EditorHost) -> MenuContext {
        let help_url = host
            .help_url_for_special("patch-browser")
            .filter(|url| !url.is_empty())
            .map(|url| host.fully_resolved_help_url(&url));

        MenuContext {
            current_patch: self.current_patch,
            current_category: self.current_category,
            is_user: self.is_user,
            help_url,
        }
    }

    /// Build the patch menu; `None` when there is nothing to show
    pub fn show_classic_menu(
        &self,
        single_category: bool,
        storage: &dyn PatchStorage,
        host: &dyn EditorHost,
    ) -> Option<Menu> {
        build_classic_menu(storage.catalog(), &self.menu_context(host), single_category)
    }

    pub fn favorites_rect(bounds: Rect) -> Rect {
        Rect::from_min_size(
            Pos2::new(bounds.max.x - BUTTON_SIZE, bounds.min.y),
            Vec2::splat(BUTTON_SIZE),
        )
        .shrink(1.0)
        .translate(Vec2::new(-2.0, 1.0))
    }

    pub fn search_rect(bounds: Rect) -> Rect {
        Rect::from_min_size(bounds.min, Vec2::splat(BUTTON_SIZE))
            .shrink(1.0)
            .translate(Vec2::new(2.0, 1.0))
    }

    fn type_ahead_rect(bounds: Rect) -> Rect {
        bounds
            .shrink2(Vec2::new(BUTTON_SIZE + 4.0, 0.0))
            .translate(Vec2::new(0.0, -2.0))
    }

    /// Handle a mouse press; returns the menu to pop up, if any
    pub fn mouse_down(
        &mut self,
        click: SelectorClick,
        bounds: Rect,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) -> Option<Menu> {
        if click.button == PointerButton::Middle {
            host.control_modifier_clicked();
            return None;
        }

        if Self::favorites_rect(bounds).contains(click.pos) {
            if click.button == PointerButton::Secondary {
                return build_favorites_menu(storage.catalog());
            }

            // Patches loaded from outside the catalog cannot be favorites
            if let Some(patch) = self.current_patch {
                self.is_favorite = !self.is_favorite;
                storage.set_patch_favorite(patch, self.is_favorite);
            }
            return None;
        }

        if click.modifiers.shift || Self::search_rect(bounds).contains(click.pos) {
            self.toggle_type_ahead_search(!self.type_ahead.on, storage);
            return None;
        }

        // Right click or command click only shows the current category
        let single_category = click.button == PointerButton::Secondary || click.modifiers.command;
        self.show_classic_menu(single_category, storage, host)
    }

    /// Run a chosen menu action
    pub fn perform(
        &mut self,
        action: MenuAction,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) {
        match action {
            MenuAction::LoadPatch(id) => self.queue_selection(id),
            MenuAction::InitializePatch => {
                let init = storage.initial_patch();
                if let Some(id) =
                    storage
                        .catalog()
                        .find_patch(&init.name, &init.category, init.is_factory())
                {
                    self.queue_selection(id);
                } else {
                    log::warn!("Initial patch '{}' not found", init.name);
                }
            }
            MenuAction::SetCurrentPatchAsDefault => self.set_current_as_default(storage),
            MenuAction::SavePatch => host.show_overlay(OverlayKind::SavePatch),
            MenuAction::LoadPatchFromFile => {
                let start_dir = storage.user_default_path(
                    UserDefaultKey::LastPatchPath,
                    storage.user_patches_path(),
                );

                let results = host.launch_file_chooser(FileChooserRequest {
                    title: "Select Patch to Load".to_string(),
                    start_dir: start_dir.clone(),
                    pattern: format!("*.{}", PATCH_EXTENSION),
                });
                self.patch_file_chosen(&results, &start_dir, storage, host);
            }
            MenuAction::RenamePatch | MenuAction::DeletePatch => {
                storage.report_error(NOT_IMPLEMENTED_MESSAGE, NOT_IMPLEMENTED_TITLE);
            }
            MenuAction::OpenPatchDatabase => self.open_patch_browser(host),
            MenuAction::RefreshPatchBrowser => self.rescan_library(storage),
            MenuAction::OpenUserPatchesFolder => {
                let path = storage.user_patches_path().to_path_buf();
                host.open_file_or_folder(&path);
            }
            MenuAction::OpenFactoryPatchesFolder => {
                host.open_file_or_folder(&storage.factory_patches_path());
            }
            MenuAction::OpenThirdPartyPatchesFolder => {
                host.open_file_or_folder(&storage.third_party_patches_path());
            }
        }
    }

    fn set_current_as_default(&self, storage: &mut dyn PatchStorage) {
        let (Some(patch), Some(category)) = (self.current_patch, self.current_category) else {
            return;
        };

        let catalog = storage.catalog();
        let (Some(patch), Some(category)) =
            (catalog.patches.get(patch), catalog.categories.get(category))
        else {
            return;
        };

        let name = patch.name.clone();
        let category_name = category.name.clone();
        let category_type = if category.is_factory { "Factory" } else { "User" };

        storage.update_user_default(UserDefaultKey::InitialPatchName, &name);
        storage.update_user_default(UserDefaultKey::InitialPatchCategory, &category_name);
        storage.update_user_default(UserDefaultKey::InitialPatchCategoryType, category_type);
    }

    /// Result of the "Load Patch from File..." chooser
    ///
    /// Only a single selection is loaded. A new parent directory becomes the
    /// next starting point.
    pub fn patch_file_chosen(
        &mut self,
        results: &[PathBuf],
        start_dir: &Path,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) {
        let [file] = results else {
            return;
        };

        host.queue_patch_file_load(file);

        if let Some(dir) = file.parent()
            && dir != start_dir
        {
            storage.update_user_default_path(UserDefaultKey::LastPatchPath, dir);
        }
    }

    /// Rescan the library and find the current patch again
    ///
    /// Catalog indices change on a rescan, so the current patch is looked up
    /// by file. A patch that disappeared stays displayed as an external one.
    pub fn rescan_library(&mut self, storage: &mut dyn PatchStorage) {
        let current_file = self
            .current_patch
            .and_then(|p| storage.catalog().patches.get(p))
            .map(|p| p.path.clone());

        storage.refresh_patch_list();

        let Some(file) = current_file else {
            return;
        };
        match storage.catalog().find_patch_by_path(&file) {
            Some(id) => self.set_current_patch(id, storage),
            None => {
                log::info!("Current patch {} is no longer in the library", file.display());
                let (name, author) = (self.pname.clone(), self.author.clone());
                self.set_external_patch(&name, &author);
            }
        }
    }

    pub fn open_patch_browser(&self, host: &mut dyn EditorHost) {
        host.show_overlay(OverlayKind::PatchBrowser);
    }

    pub fn is_type_ahead_on(&self) -> bool {
        self.type_ahead.on
    }

    pub fn is_type_ahead_enabled(&self) -> bool {
        self.type_ahead.enabled
    }

    pub fn type_ahead_text(&self) -> &str {
        &self.type_ahead.text
    }

    /// A database re-check is scheduled
    pub fn type_ahead_poll_pending(&self) -> bool {
        self.type_ahead.next_poll.is_some()
    }

    /// Switch between the patch name display and the search box
    ///
    /// While the database is still indexing the box is disabled and re-checked
    /// every `TYPEAHEAD_POLL_INTERVAL`.
    pub fn toggle_type_ahead_search(&mut self, on: bool, storage: &mut dyn PatchStorage) {
        self.type_ahead.on = on;

        if !on {
            self.type_ahead.enabled = false;
            self.type_ahead.next_poll = None;
            self.provider.clear();
            return;
        }

        storage.initialize_patch_db();
        self.type_ahead.selected_row = 0;
        self.refresh_type_ahead(storage);
    }

    /// Timer callback: enable the search box once indexing is done
    pub fn enable_type_ahead_if_ready(&mut self, storage: &dyn PatchStorage) {
        if !self.type_ahead.on {
            self.type_ahead.next_poll = None;
            return;
        }
        self.refresh_type_ahead(storage);
    }

    fn refresh_type_ahead(&mut self, storage: &dyn PatchStorage) {
        let jobs = storage.patch_db().number_of_jobs_outstanding();

        if jobs > 0 {
            self.type_ahead.enabled = false;
            self.type_ahead.text = format!("Updating Patch DB: {} jobs", jobs);
            self.type_ahead.next_poll = Some(Instant::now() + TYPEAHEAD_POLL_INTERVAL);
        } else {
            self.type_ahead.enabled = true;
            self.type_ahead.text = self.pname.clone();
            self.type_ahead.next_poll = None;
            self.type_ahead.focus_requested = true;
        }
    }

    /// Query the database; returns the number of results
    pub fn search(&mut self, query: &str, storage: &dyn PatchStorage) -> usize {
        self.type_ahead.selected_row = 0;
        self.provider.search_for(storage.patch_db(), query).len()
    }

    pub fn search_results(&self) -> &PatchDbTypeAhead {
        &self.provider
    }

    /// A search result was picked
    pub fn item_selected(
        &mut self,
        index: usize,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) {
        let Some(file) = self.provider.record(index).map(|r| r.file.clone()) else {
            return;
        };
        self.toggle_type_ahead_search(false, storage);
        host.queue_patch_file_load(&file);
    }

    pub fn typeahead_canceled(&mut self, storage: &mut dyn PatchStorage) {
        self.toggle_type_ahead_search(false, storage);
    }

    pub fn mouse_enter(&mut self) {
        self.hovering = true;
        if self.tooltip_countdown < 0 {
            self.tooltip_countdown = TOOLTIP_STEPS;
            self.next_tooltip_step = Some(Instant::now() + TOOLTIP_STEP);
        }
    }

    /// Returns true if a hover state changed and the widget needs a repaint
    pub fn mouse_move(&mut self, pos: Pos2, bounds: Rect) -> bool {
        if self.tooltip_countdown >= 0 {
            self.tooltip_countdown = TOOLTIP_STEPS;
        }
        self.tooltip_visible = false;

        let favorites_hover = Self::favorites_rect(bounds).contains(pos);
        let search_hover = Self::search_rect(bounds).contains(pos);
        let changed = favorites_hover != self.favorites_hover || search_hover != self.search_hover;

        self.favorites_hover = favorites_hover;
        self.search_hover = search_hover;
        changed
    }

    pub fn end_hover(&mut self) {
        self.hovering = false;
        self.favorites_hover = false;
        self.search_hover = false;
        self.tooltip_countdown = -1;
        self.next_tooltip_step = None;
        self.tooltip_visible = false;
    }

    /// Timer callback of the comment tooltip countdown
    pub fn should_tooltip(&mut self) {
        if self.tooltip_countdown < 0 {
            self.next_tooltip_step = None;
            return;
        }

        self.tooltip_countdown -= 1;
        if self.tooltip_countdown == 0 {
            self.tooltip_countdown = -1;
            self.next_tooltip_step = None;
            self.tooltip_visible = !self.comment.is_empty();
        } else {
            self.next_tooltip_step = Some(Instant::now() + TOOLTIP_STEP);
        }
    }

    pub fn is_comment_tooltip_visible(&self) -> bool {
        self.tooltip_visible
    }

    /// Screen reader value of the widget
    pub fn accessible_value(&self) -> String {
        let mut value = self.pname.clone();
        if !self.category.is_empty() {
            value.push_str(&format!(", category: {}", self.category));
        }
        if !self.author.is_empty() {
            value.push_str(&format!(", author: {}", self.author));
        }
        value
    }

    /// Draw the selector and handle its input
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) -> egui::Response {
        let desired = Vec2::new(ui.available_width(), SELECTOR_HEIGHT);
        let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click());

        let value = self.accessible_value();
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &value));

        self.handle_hover(ui, &response, rect);
        self.handle_clicks(ui, &response, rect, storage, host);

        if response.has_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.open_patch_browser(host);
        }

        self.paint(ui, rect);

        if self.type_ahead.on {
            self.type_ahead_ui(ui, rect, storage, host);
        }

        self.menu_ui(ui, storage, host);
        self.schedule_timers(ui, storage);

        if self.tooltip_visible {
            egui::Area::new(response.id.with("comment"))
                .order(egui::Order::Tooltip)
                .fixed_pos(rect.left_bottom())
                .show(ui.ctx(), |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| ui.label(&self.comment));
                });
        }

        response
    }

    fn handle_hover(&mut self, ui: &egui::Ui, response: &egui::Response, rect: Rect) {
        match response.hover_pos() {
            Some(pos) => {
                if !self.hovering {
                    self.mouse_enter();
                }
                let moved = ui.input(|i| i.pointer.delta() != Vec2::ZERO);
                if moved && self.mouse_move(pos, rect) {
                    ui.ctx().request_repaint();
                }
            }
            None => {
                if self.hovering {
                    self.end_hover();
                }
            }
        }
    }

    fn handle_clicks(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) {
        let button = [PointerButton::Primary, PointerButton::Secondary, PointerButton::Middle]
            .into_iter()
            .find(|b| response.clicked_by(*b));

        let (Some(button), Some(pos)) = (button, response.interact_pointer_pos()) else {
            return;
        };

        let click = SelectorClick {
            pos,
            button,
            modifiers: ui.input(|i| i.modifiers),
        };

        if let Some(menu) = self.mouse_down(click, rect, storage, host) {
            self.open_menu = Some((menu, rect.left_bottom()));
        }
    }

    fn paint(&self, ui: &egui::Ui, rect: Rect) {
        let painter = ui.painter_at(rect);
        let visuals = ui.visuals();
        let text_color = visuals.strong_text_color();
        let weak_color = visuals.weak_text_color();

        if !self.type_ahead.on {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                &self.pname,
                FontId::proportional(14.0),
                text_color,
            );

            let lower = rect.shrink2(Vec2::new(3.0, 2.0));
            painter.text(
                lower.left_bottom(),
                Align2::LEFT_BOTTOM,
                &self.category,
                FontId::proportional(9.0),
                weak_color,
            );
            painter.text(
                lower.right_bottom(),
                Align2::RIGHT_BOTTOM,
                &self.author,
                FontId::proportional(9.0),
                weak_color,
            );
        }

        let star = if self.is_favorite { "★" } else { "☆" };
        let star_color = if self.favorites_hover {
            Color32::YELLOW
        } else {
            text_color
        };
        painter.text(
            Self::favorites_rect(rect).center(),
            Align2::CENTER_CENTER,
            star,
            FontId::proportional(12.0),
            star_color,
        );

        let search_color = if self.search_hover {
            Color32::LIGHT_BLUE
        } else {
            text_color
        };
        painter.text(
            Self::search_rect(rect).center(),
            Align2::CENTER_CENTER,
            "🔍",
            FontId::proportional(11.0),
            search_color,
        );
    }

    fn type_ahead_ui(
        &mut self,
        ui: &mut egui::Ui,
        rect: Rect,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) {
        let edit_rect = Self::type_ahead_rect(rect);
        let edit = egui::TextEdit::singleline(&mut self.type_ahead.text)
            .horizontal_align(egui::Align::Center)
            .interactive(self.type_ahead.enabled);
        let edit_response = ui.put(edit_rect, edit);

        if std::mem::take(&mut self.type_ahead.focus_requested) {
            edit_response.request_focus();
            select_all(ui.ctx(), edit_response.id, &self.type_ahead.text);
        }

        if !self.type_ahead.enabled {
            return;
        }

        if edit_response.changed() {
            let query = self.type_ahead.text.clone();
            self.search(&query, storage);
        }

        let (escape, enter, up, down) = ui.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });

        let count = self.provider.results().len();
        if down && count > 0 {
            self.type_ahead.selected_row = (self.type_ahead.selected_row + 1).min(count - 1);
        }
        if up {
            self.type_ahead.selected_row = self.type_ahead.selected_row.saturating_sub(1);
        }

        if escape {
            self.typeahead_canceled(storage);
            return;
        }

        if enter && count > 0 {
            let row = self.type_ahead.selected_row.min(count - 1);
            self.item_selected(row, storage, host);
            return;
        }

        if count == 0 {
            return;
        }

        let mut picked = None;
        let selected_row = self.type_ahead.selected_row;
        let provider = &self.provider;
        let row_height = provider.row_height();
        let list_height = row_height * provider.displayed_rows() as f32;

        egui::Area::new(edit_response.id.with("results"))
            .order(egui::Order::Foreground)
            .fixed_pos(edit_rect.left_bottom())
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(edit_rect.width());
                    ui.weak(format!("{}", count));
                    egui::ScrollArea::vertical()
                        .max_height(list_height)
                        .show_rows(ui, row_height, count, |ui, rows| {
                            for row in rows {
                                let Some(record) = provider.record(row) else {
                                    continue;
                                };
                                let text =
                                    format!("{}\n{}  ·  {}", record.name, record.cat, record.author);
                                if ui.selectable_label(row == selected_row, text).clicked() {
                                    picked = Some(row);
                                }
                            }
                        });
                });
            });

        if let Some(row) = picked {
            self.item_selected(row, storage, host);
        }
    }

    fn menu_ui(
        &mut self,
        ui: &mut egui::Ui,
        storage: &mut dyn PatchStorage,
        host: &mut dyn EditorHost,
    ) {
        let Some((menu, pos)) = self.open_menu.take() else {
            return;
        };

        let area = egui::Area::new(ui.id().with("patch_menu"))
            .order(egui::Order::Foreground)
            .fixed_pos(pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::menu(ui.style())
                    .show(ui, |ui| render_menu(ui, &menu))
                    .inner
            });

        match area.inner {
            Some(MenuChoice::Action(action)) => self.perform(action, storage, host),
            Some(MenuChoice::OpenUrl(url)) => host.open_url(&url),
            None => {
                let clicked_elsewhere = ui.input(|i| i.pointer.any_pressed())
                    && !area.response.contains_pointer()
                    && !ui.ctx().is_pointer_over_area();
                let escape = ui.input(|i| i.key_pressed(egui::Key::Escape));
                if !clicked_elsewhere && !escape {
                    self.open_menu = Some((menu, pos));
                }
            }
        }
    }

    fn schedule_timers(&mut self, ui: &egui::Ui, storage: &dyn PatchStorage) {
        let now = Instant::now();

        if let Some(due) = self.type_ahead.next_poll {
            if now >= due {
                self.enable_type_ahead_if_ready(storage);
            }
            if self.type_ahead.next_poll.is_some() {
                ui.ctx().request_repaint_after(TYPEAHEAD_POLL_INTERVAL);
            } else {
                ui.ctx().request_repaint();
            }
        }

        if let Some(due) = self.next_tooltip_step {
            if now >= due {
                self.should_tooltip();
            }
            if self.next_tooltip_step.is_some() {
                ui.ctx().request_repaint_after(TOOLTIP_STEP);
            }
        }
    }
}

fn select_all(ctx: &egui::Context, id: egui::Id, text: &str) {
    use egui::text::{CCursor, CCursorRange};

    if let Some(mut state) = egui::TextEdit::load_state(ctx, id) {
        let range = CCursorRange::two(CCursor::new(0), CCursor::new(text.chars().count()));
        state.cursor.set_char_range(Some(range));
        state.store(ctx, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{
        CatalogBuilder, InitialPatch, PatchCatalog, PatchDatabase, PatchInfo, PatchRecord,
    };
    use std::cell::Cell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeDb {
        jobs: Cell<usize>,
        initialized: Cell<bool>,
    }

    impl PatchDatabase for FakeDb {
        fn initialize(&self) {
            self.initialized.set(true);
        }

        fn query_from_query_string(&self, query: &str) -> Vec<PatchRecord> {
            vec![PatchRecord {
                file: PathBuf::from(format!("/patches/{}.fxp", query)),
                name: query.to_string(),
                cat: "Leads".to_string(),
                author: "Alice".to_string(),
            }]
        }

        fn number_of_jobs_outstanding(&self) -> usize {
            self.jobs.get()
        }
    }

    struct TestStorage {
        catalog: PatchCatalog,
        db: FakeDb,
        defaults: HashMap<UserDefaultKey, String>,
        errors: Vec<(String, String)>,
        refreshed: usize,
        user: PathBuf,
        data: PathBuf,
    }

    impl TestStorage {
        fn new() -> Self {
            let mut builder = CatalogBuilder::new();
            builder
                .add_patch(
                    CategoryKind::Factory,
                    "Templates",
                    PatchInfo::new("Init Saw", "/data/patches_factory/Templates/Init Saw.fxp"),
                )
                .add_patch(
                    CategoryKind::Factory,
                    "Leads",
                    PatchInfo::new("Lead", "/data/patches_factory/Leads/Lead.fxp")
                        .author("Alice"),
                )
                .add_patch(
                    CategoryKind::User,
                    "Mine",
                    PatchInfo::new("My Pad", "/user/Mine/My Pad.fxp"),
                );

            Self {
                catalog: builder.build(),
                db: FakeDb::default(),
                defaults: HashMap::new(),
                errors: Vec::new(),
                refreshed: 0,
                user: PathBuf::from("/user"),
                data: PathBuf::from("/data"),
            }
        }

        fn patch(&self, name: &str) -> usize {
            self.catalog
                .patches
                .iter()
                .position(|p| p.name == name)
                .expect("patch in catalog")
        }
    }

    impl PatchStorage for TestStorage {
        fn catalog(&self) -> &PatchCatalog {
            &self.catalog
        }

        fn set_patch_favorite(&mut self, patch: usize, favorite: bool) {
            self.catalog.patches[patch].is_favorite = favorite;
        }

        fn user_default(&self, key: UserDefaultKey) -> Option<String> {
            self.defaults.get(&key).cloned()
        }

        fn update_user_default(&mut self, key: UserDefaultKey, value: &str) {
            self.defaults.insert(key, value.to_string());
        }

        fn report_error(&mut self, message: &str, title: &str) {
            self.errors.push((message.to_string(), title.to_string()));
        }

        fn refresh_patch_list(&mut self) {
            self.refreshed += 1;
        }

        fn initialize_patch_db(&mut self) {
            self.db.initialize();
        }

        fn patch_db(&self) -> &dyn PatchDatabase {
            &self.db
        }

        fn user_patches_path(&self) -> &Path {
            &self.user
        }

        fn data_path(&self) -> &Path {
            &self.data
        }
    }

    #[derive(Default)]
    struct FakeHost {
        overlays: Vec<OverlayKind>,
        chooser_requests: Vec<FileChooserRequest>,
        chooser_result: Vec<PathBuf>,
        queued_loads: Vec<PathBuf>,
        opened: Vec<PathBuf>,
        urls: Vec<String>,
        modifier_clicks: usize,
    }

    impl EditorHost for FakeHost {
        fn show_overlay(&mut self, overlay: OverlayKind) {
            self.overlays.push(overlay);
        }

        fn close_overlay(&mut self, overlay: OverlayKind) {
            self.overlays.retain(|o| *o != overlay);
        }

        fn launch_file_chooser(&mut self, request: FileChooserRequest) -> Vec<PathBuf> {
            self.chooser_requests.push(request);
            self.chooser_result.clone()
        }

        fn queue_patch_file_load(&mut self, path: &Path) {
            self.queued_loads.push(path.to_path_buf());
        }

        fn help_url_for_special(&self, special: &str) -> Option<String> {
            Some(format!("{}.html", special))
        }

        fn fully_resolved_help_url(&self, url: &str) -> String {
            format!("https://docs.example.org/{}", url)
        }

        fn open_file_or_folder(&mut self, path: &Path) {
            self.opened.push(path.to_path_buf());
        }

        fn open_url(&mut self, url: &str) {
            self.urls.push(url.to_string());
        }

        fn control_modifier_clicked(&mut self) {
            self.modifier_clicks += 1;
        }
    }

    fn bounds() -> Rect {
        Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(200.0, 36.0))
    }

    fn click(pos: Pos2, button: PointerButton, modifiers: Modifiers) -> SelectorClick {
        SelectorClick {
            pos,
            button,
            modifiers,
        }
    }

    #[test]
    fn test_negative_load_is_ignored() {
        let mut selector = PatchSelector::new();

        selector.load_patch(-1);
        assert_eq!(selector.take_enqueued_selection(), None);

        selector.load_patch(4);
        assert_eq!(selector.take_enqueued_selection(), Some(4));
        assert_eq!(selector.take_enqueued_selection(), None);
    }

    #[test]
    fn test_select_patch_keeps_full_index() {
        let mut selector = PatchSelector::new();
        let id = i32::MAX as usize + 7;

        selector.select_patch(id);
        assert_eq!(selector.take_enqueued_selection(), Some(id));
    }

    #[test]
    fn test_set_current_patch() {
        let storage = TestStorage::new();
        let mut selector = PatchSelector::new();

        selector.set_current_patch(storage.patch("Lead"), &storage);

        assert_eq!(selector.patch_name(), "Lead");
        assert_eq!(selector.accessible_value(), "Lead, category: Leads, author: Alice");
        assert!(!selector.is_favorite());
    }

    #[test]
    fn test_favorite_toggle_click() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();
        let lead = storage.patch("Lead");
        selector.set_current_patch(lead, &storage);

        let star = PatchSelector::favorites_rect(bounds()).center();
        let menu = selector.mouse_down(
            click(star, PointerButton::Primary, Modifiers::NONE),
            bounds(),
            &mut storage,
            &mut host,
        );

        assert!(menu.is_none());
        assert!(selector.is_favorite());
        assert!(storage.catalog.patches[lead].is_favorite);
    }

    #[test]
    fn test_star_click_ignored_for_external_patch() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();
        selector.set_external_patch("Downloaded", "");

        let star = PatchSelector::favorites_rect(bounds()).center();
        let menu = selector.mouse_down(
            click(star, PointerButton::Primary, Modifiers::NONE),
            bounds(),
            &mut storage,
            &mut host,
        );

        assert!(menu.is_none());
        assert!(!selector.is_favorite());
        assert!(storage.catalog.patches.iter().all(|p| !p.is_favorite));
    }

    #[test]
    fn test_right_click_on_star_shows_favorites() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        let star = PatchSelector::favorites_rect(bounds()).center();
        let none = selector.mouse_down(
            click(star, PointerButton::Secondary, Modifiers::NONE),
            bounds(),
            &mut storage,
            &mut host,
        );
        assert!(none.is_none());

        let lead = storage.patch("Lead");
        storage.set_patch_favorite(lead, true);
        let menu = selector
            .mouse_down(
                click(star, PointerButton::Secondary, Modifiers::NONE),
                bounds(),
                &mut storage,
                &mut host,
            )
            .expect("favorites menu");
        assert!(menu.actions().contains(&MenuAction::LoadPatch(lead)));
    }

    #[test]
    fn test_middle_click_goes_to_host() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        let menu = selector.mouse_down(
            click(bounds().center(), PointerButton::Middle, Modifiers::NONE),
            bounds(),
            &mut storage,
            &mut host,
        );

        assert!(menu.is_none());
        assert_eq!(host.modifier_clicks, 1);
    }

    #[test]
    fn test_click_shows_classic_menu() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();
        selector.set_current_patch(storage.patch("Lead"), &storage);

        let full = selector
            .mouse_down(
                click(bounds().center(), PointerButton::Primary, Modifiers::NONE),
                bounds(),
                &mut storage,
                &mut host,
            )
            .expect("menu");
        let single = selector
            .mouse_down(
                click(bounds().center(), PointerButton::Secondary, Modifiers::NONE),
                bounds(),
                &mut storage,
                &mut host,
            )
            .expect("menu");

        assert!(full.sub_menu_labels().contains(&"Mine"));
        assert!(single.sub_menu_labels().is_empty());
        assert_eq!(single.section_headers()[0], "PATCHES (LEADS)");
        assert!(single.actions().contains(&MenuAction::LoadPatch(storage.patch("Lead"))));
    }

    #[test]
    fn test_shift_click_toggles_search() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        selector.mouse_down(
            click(bounds().center(), PointerButton::Primary, shift),
            bounds(),
            &mut storage,
            &mut host,
        );
        assert!(selector.is_type_ahead_on());
        assert!(storage.db.initialized.get());

        let search = PatchSelector::search_rect(bounds()).center();
        selector.mouse_down(
            click(search, PointerButton::Primary, Modifiers::NONE),
            bounds(),
            &mut storage,
            &mut host,
        );
        assert!(!selector.is_type_ahead_on());
    }

    #[test]
    fn test_type_ahead_waits_for_indexing() {
        let mut storage = TestStorage::new();
        let mut selector = PatchSelector::new();
        selector.set_current_patch(storage.patch("Lead"), &storage);
        storage.db.jobs.set(3);

        selector.toggle_type_ahead_search(true, &mut storage);
        assert!(!selector.is_type_ahead_enabled());
        assert_eq!(selector.type_ahead_text(), "Updating Patch DB: 3 jobs");
        assert!(selector.type_ahead_poll_pending());

        storage.db.jobs.set(0);
        selector.enable_type_ahead_if_ready(&storage);
        assert!(selector.is_type_ahead_enabled());
        assert_eq!(selector.type_ahead_text(), "Lead");
        assert!(!selector.type_ahead_poll_pending());
    }

    #[test]
    fn test_search_and_select() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        selector.toggle_type_ahead_search(true, &mut storage);
        assert_eq!(selector.search("pad", &storage), 1);

        selector.item_selected(0, &mut storage, &mut host);
        assert_eq!(host.queued_loads, vec![PathBuf::from("/patches/pad.fxp")]);
        assert!(!selector.is_type_ahead_on());
    }

    #[test]
    fn test_init_patch_action() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        selector.perform(MenuAction::InitializePatch, &mut storage, &mut host);

        assert_eq!(
            selector.take_enqueued_selection(),
            Some(storage.patch("Init Saw"))
        );
    }

    #[test]
    fn test_set_current_as_default() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();
        selector.set_current_patch(storage.patch("My Pad"), &storage);

        selector.perform(MenuAction::SetCurrentPatchAsDefault, &mut storage, &mut host);

        let init: InitialPatch = storage.initial_patch();
        assert_eq!(init.name, "My Pad");
        assert_eq!(init.category, "Mine");
        assert_eq!(init.category_type, "User");
    }

    #[test]
    fn test_rename_reports_not_implemented() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        selector.perform(MenuAction::RenamePatch, &mut storage, &mut host);
        selector.perform(MenuAction::DeletePatch, &mut storage, &mut host);

        assert_eq!(storage.errors.len(), 2);
        assert_eq!(storage.errors[0].1, NOT_IMPLEMENTED_TITLE);
    }

    #[test]
    fn test_load_from_file_updates_last_path() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost {
            chooser_result: vec![PathBuf::from("/downloads/Bass.fxp")],
            ..FakeHost::default()
        };
        let mut selector = PatchSelector::new();

        selector.perform(MenuAction::LoadPatchFromFile, &mut storage, &mut host);

        let request = &host.chooser_requests[0];
        assert_eq!(request.title, "Select Patch to Load");
        assert_eq!(request.start_dir, PathBuf::from("/user"));
        assert_eq!(request.pattern, "*.fxp");
        assert_eq!(host.queued_loads, vec![PathBuf::from("/downloads/Bass.fxp")]);
        assert_eq!(
            storage.user_default(UserDefaultKey::LastPatchPath).as_deref(),
            Some("/downloads")
        );
    }

    #[test]
    fn test_multiple_chosen_files_are_ignored() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        let results = vec![PathBuf::from("/a/1.fxp"), PathBuf::from("/a/2.fxp")];
        selector.patch_file_chosen(&results, Path::new("/user"), &mut storage, &mut host);

        assert!(host.queued_loads.is_empty());
        assert_eq!(storage.user_default(UserDefaultKey::LastPatchPath), None);
    }

    #[test]
    fn test_folder_and_overlay_actions() {
        let mut storage = TestStorage::new();
        let mut host = FakeHost::default();
        let mut selector = PatchSelector::new();

        selector.perform(MenuAction::OpenUserPatchesFolder, &mut storage, &mut host);
        selector.perform(MenuAction::OpenFactoryPatchesFolder, &mut storage, &mut host);
        selector.perform(MenuAction::OpenThirdPartyPatchesFolder, &mut storage, &mut host);
        selector.perform(MenuAction::SavePatch, &mut storage, &mut host);
        selector.perform(MenuAction::OpenPatchDatabase, &mut storage, &mut host);
        selector.perform(MenuAction::RefreshPatchBrowser, &mut storage, &mut host);

        assert_eq!(
            host.opened,
            vec![
                PathBuf::from("/user"),
                PathBuf::from("/data/patches_factory"),
                PathBuf::from("/data/patches_3rdparty"),
            ]
        );
        assert_eq!(host.overlays, vec![OverlayKind::SavePatch, OverlayKind::PatchBrowser]);
        assert_eq!(storage.refreshed, 1);
    }

    #[test]
    fn test_comment_tooltip_countdown() {
        let mut storage = TestStorage::new();
        let lead = storage.patch("Lead");
        storage.catalog.patches[lead].comment = "Bright lead".to_string();

        let mut selector = PatchSelector::new();
        selector.set_current_patch(lead, &storage);

        selector.mouse_enter();
        for _ in 0..TOOLTIP_STEPS - 1 {
            selector.should_tooltip();
            assert!(!selector.is_comment_tooltip_visible());
        }
        selector.should_tooltip();
        assert!(selector.is_comment_tooltip_visible());

        selector.mouse_move(bounds().center(), bounds());
        assert!(!selector.is_comment_tooltip_visible());
    }

    #[test]
    fn test_help_url_is_resolved() {
        let storage = TestStorage::new();
        let host = FakeHost::default();
        let selector = PatchSelector::new();

        let menu = selector.show_classic_menu(false, &storage, &host).expect("menu");
        let help = menu.entries().iter().find_map(|e| match e {
            crate::menu::MenuEntry::HelpTitle { url, .. } => url.clone(),
            _ => None,
        });

        assert_eq!(
            help.as_deref(),
            Some("https://docs.example.org/patch-browser.html")
        );
    }
}
