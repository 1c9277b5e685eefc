// Overlay wrapper - title bar, border and close button around one child

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

const DEFAULT_MARGIN: f32 = 5.0;
const DEFAULT_TITLEBAR_SIZE: f32 = 12.0;
const TITLE_OVERSTRIKE: f32 = 0.5;

/// Colors used by the overlay chrome
#[derive(Debug, Clone, Copy)]
pub struct OverlaySkin {
    /// Dimmed background behind modal overlays
    pub background: Color32,
    pub titlebar_background: Color32,
    pub titlebar_text: Color32,
    pub border: Color32,
}

impl Default for OverlaySkin {
    fn default() -> Self {
        Self {
            background: Color32::from_black_alpha(160),
            titlebar_background: Color32::from_gray(40),
            titlebar_text: Color32::from_gray(230),
            border: Color32::from_gray(120),
        }
    }
}

/// Where each part of the overlay goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    /// Area covered by the chrome
    pub chrome: Rect,
    pub title: Rect,
    pub child: Rect,
    pub close_button: Option<Rect>,
}

/// Decorates one child component with dialog chrome
///
/// Non-modal overlays use the whole area they are given. Modal overlays dim
/// that area and draw their chrome inside a fixed rectangle.
pub struct OverlayWrapper {
    title: String,
    icon: Option<String>,
    component_bounds: Option<Rect>,
    show_close_button: bool,
    margin: f32,
    titlebar_size: f32,
    skin: OverlaySkin,
    on_close: Option<Box<dyn FnMut()>>,
}

impl OverlayWrapper {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            component_bounds: None,
            show_close_button: true,
            margin: DEFAULT_MARGIN,
            titlebar_size: DEFAULT_TITLEBAR_SIZE,
            skin: OverlaySkin::default(),
            on_close: None,
        }
    }

    /// Modal overlay drawn inside `bounds`
    pub fn modal(title: impl Into<String>, bounds: Rect) -> Self {
        let mut wrapper = Self::new(title);
        wrapper.component_bounds = Some(bounds);
        wrapper
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_close_button(mut self, show: bool) -> Self {
        self.show_close_button = show;
        self
    }

    pub fn with_skin(mut self, skin: OverlaySkin) -> Self {
        self.skin = skin;
        self
    }

    /// Callback run when the close button is clicked
    pub fn on_close(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    pub fn is_modal(&self) -> bool {
        self.component_bounds.is_some()
    }

    pub fn layout(&self, local: Rect) -> OverlayLayout {
        let chrome = self.component_bounds.unwrap_or(local);

        let inner = chrome.shrink(2.0 * self.margin);
        let child = Rect::from_min_max(inner.min, Pos2::new(inner.max.x, inner.max.y - self.titlebar_size))
            .translate(Vec2::new(0.0, self.titlebar_size));

        let title = Rect::from_min_size(
            chrome.min,
            Vec2::new(chrome.width(), self.titlebar_size + self.margin),
        );

        // The close button sits in the corner of the full area, even when modal
        let button_size = self.titlebar_size - 2.0;
        let close_button = self.show_close_button.then(|| {
            Rect::from_min_size(
                Pos2::new(local.max.x - button_size, local.min.y),
                Vec2::splat(button_size),
            )
            .translate(Vec2::new(-2.0, 2.0))
        });

        OverlayLayout {
            chrome,
            title,
            child,
            close_button,
        }
    }

    /// Invoke the close callback
    pub fn close_overlay(&mut self) {
        if let Some(callback) = self.on_close.as_mut() {
            callback();
        }
    }

    fn paint(&self, painter: &egui::Painter, local: Rect, layout: &OverlayLayout) {
        if self.is_modal() {
            painter.rect_filled(local, 0.0, self.skin.background);
        }

        painter.rect_filled(layout.chrome, 0.0, self.skin.titlebar_background);

        // Default egui fonts have no bold face: overstrike by half a pixel
        for offset in [Vec2::ZERO, Vec2::new(TITLE_OVERSTRIKE, 0.0)] {
            painter.text(
                layout.title.center() + offset,
                Align2::CENTER_CENTER,
                &self.title,
                FontId::proportional(10.0),
                self.skin.titlebar_text,
            );
        }

        if let Some(icon) = &self.icon {
            painter.text(
                layout.chrome.min + Vec2::new(2.0, 1.0),
                Align2::LEFT_TOP,
                icon,
                FontId::proportional(10.0),
                self.skin.titlebar_text,
            );
        }

        painter.rect_stroke(layout.chrome, 0.0, Stroke::new(1.0, self.skin.border));
    }

    /// Draw the chrome over `ui`'s available area and the child inside it
    ///
    /// Returns the child's result and whether the overlay was closed this frame.
    pub fn show<R>(
        &mut self,
        ui: &mut egui::Ui,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> (R, bool) {
        let local = ui.available_rect_before_wrap();
        let layout = self.layout(local);

        self.paint(ui.painter(), local, &layout);

        let mut child_ui = ui.new_child(egui::UiBuilder::new().max_rect(layout.child));
        let result = add_contents(&mut child_ui);

        let mut closed = false;
        if let Some(button) = layout.close_button
            && ui.put(button, egui::Button::new("X").small()).clicked()
        {
            self.close_overlay();
            closed = true;
        }

        (result, closed)
    }
}
