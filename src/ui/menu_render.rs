// Renders a `Menu` description with egui

use crate::menu::{Menu, MenuAction, MenuEntry};
use eframe::egui;

/// What the user picked in a rendered menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Action(MenuAction),
    OpenUrl(String),
}

/// Draw `menu`, one egui column per column break
pub fn render_menu(ui: &mut egui::Ui, menu: &Menu) -> Option<MenuChoice> {
    let mut choice = None;

    ui.horizontal_top(|ui| {
        for column in menu.columns() {
            ui.vertical(|ui| {
                for entry in column {
                    if let Some(c) = render_entry(ui, entry) {
                        choice = Some(c);
                    }
                }
            });
        }
    });

    choice
}

fn render_entry(ui: &mut egui::Ui, entry: &MenuEntry) -> Option<MenuChoice> {
    match entry {
        MenuEntry::Item {
            label,
            enabled,
            checked,
            action,
        } => {
            let response = ui.add_enabled(*enabled, egui::SelectableLabel::new(*checked, label));
            if response.clicked() {
                ui.close_menu();
                return Some(MenuChoice::Action(*action));
            }
            None
        }
        MenuEntry::SubMenu {
            label,
            menu,
            checked,
        } => {
            let text = if *checked {
                format!("✔ {}", label)
            } else {
                label.clone()
            };
            ui.menu_button(text, |ui| render_menu(ui, menu)).inner.flatten()
        }
        MenuEntry::SectionHeader(title) => {
            if !title.is_empty() {
                ui.label(egui::RichText::new(title).strong().small());
            } else {
                ui.add_space(ui.spacing().interact_size.y);
            }
            None
        }
        MenuEntry::Separator => {
            ui.separator();
            None
        }
        MenuEntry::ColumnBreak => None,
        MenuEntry::HelpTitle { title, url } => {
            let mut choice = None;
            ui.horizontal(|ui| {
                ui.label(title);
                if let Some(url) = url
                    && ui.small_button("?").on_hover_text(url.as_str()).clicked()
                {
                    ui.close_menu();
                    choice = Some(MenuChoice::OpenUrl(url.clone()));
                }
            });
            choice
        }
    }
}
