//! Menu model built from the controller list
//!
//! One menu per operation group, in the order groups are first seen, then the
//! fixed management menu with an enable/disable toggle per operation.

use crate::plugin::Controller;
use std::fmt;
use std::sync::Arc;

/// Title of the management menu
pub const PLUGINS_MENU: &str = "Plugins";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Run the operation on the current text
    Execute { name: String, group: String },
    /// Switch the operation on or off
    Toggle {
        name: String,
        group: String,
        activate: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub tooltip: String,
    pub enabled: bool,
    pub action: MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    pub entries: Vec<MenuEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuBar {
    pub menus: Vec<Menu>,
}

impl MenuBar {
    /// Snapshot of the menus for the controllers' current state
    pub fn build(controllers: &[Arc<Controller>]) -> Self {
        let mut menus: Vec<Menu> = Vec::new();

        for controller in controllers {
            let entry = MenuEntry {
                label: controller.name().to_string(),
                tooltip: controller.description().to_string(),
                enabled: controller.is_active(),
                action: MenuAction::Execute {
                    name: controller.name().to_string(),
                    group: controller.menu_group().to_string(),
                },
            };

            match menus.iter_mut().find(|m| m.title == controller.menu_group()) {
                Some(menu) => menu.entries.push(entry),
                None => menus.push(Menu {
                    title: controller.menu_group().to_string(),
                    entries: vec![entry],
                }),
            }
        }

        let toggles = controllers
            .iter()
            .map(|controller| MenuEntry {
                label: controller.menu_label(),
                tooltip: format!("Module {}", controller.module()),
                enabled: true,
                action: MenuAction::Toggle {
                    name: controller.name().to_string(),
                    group: controller.menu_group().to_string(),
                    activate: !controller.is_active(),
                },
            })
            .collect();
        menus.push(Menu {
            title: PLUGINS_MENU.to_string(),
            entries: toggles,
        });

        Self { menus }
    }

    pub fn menu(&self, title: &str) -> Option<&Menu> {
        self.menus.iter().find(|m| m.title == title)
    }
}

impl fmt::Display for MenuBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for menu in &self.menus {
            writeln!(f, "{}", menu.title)?;
            if menu.entries.is_empty() {
                writeln!(f, "  (empty)")?;
            }
            for entry in &menu.entries {
                let marker = if entry.enabled { ' ' } else { '-' };
                if entry.tooltip.is_empty() {
                    writeln!(f, " {marker} {}", entry.label)?;
                } else {
                    writeln!(f, " {marker} {:<24} {}", entry.label, entry.tooltip)?;
                }
            }
        }
        Ok(())
    }
}
